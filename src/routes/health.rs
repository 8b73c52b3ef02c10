//! Health check endpoints for liveness and readiness probes.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

/// Readiness probe detail.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub store: String,
}

/// Liveness probe: always returns OK if the process is running.
pub async fn live() -> &'static str {
    "OK"
}

/// Readiness probe: checks store connectivity.
pub async fn ready(State(state): State<AppState>) -> Json<HealthStatus> {
    let store_status = match state.store.ping().await {
        Ok(()) => "connected".to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Store health check failed");
            format!("error: {e}")
        }
    };

    Json(HealthStatus {
        status: "ok".to_string(),
        store: store_status,
    })
}
