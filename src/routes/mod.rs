//! Route definitions for the admin API.

pub mod crud;
pub mod extract;
pub mod health;
pub mod users;

use axum::{extract::DefaultBodyLimit, http::HeaderValue, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::models::story::Story;
use crate::AppState;

/// Largest request body accepted, in bytes.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.frontend_url);

    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .nest("/users", users::router())
        .nest("/stories", crud::crud_routes::<Story>())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match frontend_url.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            tracing::warn!(error = %e, frontend_url, "Invalid FRONTEND_URL, CORS origin not set");
            layer
        }
    }
}
