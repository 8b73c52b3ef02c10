pub mod config;
pub mod db;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

use std::sync::Arc;

use middleware::rbac::AuthorizationPolicy;
use store::RecordStore;

/// Shared application state passed to all Axum handlers.
///
/// The store and policy are handed explicitly to every service call; handlers
/// never reach for a global connection.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub policy: Arc<dyn AuthorizationPolicy>,
    pub config: config::AppConfig,
}
