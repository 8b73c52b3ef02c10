//! User routes: the generic CRUD set plus provisioning and dashboard stats.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::errors::AppError;
use crate::middleware::auth::CurrentUser;
use crate::models::role::Permission;
use crate::models::user::{CreateUserRequest, User};
use crate::routes::crud::crud_routes;
use crate::routes::extract::AppJson;
use crate::services::dashboard::{self, DashboardStats};
use crate::services::users as user_service;
use crate::AppState;

pub fn router() -> Router<AppState> {
    crud_routes::<User>()
        .route("/", post(create))
        .route("/dashboard-stats", get(dashboard_stats))
}

/// POST /users: provision a user; 200 with an empty body on success.
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(body): AppJson<CreateUserRequest>,
) -> Result<StatusCode, AppError> {
    state.policy.authorize(&user, Permission::UserCreate)?;
    let (input, role_id) = body.into_parts();
    user_service::create_user(state.store.as_ref(), input, role_id).await?;
    Ok(StatusCode::OK)
}

/// GET /users/dashboard-stats: story counts for the dashboard widgets.
pub async fn dashboard_stats(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<DashboardStats>, AppError> {
    state.policy.authorize(&user, Permission::WidgetView)?;
    let stats = dashboard::get_stats(state.store.as_ref()).await?;
    Ok(Json(stats))
}
