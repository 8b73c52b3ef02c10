//! Generic list/get/update/delete routes for any [`CrudEntity`].

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::middleware::auth::CurrentUser;
use crate::models::pagination::{ListQuery, PagedResult};
use crate::routes::extract::AppJson;
use crate::services::crud::CrudEntity;
use crate::AppState;

/// Routes for `E`, relative to wherever the caller nests them:
///
/// - `GET /`: paged list with `?search=`
/// - `GET /{id}`
/// - `PUT /{id}`
/// - `DELETE /{id}`
///
/// Entity-specific endpoints are added on the returned router.
pub fn crud_routes<E: CrudEntity>() -> Router<AppState> {
    Router::new().route("/", get(list::<E>)).route(
        "/{id}",
        get(get_one::<E>).put(update::<E>).delete(delete::<E>),
    )
}

async fn list<E: CrudEntity>(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<PagedResult<E::Item>>, AppError> {
    state.policy.authorize(&user, E::PERMISSIONS.view)?;
    let page = E::list(state.store.as_ref(), &query).await?;
    Ok(Json(page))
}

async fn get_one<E: CrudEntity>(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<E::Item>, AppError> {
    state.policy.authorize(&user, E::PERMISSIONS.view)?;
    let item = E::get(state.store.as_ref(), id).await?;
    Ok(Json(item))
}

async fn update<E: CrudEntity>(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    AppJson(patch): AppJson<E::Patch>,
) -> Result<Json<E::Item>, AppError> {
    state.policy.authorize(&user, E::PERMISSIONS.edit)?;
    let item = E::update(state.store.as_ref(), id, patch).await?;
    Ok(Json(item))
}

async fn delete<E: CrudEntity>(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.policy.authorize(&user, E::PERMISSIONS.delete)?;
    E::delete(state.store.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
