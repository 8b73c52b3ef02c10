//! JWT authentication extractor for Axum handlers.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::role::Permission;
use crate::services::auth as auth_service;
use crate::AppState;

/// Authenticated caller extracted from the JWT Bearer token.
///
/// Use as an Axum extractor in handlers that require authentication:
/// ```ignore
/// async fn handler(current_user: CurrentUser) -> impl IntoResponse { ... }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role_id: Uuid,
    pub permissions: Vec<Permission>,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?;

        let claims = auth_service::validate_token(token, &state.config.jwt_secret)?;

        if claims.token_type != "access" {
            return Err(AppError::Unauthorized);
        }

        let id: Uuid = claims.sub.parse().map_err(|_| AppError::Unauthorized)?;
        let role_id: Uuid = claims.role_id.parse().map_err(|_| AppError::Unauthorized)?;

        Ok(CurrentUser {
            id,
            email: claims.email,
            role_id,
            permissions: claims.permissions,
        })
    }
}
