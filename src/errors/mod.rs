//! Unified error handling and the JSON error body returned to clients.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// Shown to clients when a user's email is empty or already registered.
pub const EMAIL_IN_USE_MESSAGE: &str =
    "Email address already in use, please use a different email address.";

/// Body of every 4xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// Application error type mapping to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The email is empty or held by another user.
    #[error("Email in use")]
    EmailInUse,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Check if this error represents a not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this error is the client-correctable duplicate email case.
    pub fn is_email_in_use(&self) -> bool {
        matches!(self, Self::EmailInUse)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Internal(format!("Rejected request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::EmailInUse => (StatusCode::BAD_REQUEST, EMAIL_IN_USE_MESSAGE.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Authentication required".to_string(),
            ),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Store(e) => {
                tracing::error!(error = %e, "Store error");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}
