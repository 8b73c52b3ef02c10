//! Request body extractor whose rejections go through [`AppError`].

use axum::extract::FromRequest;

use crate::errors::AppError;

/// `axum::Json` with an [`AppError`] rejection, so an unreadable or invalid
/// body gets the same opaque 500 as any other unexpected failure.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
