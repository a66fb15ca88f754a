//! HTTP handlers: health, Google sign-in and the fallback.

pub mod auth;
pub mod health;

use axum::{http::StatusCode, response::IntoResponse, Json};

use auth::types::MessageResponse;

/// Fallback for unknown routes.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(MessageResponse::new("Not found")),
    )
}
