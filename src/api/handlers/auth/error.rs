//! Error taxonomy for the login flow and the credential store.
//!
//! Details are logged server-side; clients only ever see the short bodies built in
//! [`AuthError::into_response`].

use axum::{
    http::{header::InvalidHeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use super::types::{ErrorResponse, MessageResponse};

/// Failures reported by a [`super::storage::CredentialStore`].
///
/// Only `NotFound` is recoverable (user directory falls through to creation).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("storage unavailable: {0}")]
    TransientFailure(String),
    #[error("invalid record: {0}")]
    Invalid(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound,
            sqlx::Error::Database(ref db_err)
                if db_err
                    .code()
                    .is_some_and(|code| matches!(code.as_ref(), "23505" | "23503")) =>
            {
                Self::Invalid(db_err.message().to_string())
            }
            other => Self::TransientFailure(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Callback `state` missing or not matching the signed state cookie.
    #[error("invalid state")]
    InvalidState,
    #[error("code exchange failed: {0}")]
    ExchangeFailed(String),
    #[error("user info request failed: {0}")]
    UserInfoFailed(String),
    #[error("user directory error: {0}")]
    Directory(#[source] StoreError),
    #[error("session error: {0}")]
    Session(#[source] StoreError),
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("invalid cookie header: {0}")]
    Cookie(#[from] InvalidHeaderValue),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidState => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("invalid state")),
            )
                .into_response(),
            Self::Unauthenticated => unauthorized(),
            Self::ExchangeFailed(_)
            | Self::UserInfoFailed(_)
            | Self::Directory(_)
            | Self::Session(_)
            | Self::Cookie(_) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("bad request")),
            )
                .into_response(),
        }
    }
}

/// 401 body shared by the session guard and the identity extractor.
pub(crate) fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(MessageResponse::new("unauthorized")),
    )
        .into_response()
}

pub(crate) fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(MessageResponse::new("internal server error")),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> anyhow::Result<serde_json::Value> {
        let bytes = to_bytes(response.into_body(), 1024).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    #[tokio::test]
    async fn invalid_state_maps_to_400_with_fixed_body() -> anyhow::Result<()> {
        let response = AuthError::InvalidState.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await?;
        assert_eq!(body["error"], "invalid state");
        Ok(())
    }

    #[tokio::test]
    async fn provider_failures_do_not_leak_details() -> anyhow::Result<()> {
        let response =
            AuthError::ExchangeFailed("invalid_grant: secret detail".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await?;
        assert_eq!(body["error"], "bad request");
        assert!(!body.to_string().contains("secret detail"));
        Ok(())
    }

    #[tokio::test]
    async fn unauthenticated_maps_to_401() -> anyhow::Result<()> {
        let response = AuthError::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await?;
        assert_eq!(body["message"], "unauthorized");
        Ok(())
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::NotFound
        ));
    }

    #[test]
    fn pool_errors_are_transient() {
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::TransientFailure(_)
        ));
    }
}
