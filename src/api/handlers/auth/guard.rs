//! Session guard for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::SET_COOKIE, request::Parts},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use super::{
    cookies::{read_cookie, session_cookie, SESSION_COOKIE_NAME},
    error::{internal_error, unauthorized, AuthError, StoreError},
    state::AuthState,
};

/// Identity of the caller, inserted by [`require_session`].
///
/// `token` is the session token valid after any rotation in this request.
#[derive(Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub token: String,
}

impl std::fmt::Debug for AuthenticatedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedUser")
            .field("user_id", &self.user_id)
            .field("token", &"***")
            .finish()
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(AuthError::Unauthenticated)
    }
}

/// Resolve the `session` cookie, rotate it when stale and attach the caller identity.
///
/// Missing or unknown tokens get a 401; store failures a 500.
pub async fn require_session(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = read_cookie(request.headers(), SESSION_COOKIE_NAME) else {
        return unauthorized();
    };

    let session = match auth_state.sessions().lookup(&token).await {
        Ok(session) => session,
        Err(StoreError::NotFound) => {
            debug!("unknown session token");
            return unauthorized();
        }
        Err(err) => {
            error!("Failed to lookup session: {err}");
            return internal_error();
        }
    };

    let (token, rotated) = match auth_state.sessions().rotate_if_stale(&session).await {
        Ok(result) => result,
        Err(err) => {
            error!("Failed to rotate session: {err}");
            return internal_error();
        }
    };

    let rotation_cookie = if rotated {
        match session_cookie(auth_state.config(), &token) {
            Ok(cookie) => Some(cookie),
            Err(err) => {
                error!("Failed to build session cookie: {err}");
                return internal_error();
            }
        }
    } else {
        None
    };

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: session.user_id,
        token,
    });

    let mut response = next.run(request).await;

    if let Some(cookie) = rotation_cookie {
        // A handler that already wrote the session cookie (logout) wins.
        let prefix = format!("{SESSION_COOKIE_NAME}=");
        let handler_set_session = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .any(|value| value.starts_with(&prefix));
        if !handler_set_session {
            response.headers_mut().append(SET_COOKIE, cookie);
        }
    }

    response
}
