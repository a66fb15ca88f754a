//! Google login, callback, logout and session endpoints.

use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    http::{
        header::{InvalidHeaderValue, LOCATION, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use super::{
    cookies::{
        clear_session_cookie, clear_state_cookie, read_cookie, session_cookie, state_cookie,
        STATE_COOKIE_NAME,
    },
    error::{internal_error, AuthError},
    guard::AuthenticatedUser,
    state::AuthState,
    types::{CallbackParams, ErrorResponse, MessageResponse, SessionResponse},
    utils::random_token,
};

/// 302 Found; `Redirect::to` would answer 303.
fn found(location: &str) -> Result<Response, InvalidHeaderValue> {
    let location = HeaderValue::from_str(location)?;
    Ok((StatusCode::FOUND, [(LOCATION, location)]).into_response())
}

#[utoipa::path(
    get,
    path = "/auth/google/login",
    responses(
        (status = 302, description = "Redirect to the Google consent screen, sets the state cookie"),
        (status = 500, description = "Login state could not be created", body = MessageResponse)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(auth_state: Extension<Arc<AuthState>>) -> Response {
    let state = match random_token() {
        Ok(state) => state,
        Err(err) => {
            error!("Failed to generate login state: {err}");
            return internal_error();
        }
    };

    let signed = auth_state.state_signer().sign(&state);
    let authorize_url = auth_state.oauth().authorize_url(&state);

    let response = state_cookie(auth_state.config(), &signed).and_then(|cookie| {
        let mut response = found(authorize_url.as_str())?;
        response.headers_mut().append(SET_COOKIE, cookie);
        Ok(response)
    });

    match response {
        Ok(response) => response,
        Err(err) => {
            error!("Failed to build login redirect: {err}");
            internal_error()
        }
    }
}

#[utoipa::path(
    get,
    path = "/auth/google/callback",
    params(CallbackParams),
    responses(
        (status = 302, description = "Signed in, sets the session cookie"),
        (status = 400, description = "Invalid state or provider failure", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn callback(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    query: Result<Query<CallbackParams>, QueryRejection>,
) -> Response {
    let outcome = match query {
        Ok(Query(params)) => complete_login(&auth_state, &headers, params).await,
        Err(rejection) => {
            warn!("Malformed callback query: {rejection}");
            Err(AuthError::InvalidState)
        }
    };

    let mut response = match outcome {
        Ok(response) => response,
        Err(err) => {
            error!("Google login failed: {err}");
            err.into_response()
        }
    };

    // The state is single use whatever the outcome.
    response
        .headers_mut()
        .append(SET_COOKIE, clear_state_cookie());
    response
}

async fn complete_login(
    auth_state: &AuthState,
    headers: &HeaderMap,
    params: CallbackParams,
) -> Result<Response, AuthError> {
    let expected = read_cookie(headers, STATE_COOKIE_NAME)
        .and_then(|value| {
            auth_state
                .state_signer()
                .verify(&value, auth_state.config().state_ttl_seconds())
        })
        .ok_or(AuthError::InvalidState)?;

    let state = params
        .state
        .filter(|state| !state.is_empty())
        .ok_or(AuthError::InvalidState)?;
    if state != expected {
        return Err(AuthError::InvalidState);
    }

    let code = params
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| AuthError::ExchangeFailed("missing authorization code".to_string()))?;

    let access_token = auth_state.oauth().exchange_code(&code).await?;
    let profile = auth_state.oauth().fetch_user_info(&access_token).await?;

    let user_id = auth_state
        .directory()
        .resolve_or_create(&profile)
        .await
        .map_err(AuthError::Directory)?;

    let token = auth_state
        .sessions()
        .issue(user_id)
        .await
        .map_err(AuthError::Session)?;

    let cookie = session_cookie(auth_state.config(), &token)?;
    let mut response = found(auth_state.config().login_redirect_url())?;
    response.headers_mut().append(SET_COOKIE, cookie);

    info!("user {user_id} signed in");

    Ok(response)
}

#[utoipa::path(
    get,
    path = "/auth/google/logout",
    responses(
        (status = 302, description = "Signed out, clears the session cookie"),
        (status = 400, description = "Session could not be revoked", body = ErrorResponse),
        (status = 401, description = "No valid session", body = MessageResponse)
    ),
    tag = "auth"
)]
#[instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn logout(user: AuthenticatedUser, auth_state: Extension<Arc<AuthState>>) -> Response {
    if let Err(err) = auth_state
        .sessions()
        .revoke(user.user_id, &user.token)
        .await
    {
        error!("Failed to revoke session: {err}");
        return AuthError::Session(err).into_response();
    }

    let response = clear_session_cookie(auth_state.config()).and_then(|cookie| {
        let mut response = found(auth_state.config().logout_redirect_url())?;
        response.headers_mut().append(SET_COOKIE, cookie);
        Ok(response)
    });

    match response {
        Ok(response) => {
            info!("user signed out");
            response
        }
        Err(err) => AuthError::Cookie(err).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/auth/session",
    responses(
        (status = 200, description = "Session is active", body = SessionResponse),
        (status = 401, description = "No valid session", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn session(user: AuthenticatedUser) -> impl IntoResponse {
    Json(SessionResponse {
        user_id: user.user_id.to_string(),
    })
}
