//! `Set-Cookie` builders and the signed login-state cookie.

use axum::http::{
    header::{InvalidHeaderValue, COOKIE},
    HeaderMap, HeaderValue,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use super::state::AuthConfig;

pub const SESSION_COOKIE_NAME: &str = "session";
pub const STATE_COOKIE_NAME: &str = "quest_oauth_state";

type HmacSha256 = Hmac<Sha256>;

/// Session cookie carrying `token`, valid for the configured session max age.
pub(crate) fn session_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    build_session_cookie(config, token, config.session_max_age_seconds())
}

/// Same attributes as [`session_cookie`] with an empty value and `Max-Age=0`.
pub(crate) fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    build_session_cookie(config, "", 0)
}

fn build_session_cookie(
    config: &AuthConfig,
    token: &str,
    max_age: i64,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}={token}; Path=/");
    if let Some(domain) = config.cookie_domain() {
        cookie.push_str(&format!("; Domain={domain}"));
    }
    cookie.push_str(&format!(
        "; Max-Age={max_age}; HttpOnly; Secure; SameSite={}",
        config.same_site().as_str()
    ));
    HeaderValue::from_str(&cookie)
}

pub(crate) fn state_cookie(
    config: &AuthConfig,
    value: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{STATE_COOKIE_NAME}={value}; Path=/; Max-Age={}; HttpOnly; Secure; SameSite=Lax",
        config.state_ttl_seconds()
    ))
}

pub(crate) fn clear_state_cookie() -> HeaderValue {
    HeaderValue::from_static(
        "quest_oauth_state=; Path=/; Max-Age=0; HttpOnly; Secure; SameSite=Lax",
    )
}

/// Value of the first cookie called `name` across all `Cookie` headers.
///
/// Empty values count as absent.
pub(crate) fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let key = parts.next()?.trim();
            let val = parts.next()?.trim();
            (key == name && !val.is_empty()).then(|| val.to_string())
        })
}

/// Signs login states so the callback can trust the state cookie it gets back.
///
/// Cookie value format: `<state>.<issued_at>.<signature>`, signature being
/// HMAC-SHA256 over `<state>.<issued_at>` in unpadded URL-safe base64.
pub(crate) struct StateSigner {
    mac: HmacSha256,
}

impl StateSigner {
    pub(crate) fn new(secret: &SecretString) -> anyhow::Result<Self> {
        let mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
            .map_err(|err| anyhow::anyhow!("invalid session secret: {err}"))?;
        Ok(Self { mac })
    }

    pub(crate) fn sign(&self, state: &str) -> String {
        self.sign_at(state, Utc::now().timestamp())
    }

    fn sign_at(&self, state: &str, issued_at: i64) -> String {
        let payload = format!("{state}.{issued_at}");
        let signature = URL_SAFE_NO_PAD.encode(self.keyed(&payload).finalize().into_bytes());
        format!("{payload}.{signature}")
    }

    /// Returns the state if the signature matches and the cookie is younger than
    /// `ttl_seconds`.
    pub(crate) fn verify(&self, value: &str, ttl_seconds: i64) -> Option<String> {
        let (payload, signature) = value.rsplit_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
        self.keyed(payload).verify_slice(&signature).ok()?;

        let (state, issued_at) = payload.rsplit_once('.')?;
        let issued_at: i64 = issued_at.parse().ok()?;
        let age = Utc::now().timestamp() - issued_at;
        if state.is_empty() || !(0..=ttl_seconds).contains(&age) {
            return None;
        }
        Some(state.to_string())
    }

    fn keyed(&self, payload: &str) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac
    }
}
