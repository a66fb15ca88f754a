//! Google OAuth 2.0 client: authorize URL, code exchange and userinfo fetch.
//!
//! Each network call is made exactly once; there is no retry and redirects are not
//! followed, so a failing provider fails the login attempt.

use anyhow::{Context, Result};
use oauth2::{
    basic::BasicClient, AccessToken, AuthType, AuthUrl, AuthorizationCode, ClientId,
    ClientSecret, CsrfToken, EndpointNotSet, EndpointSet, RedirectUrl, Scope, TokenResponse,
    TokenUrl,
};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Deserializer};
use tracing::{debug, instrument, Instrument};
use url::Url;

use super::{error::AuthError, state::ProviderConfig};

/// OAuth client type with auth URL and token URL set.
type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// Profile returned by the userinfo endpoint.
///
/// Unknown fields are ignored and missing ones default to empty.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProviderUser {
    pub sub: String,
    pub name: String,
    pub given_name: String,
    pub family_name: String,
    pub profile: String,
    pub picture: String,
    pub email: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub email_verified: bool,
    pub gender: String,
}

/// Google's v3 endpoint sends `email_verified` as a bool, older ones as a string.
fn bool_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Bool(value) => value,
        serde_json::Value::String(value) => value.eq_ignore_ascii_case("true"),
        _ => false,
    })
}

pub struct OAuthClient {
    client: ConfiguredClient,
    http: Client,
    userinfo_url: Url,
    scopes: Vec<String>,
}

impl OAuthClient {
    /// Build the client from the static provider configuration.
    ///
    /// # Errors
    /// Returns an error if an endpoint is not a valid URL or the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = BasicClient::new(ClientId::new(config.client_id().to_string()))
            .set_client_secret(ClientSecret::new(
                config.client_secret().expose_secret().to_string(),
            ))
            .set_auth_uri(
                AuthUrl::new(config.auth_url().to_string()).context("Invalid provider auth URL")?,
            )
            .set_token_uri(
                TokenUrl::new(config.token_url().to_string())
                    .context("Invalid provider token URL")?,
            )
            .set_redirect_uri(
                RedirectUrl::new(config.redirect_url().to_string())
                    .context("Invalid OAuth redirect URL")?,
            )
            // Google expects client credentials in the form body.
            .set_auth_type(AuthType::RequestBody);

        let userinfo_url =
            Url::parse(config.userinfo_url()).context("Invalid provider userinfo URL")?;

        // No redirects.
        let http = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(crate::APP_USER_AGENT)
            .build()
            .context("Failed to build OAuth HTTP client")?;

        Ok(Self {
            client,
            http,
            userinfo_url,
            scopes: config.scopes().to_vec(),
        })
    }

    /// Provider authorization URL for the given CSRF state.
    #[must_use]
    pub fn authorize_url(&self, state: &str) -> Url {
        let (url, _) = self
            .client
            .authorize_url(|| CsrfToken::new(state.to_string()))
            .add_scopes(self.scopes.iter().cloned().map(Scope::new))
            .url();
        url
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    /// Returns `AuthError::ExchangeFailed` on transport failure or a provider error response.
    #[instrument(skip_all)]
    pub async fn exchange_code(&self, code: &str) -> Result<AccessToken, AuthError> {
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|err| AuthError::ExchangeFailed(err.to_string()))?;

        debug!("authorization code exchanged");

        Ok(token.access_token().clone())
    }

    /// Fetch the user's profile with the access token.
    ///
    /// # Errors
    /// Returns `AuthError::UserInfoFailed` on transport failure, a non-success status,
    /// or a body that is not a JSON object.
    pub async fn fetch_user_info(&self, token: &AccessToken) -> Result<ProviderUser, AuthError> {
        let span = tracing::info_span!(
            "oauth.userinfo",
            http.method = "GET",
            url = %self.userinfo_url
        );
        async {
            let response = self
                .http
                .get(self.userinfo_url.clone())
                .bearer_auth(token.secret())
                .send()
                .await
                .map_err(|err| AuthError::UserInfoFailed(err.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(AuthError::UserInfoFailed(format!(
                    "userinfo request returned {status}"
                )));
            }

            let body = response
                .text()
                .await
                .map_err(|err| AuthError::UserInfoFailed(err.to_string()))?;

            serde_json::from_str::<ProviderUser>(&body)
                .map_err(|err| AuthError::UserInfoFailed(format!("invalid userinfo body: {err}")))
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClient")
            .field("userinfo_url", &self.userinfo_url.as_str())
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}
