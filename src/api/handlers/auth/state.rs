//! Auth configuration and the shared state handed to handlers.

use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;

use super::{
    cookies::StateSigner, directory::UserDirectory, oauth::OAuthClient,
    session::SessionManager, storage::CredentialStore,
};

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

const DEFAULT_SCOPES: [&str; 3] = ["email", "profile", "openid"];
const DEFAULT_SESSION_MAX_AGE_SECONDS: i64 = 2 * 24 * 60 * 60;
const DEFAULT_STATE_TTL_SECONDS: i64 = 10 * 60;

/// Static identity provider settings, built once at startup.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    client_id: String,
    client_secret: SecretString,
    redirect_url: String,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
    scopes: Vec<String>,
}

impl ProviderConfig {
    #[must_use]
    pub fn new(client_id: String, client_secret: SecretString, redirect_url: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_url,
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(ToString::to_string).collect(),
        }
    }

    #[must_use]
    pub fn with_auth_url(mut self, url: String) -> Self {
        self.auth_url = url;
        self
    }

    #[must_use]
    pub fn with_token_url(mut self, url: String) -> Self {
        self.token_url = url;
        self
    }

    #[must_use]
    pub fn with_userinfo_url(mut self, url: String) -> Self {
        self.userinfo_url = url;
        self
    }

    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub(super) fn client_secret(&self) -> &SecretString {
        &self.client_secret
    }

    #[must_use]
    pub fn redirect_url(&self) -> &str {
        &self.redirect_url
    }

    #[must_use]
    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    #[must_use]
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    #[must_use]
    pub fn userinfo_url(&self) -> &str {
        &self.userinfo_url
    }

    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }
}

/// `SameSite` attribute of the session cookie.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SameSite {
    Lax,
    None,
}

impl SameSite {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    provider: ProviderConfig,
    session_secret: SecretString,
    login_redirect_url: String,
    logout_redirect_url: String,
    cookie_domain: Option<String>,
    production: bool,
    session_max_age_seconds: i64,
    state_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(
        provider: ProviderConfig,
        session_secret: SecretString,
        login_redirect_url: String,
        logout_redirect_url: String,
    ) -> Self {
        Self {
            provider,
            session_secret,
            login_redirect_url,
            logout_redirect_url,
            cookie_domain: None,
            production: false,
            session_max_age_seconds: DEFAULT_SESSION_MAX_AGE_SECONDS,
            state_ttl_seconds: DEFAULT_STATE_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_cookie_domain(mut self, domain: Option<String>) -> Self {
        self.cookie_domain = domain.filter(|d| !d.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    #[must_use]
    pub fn with_session_max_age_seconds(mut self, seconds: i64) -> Self {
        self.session_max_age_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_state_ttl_seconds(mut self, seconds: i64) -> Self {
        self.state_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn provider(&self) -> &ProviderConfig {
        &self.provider
    }

    #[must_use]
    pub fn login_redirect_url(&self) -> &str {
        &self.login_redirect_url
    }

    #[must_use]
    pub fn logout_redirect_url(&self) -> &str {
        &self.logout_redirect_url
    }

    #[must_use]
    pub fn cookie_domain(&self) -> Option<&str> {
        self.cookie_domain.as_deref()
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        self.production
    }

    /// Cross-site cookies are only allowed outside production (local frontends on
    /// another origin).
    #[must_use]
    pub fn same_site(&self) -> SameSite {
        if self.production {
            SameSite::Lax
        } else {
            SameSite::None
        }
    }

    /// Cookie `Max-Age` and the rotation threshold.
    #[must_use]
    pub fn session_max_age_seconds(&self) -> i64 {
        self.session_max_age_seconds
    }

    #[must_use]
    pub fn state_ttl_seconds(&self) -> i64 {
        self.state_ttl_seconds
    }

    pub(super) fn session_secret(&self) -> &SecretString {
        &self.session_secret
    }
}

/// Everything the auth handlers and the session guard share, built once per process.
pub struct AuthState {
    config: AuthConfig,
    oauth: OAuthClient,
    directory: UserDirectory,
    sessions: SessionManager,
    state_signer: StateSigner,
}

impl AuthState {
    /// # Errors
    /// Returns an error if the provider endpoints are not valid URLs or the HTTP client
    /// cannot be built.
    pub fn new(config: AuthConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let oauth = OAuthClient::new(config.provider())?;
        let directory = UserDirectory::new(store.clone());
        let sessions = SessionManager::new(store, config.session_max_age_seconds());
        let state_signer = StateSigner::new(config.session_secret())?;

        Ok(Self {
            config,
            oauth,
            directory,
            sessions,
            state_signer,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn oauth(&self) -> &OAuthClient {
        &self.oauth
    }

    #[must_use]
    pub fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub(super) fn state_signer(&self) -> &StateSigner {
        &self.state_signer
    }
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
