use crate::api::handlers::auth::{GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL, GOOGLE_USERINFO_URL};
use anyhow::{bail, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_GOOGLE_CLIENT_ID: &str = "google-client-id";
pub const ARG_GOOGLE_CLIENT_SECRET: &str = "google-client-secret";
pub const ARG_GOOGLE_REDIRECT_URL: &str = "google-redirect-url";
pub const ARG_GOOGLE_AUTH_URL: &str = "google-auth-url";
pub const ARG_GOOGLE_TOKEN_URL: &str = "google-token-url";
pub const ARG_GOOGLE_USERINFO_URL: &str = "google-userinfo-url";
pub const ARG_COOKIE_DOMAIN: &str = "cookie-domain";
pub const ARG_LOGIN_REDIRECT_URL: &str = "login-redirect-url";
pub const ARG_LOGOUT_REDIRECT_URL: &str = "logout-redirect-url";
pub const ARG_SESSION_SECRET: &str = "session-secret";
pub const ARG_PRODUCTION: &str = "production";

const MIN_SESSION_SECRET_BYTES: usize = 32;

#[derive(Debug, Clone)]
pub struct Options {
    pub google_client_id: String,
    pub google_client_secret: SecretString,
    pub google_redirect_url: String,
    pub google_auth_url: String,
    pub google_token_url: String,
    pub google_userinfo_url: String,
    pub cookie_domain: Option<String>,
    pub login_redirect_url: String,
    pub logout_redirect_url: String,
    pub session_secret: SecretString,
    pub production: bool,
}

impl Options {
    /// Parse Google sign-in and cookie arguments from matches.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing or blank, or the session
    /// secret is shorter than 32 bytes.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        // Env vars set to "" reach us as empty strings.
        let read_required = |id: &str| -> Result<String> {
            match matches.get_one::<String>(id) {
                Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
                _ => bail!("missing required argument: --{id}"),
            }
        };

        let session_secret = read_required(ARG_SESSION_SECRET)?;
        if session_secret.len() < MIN_SESSION_SECRET_BYTES {
            bail!("--{ARG_SESSION_SECRET} must be at least {MIN_SESSION_SECRET_BYTES} bytes");
        }

        Ok(Self {
            google_client_id: read_required(ARG_GOOGLE_CLIENT_ID)?,
            google_client_secret: SecretString::from(read_required(ARG_GOOGLE_CLIENT_SECRET)?),
            google_redirect_url: read_required(ARG_GOOGLE_REDIRECT_URL)?,
            google_auth_url: read_required(ARG_GOOGLE_AUTH_URL)?,
            google_token_url: read_required(ARG_GOOGLE_TOKEN_URL)?,
            google_userinfo_url: read_required(ARG_GOOGLE_USERINFO_URL)?,
            cookie_domain: matches
                .get_one::<String>(ARG_COOKIE_DOMAIN)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            login_redirect_url: read_required(ARG_LOGIN_REDIRECT_URL)?,
            logout_redirect_url: read_required(ARG_LOGOUT_REDIRECT_URL)?,
            session_secret: SecretString::from(session_secret),
            production: matches.get_flag(ARG_PRODUCTION),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_google_args(command);
    with_cookie_args(command)
}

fn with_google_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_GOOGLE_CLIENT_ID)
                .long(ARG_GOOGLE_CLIENT_ID)
                .help("Google OAuth client ID")
                .env("QUEST_GOOGLE_CLIENT_ID"),
        )
        .arg(
            Arg::new(ARG_GOOGLE_CLIENT_SECRET)
                .long(ARG_GOOGLE_CLIENT_SECRET)
                .help("Google OAuth client secret")
                .env("QUEST_GOOGLE_CLIENT_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_GOOGLE_REDIRECT_URL)
                .long(ARG_GOOGLE_REDIRECT_URL)
                .help("Callback URL registered with Google")
                .long_help(
                    "Callback URL registered with Google, e.g. https://api.example.com/auth/google/callback.\n\nMust match the OAuth client configuration exactly.",
                )
                .env("QUEST_GOOGLE_REDIRECT_URL"),
        )
        .arg(
            Arg::new(ARG_GOOGLE_AUTH_URL)
                .long(ARG_GOOGLE_AUTH_URL)
                .help("Google authorization endpoint")
                .env("QUEST_GOOGLE_AUTH_URL")
                .default_value(GOOGLE_AUTH_URL),
        )
        .arg(
            Arg::new(ARG_GOOGLE_TOKEN_URL)
                .long(ARG_GOOGLE_TOKEN_URL)
                .help("Google token endpoint")
                .env("QUEST_GOOGLE_TOKEN_URL")
                .default_value(GOOGLE_TOKEN_URL),
        )
        .arg(
            Arg::new(ARG_GOOGLE_USERINFO_URL)
                .long(ARG_GOOGLE_USERINFO_URL)
                .help("Google userinfo endpoint")
                .env("QUEST_GOOGLE_USERINFO_URL")
                .default_value(GOOGLE_USERINFO_URL),
        )
}

fn with_cookie_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_COOKIE_DOMAIN)
                .long(ARG_COOKIE_DOMAIN)
                .help("Domain attribute of the session cookie (omitted when unset)")
                .env("QUEST_COOKIE_DOMAIN"),
        )
        .arg(
            Arg::new(ARG_LOGIN_REDIRECT_URL)
                .long(ARG_LOGIN_REDIRECT_URL)
                .help("Where the browser lands after a successful login")
                .env("QUEST_LOGIN_REDIRECT_URL"),
        )
        .arg(
            Arg::new(ARG_LOGOUT_REDIRECT_URL)
                .long(ARG_LOGOUT_REDIRECT_URL)
                .help("Where the browser lands after logout")
                .env("QUEST_LOGOUT_REDIRECT_URL"),
        )
        .arg(
            Arg::new(ARG_SESSION_SECRET)
                .long(ARG_SESSION_SECRET)
                .help("Key for signing the login state cookie (min 32 bytes)")
                .env("QUEST_SESSION_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_PRODUCTION)
                .long(ARG_PRODUCTION)
                .help("Production mode: session cookie uses SameSite=Lax instead of None")
                .env("QUEST_PRODUCTION")
                .action(ArgAction::SetTrue),
        )
}
