use crate::{
    api::{self, AuthConfig, ProviderConfig},
    cli::{commands::auth, telemetry},
};
use anyhow::Result;
use std::fmt::Write as _;
use tracing::info;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub auth: auth::Options,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let auth_config = auth_config(args.auth);
    let result = api::new(args.port, args.dsn, auth_config).await;

    telemetry::shutdown_tracer();

    result
}

fn auth_config(opts: auth::Options) -> AuthConfig {
    let provider = ProviderConfig::new(
        opts.google_client_id,
        opts.google_client_secret,
        opts.google_redirect_url,
    )
    .with_auth_url(opts.google_auth_url)
    .with_token_url(opts.google_token_url)
    .with_userinfo_url(opts.google_userinfo_url);

    AuthConfig::new(
        provider,
        opts.session_secret,
        opts.login_redirect_url,
        opts.logout_redirect_url,
    )
    .with_cookie_domain(opts.cookie_domain)
    .with_production(opts.production)
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("dsn", redact_dsn(&args.dsn)),
        ("google_client_id", args.auth.google_client_id.clone()),
        ("google_redirect_url", args.auth.google_redirect_url.clone()),
        (
            "cookie_domain",
            args.auth
                .cookie_domain
                .clone()
                .unwrap_or_else(|| "none".to_string()),
        ),
        ("login_redirect_url", args.auth.login_redirect_url.clone()),
        ("logout_redirect_url", args.auth.logout_redirect_url.clone()),
        ("production", args.auth.production.to_string()),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "quest {} ({})\n\nStartup configuration:",
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in &entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ = write!(message, "\n  {key}:{padding} {value}");
    }
    info!("{message}");
}

fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            parsed.to_string()
        }
        Err(_) => "invalid-dsn".to_string(),
    }
}

fn short_commit(hash: &str) -> &str {
    hash.trim().get(..7).unwrap_or_else(|| hash.trim())
}
