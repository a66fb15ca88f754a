//! Maps validated CLI arguments to the action to run.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::auth;
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        auth: auth_opts,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENV: [(&str, Option<&str>); 7] = [
        ("QUEST_DSN", Some("postgres://user@localhost:5432/quest")),
        ("QUEST_GOOGLE_CLIENT_ID", Some("client-id")),
        ("QUEST_GOOGLE_CLIENT_SECRET", Some("client-secret")),
        (
            "QUEST_GOOGLE_REDIRECT_URL",
            Some("https://api.quest.dev/auth/google/callback"),
        ),
        ("QUEST_LOGIN_REDIRECT_URL", Some("https://quest.dev/")),
        ("QUEST_LOGOUT_REDIRECT_URL", Some("https://quest.dev/bye")),
        (
            "QUEST_SESSION_SECRET",
            Some("0123456789abcdef0123456789abcdef"),
        ),
    ];

    #[test]
    fn builds_server_action() {
        temp_env::with_vars(ENV, || {
            let matches = crate::cli::commands::new().get_matches_from(vec!["quest"]);
            let result = handler(&matches);
            assert!(result.is_ok());
            if let Ok(Action::Server(args)) = result {
                assert_eq!(args.port, 8080);
                assert_eq!(args.dsn, "postgres://user@localhost:5432/quest");
                assert_eq!(args.auth.google_client_id, "client-id");
            }
        });
    }

    #[test]
    fn session_secret_required() {
        let mut vars = ENV;
        vars[6] = ("QUEST_SESSION_SECRET", None);
        temp_env::with_vars(vars, || {
            let matches = crate::cli::commands::new().get_matches_from(vec!["quest"]);
            let result = handler(&matches);
            assert!(result.is_err());
            if let Err(err) = result {
                assert!(err
                    .to_string()
                    .contains("missing required argument: --session-secret"));
            }
        });
    }
}
