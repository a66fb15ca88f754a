//! # Quest (Google sign-in with rotating sessions)
//!
//! `quest` signs users in through Google using the OAuth2 authorization-code flow and
//! keeps them signed in with an opaque, server-side session token carried in the
//! `session` cookie.
//!
//! ## Login
//!
//! `/auth/google/login` stores a random CSRF state in a short-lived, HMAC-signed cookie
//! and redirects to Google. `/auth/google/callback` only proceeds when the returned
//! `state` matches that cookie; it then exchanges the code, fetches the user profile,
//! creates the local user on first sight (keyed by email) and issues a session.
//!
//! ## Sessions
//!
//! - **One session per user:** issuing a session overwrites the user's previous token.
//! - **Rotation:** a session older than two days is not rejected; the next authenticated
//!   request swaps it for a fresh token and sets a new cookie.
//! - **Revocation:** `/auth/google/logout` deletes the row and clears the cookie.
//!
//! Every lookup goes to the credential store; there is no in-process session cache.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
