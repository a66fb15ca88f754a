//! Google sign-in and session handling.
//!
//! ## Login state
//!
//! The CSRF state sent to Google is also stored in the `quest_oauth_state` cookie,
//! signed with the session secret and valid for ten minutes. The callback is rejected
//! unless the query `state` equals the signed cookie value. The cookie is cleared on
//! every callback response.
//!
//! ## Session cookie
//!
//! `session=<token>; Path=/; Max-Age=172800; HttpOnly; Secure` with `SameSite=Lax` in
//! production and `SameSite=None` otherwise. The token is 32 random bytes, base64
//! encoded; the database only stores its SHA-256 hash.
//!
//! ## Rotation
//!
//! [`guard::require_session`] swaps sessions older than the max age for a new token and
//! appends the new cookie to the response, unless the handler already wrote one.

mod cookies;
mod directory;
mod error;
pub(crate) mod flow;
mod guard;
mod oauth;
mod session;
mod state;
pub mod storage;
pub(crate) mod types;
mod utils;

pub use cookies::{SESSION_COOKIE_NAME, STATE_COOKIE_NAME};
pub use directory::UserDirectory;
pub use error::{AuthError, StoreError};
pub use guard::{require_session, AuthenticatedUser};
pub use oauth::{OAuthClient, ProviderUser};
pub use session::SessionManager;
pub use state::{
    AuthConfig, AuthState, ProviderConfig, SameSite, GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL,
    GOOGLE_USERINFO_URL,
};
