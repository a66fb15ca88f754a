//! Credential store contract for users and sessions.
//!
//! The store is the single source of truth: the session manager and user directory
//! never cache rows between requests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::StoreError;

pub mod memory;
pub mod postgres;
#[cfg(test)]
pub(crate) mod test_db;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Local user record, keyed by email.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub picture: String,
}

/// Fields copied from the provider profile when a user is first seen.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub picture: String,
}

/// The single live session of a user.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("token", &"***")
            .field("created_at", &self.created_at)
            .finish()
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns `StoreError::NotFound` when no user has this email.
    async fn find_user_by_email(&self, email: &str) -> Result<User, StoreError>;

    /// Create a user and return its id. Creating an email that already exists returns
    /// the existing id and leaves the stored profile untouched.
    async fn create_user(&self, user: &NewUser) -> Result<Uuid, StoreError>;

    /// Upsert keyed by `user_id`: replaces token and timestamp of any previous session.
    async fn upsert_session(
        &self,
        user_id: Uuid,
        token: &str,
        created_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn find_session(&self, token: &str) -> Result<Session, StoreError>;

    /// Delete the row matching both fields; `StoreError::NotFound` if none matched.
    async fn delete_session(&self, user_id: Uuid, token: &str) -> Result<(), StoreError>;
}
