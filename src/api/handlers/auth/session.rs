//! Session issue, lookup, rotation and revocation.
//!
//! A user holds at most one session. Sessions never expire on their own: once older
//! than the max age they are swapped for a fresh token on the next authenticated
//! request, so an active user is never logged out.

use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::{
    error::StoreError,
    storage::{CredentialStore, Session},
    utils::random_token,
};

pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    max_age: Duration,
}

impl SessionManager {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, max_age_seconds: i64) -> Self {
        Self {
            store,
            max_age: Duration::seconds(max_age_seconds),
        }
    }

    /// Create a fresh token for the user, replacing any previous session.
    ///
    /// # Errors
    /// Returns the store error, or `TransientFailure` if the OS RNG is unavailable.
    pub async fn issue(&self, user_id: Uuid) -> Result<String, StoreError> {
        let token = random_token().map_err(|err| StoreError::TransientFailure(err.to_string()))?;
        self.store.upsert_session(user_id, &token, Utc::now()).await?;
        debug!("issued session for user {user_id}");
        Ok(token)
    }

    /// # Errors
    /// `StoreError::NotFound` for unknown (or rotated away) tokens.
    pub async fn lookup(&self, token: &str) -> Result<Session, StoreError> {
        self.store.find_session(token).await
    }

    /// Returns the token to use for the rest of the request and whether it changed.
    ///
    /// # Errors
    /// Returns the error of issuing the replacement token.
    pub async fn rotate_if_stale(&self, session: &Session) -> Result<(String, bool), StoreError> {
        if Utc::now() - session.created_at >= self.max_age {
            let token = self.issue(session.user_id).await?;
            debug!("rotated stale session for user {}", session.user_id);
            return Ok((token, true));
        }
        Ok((session.token.clone(), false))
    }

    /// # Errors
    /// `StoreError::NotFound` if the pair does not name the user's current session.
    pub async fn revoke(&self, user_id: Uuid, token: &str) -> Result<(), StoreError> {
        self.store.delete_session(user_id, token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::storage::{MemoryStore, NewUser};
    use anyhow::Result;

    const TWO_DAYS: i64 = 172_800;

    async fn setup() -> Result<(Arc<MemoryStore>, SessionManager, Uuid)> {
        let store = Arc::new(MemoryStore::new());
        let user_id = store
            .create_user(&NewUser {
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                picture: String::new(),
            })
            .await?;
        let manager = SessionManager::new(store.clone(), TWO_DAYS);
        Ok((store, manager, user_id))
    }

    #[tokio::test]
    async fn issue_then_lookup() -> Result<()> {
        let (_, manager, user_id) = setup().await?;
        let token = manager.issue(user_id).await?;
        let session = manager.lookup(&token).await?;
        assert_eq!(session.user_id, user_id);
        assert_eq!(session.token, token);
        Ok(())
    }

    #[tokio::test]
    async fn reissue_invalidates_previous_token() -> Result<()> {
        let (store, manager, user_id) = setup().await?;
        let first = manager.issue(user_id).await?;
        let second = manager.issue(user_id).await?;

        assert_ne!(first, second);
        assert!(matches!(
            manager.lookup(&first).await,
            Err(StoreError::NotFound)
        ));
        assert_eq!(store.session_count().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn fresh_session_is_not_rotated() -> Result<()> {
        let (_, manager, user_id) = setup().await?;
        let token = manager.issue(user_id).await?;
        let session = manager.lookup(&token).await?;

        let (current, rotated) = manager.rotate_if_stale(&session).await?;
        assert!(!rotated);
        assert_eq!(current, token);
        Ok(())
    }

    #[tokio::test]
    async fn stale_session_rotates_exactly_once() -> Result<()> {
        let (store, manager, user_id) = setup().await?;
        let old = "old-token";
        store
            .upsert_session(user_id, old, Utc::now() - Duration::seconds(TWO_DAYS + 1))
            .await?;
        let session = manager.lookup(old).await?;

        let (new_token, rotated) = manager.rotate_if_stale(&session).await?;
        assert!(rotated);
        assert_ne!(new_token, old);
        assert!(matches!(manager.lookup(old).await, Err(StoreError::NotFound)));

        let session = manager.lookup(&new_token).await?;
        let (again, rotated) = manager.rotate_if_stale(&session).await?;
        assert!(!rotated);
        assert_eq!(again, new_token);
        Ok(())
    }

    #[tokio::test]
    async fn revoke_deletes_only_matching_session() -> Result<()> {
        let (_, manager, user_id) = setup().await?;
        let token = manager.issue(user_id).await?;

        assert!(matches!(
            manager.revoke(user_id, "wrong").await,
            Err(StoreError::NotFound)
        ));
        manager.revoke(user_id, &token).await?;
        assert!(matches!(
            manager.lookup(&token).await,
            Err(StoreError::NotFound)
        ));
        Ok(())
    }
}
