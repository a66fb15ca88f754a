//! Process-local credential store for tests and local development.
//!
//! Behaves like the `PostgreSQL` store (one session per user, email uniqueness) but
//! keeps everything in memory, so sessions do not survive a restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{CredentialStore, NewUser, Session, User};
use crate::api::handlers::auth::error::StoreError;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    /// Keyed by user id, mirroring the `sessions.user_id` unique constraint.
    sessions: HashMap<Uuid, Session>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.tables.lock().await.users.len()
    }

    pub async fn session_count(&self) -> usize {
        self.tables.lock().await.sessions.len()
    }

    /// Current session row of a user, if any.
    pub async fn session_for_user(&self, user_id: Uuid) -> Option<Session> {
        self.tables.lock().await.sessions.get(&user_id).cloned()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.tables
            .lock()
            .await
            .users
            .values()
            .find(|user| user.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create_user(&self, user: &NewUser) -> Result<Uuid, StoreError> {
        let mut tables = self.tables.lock().await;
        if let Some(existing) = tables.users.values().find(|u| u.email == user.email) {
            return Ok(existing.id);
        }
        let id = Uuid::new_v4();
        tables.users.insert(
            id,
            User {
                id,
                name: user.name.clone(),
                email: user.email.clone(),
                picture: user.picture.clone(),
            },
        );
        Ok(id)
    }

    async fn upsert_session(
        &self,
        user_id: Uuid,
        token: &str,
        created_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::Invalid(format!("unknown user {user_id}")));
        }
        if tables
            .sessions
            .values()
            .any(|session| session.token == token && session.user_id != user_id)
        {
            return Err(StoreError::Invalid("duplicate session token".to_string()));
        }
        tables.sessions.insert(
            user_id,
            Session {
                user_id,
                token: token.to_string(),
                created_at,
            },
        );
        Ok(())
    }

    async fn find_session(&self, token: &str) -> Result<Session, StoreError> {
        self.tables
            .lock()
            .await
            .sessions
            .values()
            .find(|session| session.token == token)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn delete_session(&self, user_id: Uuid, token: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let matched = tables
            .sessions
            .get(&user_id)
            .is_some_and(|session| session.token == token);
        if !matched {
            return Err(StoreError::NotFound);
        }
        tables.sessions.remove(&user_id);
        Ok(())
    }
}
