//! `PostgreSQL` credential store (`sql/schema.sql`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::{CredentialStore, NewUser, Session, User};
use crate::api::handlers::auth::{error::StoreError, utils::hash_session_token};

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn query_span(operation: &'static str, statement: &'static str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        let query = "SELECT id, name, email, picture FROM users WHERE email = $1";
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?
            .ok_or(StoreError::NotFound)?;

        Ok(User {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            picture: row.try_get("picture")?,
        })
    }

    async fn create_user(&self, user: &NewUser) -> Result<Uuid, StoreError> {
        // Existing email: RETURNING yields the stored id.
        let query = r"
            INSERT INTO users (id, name, email, picture)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
            RETURNING id
        ";
        let row = sqlx::query(query)
            .bind(Uuid::new_v4())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.picture)
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", query))
            .await?;

        Ok(row.try_get("id")?)
    }

    async fn upsert_session(
        &self,
        user_id: Uuid,
        token: &str,
        created_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        // Only the hash is stored; the raw token lives in the cookie.
        let query = r"
            INSERT INTO sessions (user_id, token_hash, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
                SET token_hash = EXCLUDED.token_hash,
                    created_at = EXCLUDED.created_at
        ";
        sqlx::query(query)
            .bind(user_id)
            .bind(hash_session_token(token))
            .bind(created_at)
            .execute(&self.pool)
            .instrument(query_span("INSERT", query))
            .await?;

        Ok(())
    }

    async fn find_session(&self, token: &str) -> Result<Session, StoreError> {
        let query = "SELECT user_id, created_at FROM sessions WHERE token_hash = $1";
        let row = sqlx::query(query)
            .bind(hash_session_token(token))
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?
            .ok_or(StoreError::NotFound)?;

        Ok(Session {
            user_id: row.try_get("user_id")?,
            token: token.to_string(),
            created_at: row.try_get("created_at")?,
        })
    }

    async fn delete_session(&self, user_id: Uuid, token: &str) -> Result<(), StoreError> {
        let query = "DELETE FROM sessions WHERE user_id = $1 AND token_hash = $2";
        let result = sqlx::query(query)
            .bind(user_id)
            .bind(hash_session_token(token))
            .execute(&self.pool)
            .instrument(query_span("DELETE", query))
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::{session::SessionManager, storage::test_db::TestDb};
    use anyhow::{Context, Result};
    use std::sync::Arc;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Alice".to_string(),
            email: email.to_string(),
            picture: "https://example.com/alice.png".to_string(),
        }
    }

    async fn session_rows(pool: &PgPool, user_id: Uuid) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
        Ok(row.try_get("count")?)
    }

    #[tokio::test]
    async fn create_user_returns_existing_id_for_same_email() -> Result<()> {
        let Ok(db) = TestDb::new().await else {
            return Ok(());
        };
        let store = PgStore::new(db.pool.clone());

        let first = store.create_user(&new_user("alice@example.com")).await?;
        let mut renamed = new_user("alice@example.com");
        renamed.name = "Someone Else".to_string();
        let second = store.create_user(&renamed).await?;
        assert_eq!(first, second);

        let user = store.find_user_by_email("alice@example.com").await?;
        assert_eq!(user.id, first);
        assert_eq!(user.name, "Alice");
        assert_eq!(user.picture, "https://example.com/alice.png");

        assert!(matches!(
            store.find_user_by_email("bob@example.com").await,
            Err(StoreError::NotFound)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn upsert_session_keeps_one_row_per_user() -> Result<()> {
        let Ok(db) = TestDb::new().await else {
            return Ok(());
        };
        let store = PgStore::new(db.pool.clone());
        let user_id = store.create_user(&new_user("alice@example.com")).await?;

        let created_at = DateTime::<Utc>::from_timestamp(1_700_000_000, 0)
            .context("invalid timestamp")?;
        store.upsert_session(user_id, "first", created_at).await?;
        store.upsert_session(user_id, "second", created_at).await?;

        assert_eq!(session_rows(&db.pool, user_id).await?, 1);
        assert!(matches!(
            store.find_session("first").await,
            Err(StoreError::NotFound)
        ));

        let session = store.find_session("second").await?;
        assert_eq!(session.user_id, user_id);
        assert_eq!(session.token, "second");
        assert_eq!(session.created_at, created_at);
        Ok(())
    }

    #[tokio::test]
    async fn raw_tokens_are_not_stored() -> Result<()> {
        let Ok(db) = TestDb::new().await else {
            return Ok(());
        };
        let store = PgStore::new(db.pool.clone());
        let user_id = store.create_user(&new_user("alice@example.com")).await?;
        store.upsert_session(user_id, "secret-token", Utc::now()).await?;

        let row = sqlx::query("SELECT token_hash FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&db.pool)
            .await?;
        let stored: Vec<u8> = row.try_get("token_hash")?;
        assert_eq!(stored, hash_session_token("secret-token"));
        assert_ne!(stored, b"secret-token".to_vec());
        Ok(())
    }

    #[tokio::test]
    async fn delete_session_requires_matching_token() -> Result<()> {
        let Ok(db) = TestDb::new().await else {
            return Ok(());
        };
        let store = PgStore::new(db.pool.clone());
        let user_id = store.create_user(&new_user("alice@example.com")).await?;
        store.upsert_session(user_id, "token", Utc::now()).await?;

        assert!(matches!(
            store.delete_session(user_id, "other").await,
            Err(StoreError::NotFound)
        ));
        assert_eq!(session_rows(&db.pool, user_id).await?, 1);

        store.delete_session(user_id, "token").await?;
        assert_eq!(session_rows(&db.pool, user_id).await?, 0);
        assert!(matches!(
            store.delete_session(user_id, "token").await,
            Err(StoreError::NotFound)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_token_and_unknown_user() -> Result<()> {
        let Ok(db) = TestDb::new().await else {
            return Ok(());
        };
        let store = PgStore::new(db.pool.clone());

        assert!(matches!(
            store.find_session("missing").await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store.upsert_session(Uuid::new_v4(), "t", Utc::now()).await,
            Err(StoreError::Invalid(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn session_manager_reissue_replaces_token() -> Result<()> {
        let Ok(db) = TestDb::new().await else {
            return Ok(());
        };
        let store = Arc::new(PgStore::new(db.pool.clone()));
        let user_id = store.create_user(&new_user("alice@example.com")).await?;
        let sessions = SessionManager::new(store, 172_800);

        let first = sessions.issue(user_id).await?;
        let second = sessions.issue(user_id).await?;

        assert_eq!(session_rows(&db.pool, user_id).await?, 1);
        assert!(matches!(
            sessions.lookup(&first).await,
            Err(StoreError::NotFound)
        ));
        assert_eq!(sessions.lookup(&second).await?.user_id, user_id);

        sessions.revoke(user_id, &second).await?;
        assert_eq!(session_rows(&db.pool, user_id).await?, 0);
        Ok(())
    }
}
