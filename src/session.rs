//! Server-side session store.
//!
//! Sessions live in Postgres so sign-out takes effect immediately: replaying
//! an old cookie after the row is gone yields nothing. The client only holds
//! an opaque token.

use axum::extract::FromRef;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::AppState;
use crate::error::{Result, ServerError};

/// Cookie holding the session token.
pub const SESSION_COOKIE: &str = "sid";

pub const DEFAULT_TTL_HOURS: i64 = 24;
const TOKEN_BYTES: usize = 32;

/// Authenticated session, resolved once per request.
///
/// Carries the owner identity plus the minimal public profile; never the
/// credential hash.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Session {
    #[serde(skip)]
    pub token: String,
    pub user_id: Uuid,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Public profile exposed to the render layer.
    pub fn profile(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.user_id,
            "username": self.username,
        })
    }
}

/// Postgres-backed session store with a fixed TTL.
#[derive(Clone)]
pub struct SessionStore {
    pool: PgPool,
    ttl_hours: i64,
}

impl SessionStore {
    /// Create a new [`SessionStore`].
    pub fn new(pool: PgPool, ttl_hours: i64) -> Self {
        Self { pool, ttl_hours }
    }

    /// Create a session bound to `user_id` with a fresh random token.
    pub async fn create(
        &self,
        user_id: Uuid,
        username: &str,
    ) -> Result<Session> {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        let expires_at = Utc::now() + Duration::hours(self.ttl_hours);

        sqlx::query(
            r#"INSERT INTO sessions (token, user_id, username, expires_at)
                VALUES ($1, $2, $3, $4)"#,
        )
        .bind(&token)
        .bind(user_id)
        .bind(username)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(Session {
            token,
            user_id,
            username: username.to_owned(),
            expires_at,
        })
    }

    /// Look up a non-expired session by token.
    pub async fn find(&self, token: &str) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"SELECT token, user_id, username, expires_at
                FROM sessions
                WHERE token = $1 AND expires_at > NOW()"#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        if session.is_none() {
            // expired rows are dropped on the first lookup that misses them.
            sqlx::query(
                r#"DELETE FROM sessions WHERE token = $1 AND expires_at <= NOW()"#,
            )
            .bind(token)
            .execute(&self.pool)
            .await?;
        }

        Ok(session)
    }

    /// Destroy the server-side session record.
    pub async fn destroy(&self, token: &str) -> Result<()> {
        sqlx::query(r#"DELETE FROM sessions WHERE token = $1"#)
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|err| ServerError::Session(err.to_string()))?;

        Ok(())
    }
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(state: &AppState) -> SessionStore {
        state.sessions.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::{Pool, Postgres};

    async fn insert_user(pool: &PgPool, username: &str) -> Uuid {
        sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO users (first_name, last_name, username, email, password)
                VALUES ('Test', 'User', $1, $2, 'phc')
                RETURNING id"#,
        )
        .bind(username)
        .bind(format!("{username}@example.com"))
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[sqlx::test]
    async fn test_create_find_destroy(pool: Pool<Postgres>) {
        let user_id = insert_user(&pool, "alice").await;
        let store = SessionStore::new(pool, DEFAULT_TTL_HOURS);

        let session = store.create(user_id, "alice").await.unwrap();
        assert_eq!(session.token.len(), TOKEN_BYTES * 2);
        assert!(session.expires_at > Utc::now());

        let found = store.find(&session.token).await.unwrap().unwrap();
        assert_eq!(found.user_id, user_id);
        assert_eq!(found.username, "alice");

        store.destroy(&session.token).await.unwrap();
        assert!(store.find(&session.token).await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn test_expired_session_invisible(pool: Pool<Postgres>) {
        let user_id = insert_user(&pool, "bob").await;
        let store = SessionStore::new(pool.clone(), DEFAULT_TTL_HOURS);

        sqlx::query(
            r#"INSERT INTO sessions (token, user_id, username, expires_at)
                VALUES ('stale', $1, 'bob', NOW() - INTERVAL '1 hour')"#,
        )
        .bind(user_id)
        .execute(&pool)
        .await
        .unwrap();

        assert!(store.find("stale").await.unwrap().is_none());

        // the failed lookup reaped the row.
        let remaining = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM sessions WHERE token = 'stale'"#,
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(remaining, 0);
    }

    #[sqlx::test]
    async fn test_unknown_token(pool: Pool<Postgres>) {
        let store = SessionStore::new(pool, DEFAULT_TTL_HOURS);
        assert!(store.find("missing").await.unwrap().is_none());
    }
}
