//! Handle database requests.

use sqlx::{Pool, Postgres};

use crate::error::Result;
use crate::user::User;

const USER_COLUMNS: &str =
    "id, first_name, last_name, username, email, password, created_at";

#[derive(Clone)]
pub struct UserRepository {
    pool: Pool<Postgres>,
}

impl UserRepository {
    /// Create a new [`UserRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert [`User`] into database. The `password` field must already be
    /// a PHC hash.
    pub async fn insert(
        &self,
        first_name: &str,
        last_name: &str,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User> {
        let query = format!(
            r#"INSERT INTO users (first_name, last_name, username, email, password)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING {USER_COLUMNS}"#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(first_name)
            .bind(last_name)
            .bind(username)
            .bind(email)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    /// Find a user whose username OR email equals `login`.
    pub async fn find_by_login(&self, login: &str) -> Result<Option<User>> {
        let query = format!(
            r#"SELECT {USER_COLUMNS} FROM users
                WHERE username = $1 OR email = $1"#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Whether a user with this username or email already exists.
    pub async fn exists(&self, username: &str, email: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS (
                SELECT 1 FROM users WHERE username = $1 OR email = $2
            )"#,
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
