//! Credential-level operations over users.

use std::sync::Arc;

use sqlx::{Pool, Postgres};

use crate::crypto::PasswordManager;
use crate::error::{Result, ServerError};
use crate::user::{RegisterUser, User, UserRepository};

/// User manager.
#[derive(Clone)]
pub struct UserService {
    pub repo: UserRepository,
    pub crypto: Arc<PasswordManager>,
}

impl UserService {
    /// Create a new [`UserService`].
    pub fn new(pool: Pool<Postgres>, crypto: Arc<PasswordManager>) -> Self {
        Self {
            repo: UserRepository::new(pool),
            crypto,
        }
    }

    /// Register a new user.
    ///
    /// Uniqueness is enforced over both username and email. The raw password
    /// is hashed before it reaches the repository and is never stored.
    pub async fn register(&self, input: RegisterUser) -> Result<User> {
        if self.repo.exists(&input.username, &input.email).await? {
            return Err(ServerError::Conflict);
        }

        if input.password != input.confirm_password {
            return Err(ServerError::PasswordMismatch);
        }

        let hash = self
            .crypto
            .hash_password(&input.password)
            .map_err(|err| ServerError::Internal {
                details: err.to_string(),
            })?;

        self.repo
            .insert(
                &input.first_name,
                &input.last_name,
                &input.username,
                &input.email,
                &hash,
            )
            .await
    }

    /// Authenticate with a username-or-email identifier.
    ///
    /// Unknown identifier and wrong password return the same error.
    pub async fn authenticate(
        &self,
        login: &str,
        password: &str,
    ) -> Result<User> {
        let Some(user) = self.repo.find_by_login(login).await? else {
            return Err(ServerError::InvalidCredentials);
        };

        self.crypto
            .verify_password(password, &user.password)
            .map_err(|_| ServerError::InvalidCredentials)?;

        Ok(user)
    }
}
