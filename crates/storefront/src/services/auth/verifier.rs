//! Bearer token verification.
//!
//! Handlers only see [`TokenVerifier`]; the shipped implementation checks
//! locally issued session tokens, and a hosted identity provider can be
//! plugged in behind the same trait.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use super::AuthError;
use crate::db::SessionRepository;
use crate::models::CurrentUser;

/// Resolves a bearer token to the user it was issued to.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify `token`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for unknown or expired tokens and
    /// `AuthError::Repository` if the backing store is unavailable.
    async fn verify(&self, token: &str) -> Result<CurrentUser, AuthError>;
}

/// Verifies opaque tokens against the `session` table.
#[derive(Debug, Clone)]
pub struct SessionTokenVerifier {
    pool: PgPool,
}

impl SessionTokenVerifier {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenVerifier for SessionTokenVerifier {
    async fn verify(&self, token: &str) -> Result<CurrentUser, AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        SessionRepository::new(&self.pool)
            .find_active_user(token, Utc::now())
            .await?
            .ok_or(AuthError::InvalidToken)
    }
}
