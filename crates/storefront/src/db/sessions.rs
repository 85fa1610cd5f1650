//! Session (bearer token) repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use cc_automotive_core::UserId;

use super::RepositoryError;
use crate::models::{CurrentUser, Session};

#[derive(sqlx::FromRow)]
struct SessionUserRow {
    user_id: UserId,
    username: String,
}

/// Repository for issued bearer tokens.
pub struct SessionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SessionRepository<'a> {
    /// Create a new session repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a newly issued token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, session: &Session) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.session (token, user_id, expires_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(&session.token)
        .bind(session.user_id)
        .bind(session.expires_at)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "session token"))?;

        Ok(())
    }

    /// Resolve a token to its user if the session exists and has not expired
    /// at `now`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_active_user(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CurrentUser>, RepositoryError> {
        let row = sqlx::query_as::<_, SessionUserRow>(
            r"
            SELECT s.user_id, u.username
            FROM storefront.session s
            JOIN storefront.user u ON u.id = s.user_id
            WHERE s.token = $1 AND s.expires_at > $2
            ",
        )
        .bind(token)
        .bind(now)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| CurrentUser {
            id: r.user_id,
            username: r.username,
        }))
    }

    /// Delete a token. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, token: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.session WHERE token = $1")
            .bind(token)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove sessions that expired before `now`. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.session WHERE expires_at <= $1")
            .bind(now)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
