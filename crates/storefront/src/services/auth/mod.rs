//! Authentication service.
//!
//! Username/password accounts with argon2 hashes, and opaque bearer tokens
//! stored in the `session` table.

mod error;
mod verifier;

pub use error::AuthError;
pub use verifier::{SessionTokenVerifier, TokenVerifier};

#[cfg(test)]
pub use verifier::MockTokenVerifier;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;

use cc_automotive_core::{Email, UserId};

use crate::db::{RepositoryError, SessionRepository, UserRepository};
use crate::models::{Session, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum username length.
const MAX_USERNAME_LENGTH: usize = 64;

/// Fallback when the configured TTL does not fit a `chrono::Duration`.
const DEFAULT_SESSION_TTL_HOURS: i64 = 168;

/// Random bytes per issued token.
const TOKEN_BYTES: usize = 32;

/// A freshly issued bearer token and its owner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// Authentication service.
///
/// Handles registration, login and logout.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    sessions: SessionRepository<'a>,
    session_ttl: chrono::Duration,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service issuing tokens valid for `session_ttl`.
    #[must_use]
    pub fn new(pool: &'a PgPool, session_ttl: std::time::Duration) -> Self {
        Self {
            users: UserRepository::new(pool),
            sessions: SessionRepository::new(pool),
            session_ttl: chrono::Duration::from_std(session_ttl)
                .unwrap_or_else(|_| chrono::Duration::hours(DEFAULT_SESSION_TTL_HOURS)),
        }
    }

    /// Register a new account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` or `AuthError::InvalidEmail` for bad input.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the username is taken.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<IssuedToken, AuthError> {
        let username = validate_username(username)?;
        let email = Email::parse(email)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create_with_password(username, &email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        info!(user_id = %user.id, "User registered");
        self.issue_token(user).await
    }

    /// Verify credentials and issue a new token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let (user, password_hash) = self
            .users
            .get_password_hash(username.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        self.issue_token(user).await
    }

    /// Revoke a token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token does not exist.
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        if self.sessions.delete(token).await? {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn issue_token(&self, user: User) -> Result<IssuedToken, AuthError> {
        let session = Session {
            token: generate_token(),
            user_id: user.id,
            expires_at: Utc::now() + self.session_ttl,
        };
        self.sessions.create(&session).await?;

        Ok(IssuedToken {
            token: session.token,
            expires_at: session.expires_at,
            user,
        })
    }
}

/// Generate an opaque URL-safe bearer token.
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Validate and trim a username.
fn validate_username(username: &str) -> Result<&str, AuthError> {
    let username = username.trim();

    if username.is_empty() {
        return Err(AuthError::InvalidUsername("username is required".to_owned()));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(AuthError::InvalidUsername(format!(
            "username must be at most {MAX_USERNAME_LENGTH} characters"
        )));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(AuthError::InvalidUsername(
            "username must not contain spaces".to_owned(),
        ));
    }

    Ok(username)
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_garbage_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_password_length() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("longenough").is_ok());
    }

    #[test]
    fn test_username_rules() {
        assert_eq!(validate_username("  mechanic_42 ").unwrap(), "mechanic_42");
        assert!(matches!(
            validate_username("   "),
            Err(AuthError::InvalidUsername(_))
        ));
        assert!(matches!(
            validate_username("two words"),
            Err(AuthError::InvalidUsername(_))
        ));
        assert!(validate_username(&"x".repeat(MAX_USERNAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_tokens_are_url_safe_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        // 32 bytes -> 43 unpadded base64 characters
        assert_eq!(a.len(), 43);
        assert!(
            a.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }
}
