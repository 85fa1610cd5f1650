//! Authentication extractors.
//!
//! Callers authenticate with `Authorization: Bearer <token>`. Tokens are
//! checked by the [`TokenVerifier`](crate::services::auth::TokenVerifier)
//! held in [`AppState`].

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentUser;
use crate::state::AppState;

/// The raw bearer token from the `Authorization` header.
///
/// Extraction fails with 401 when the header is missing or not a bearer
/// credential. The token itself is not verified.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer_token(parts)
            .map(|t| Self(t.to_owned()))
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))
    }
}

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let user = state.verifier().verify(&token).await?;

        set_sentry_user(&user.id, Some(&user.username));

        Ok(Self(user))
    }
}
