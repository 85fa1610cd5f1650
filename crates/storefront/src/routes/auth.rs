//! Authentication route handlers.
//!
//! Register and login return a bearer token; every other protected endpoint
//! expects it in the `Authorization` header.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::{info, instrument};

use super::json_body;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{BearerToken, RequireAuth};
use crate::models::User;
use crate::services::auth::{AuthService, IssuedToken};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Create an account and sign it in.
///
/// POST /api/register
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IssuedToken>)> {
    let request = json_body(payload)?;
    let issued = AuthService::new(state.pool(), state.config().session_ttl)
        .register(&request.username, &request.email, &request.password)
        .await?;

    set_sentry_user(&issued.user.id, Some(&issued.user.username));
    Ok((StatusCode::CREATED, Json(issued)))
}

/// Exchange credentials for a token.
///
/// POST /api/login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<IssuedToken>> {
    let request = json_body(payload)?;
    let issued = AuthService::new(state.pool(), state.config().session_ttl)
        .login(&request.username, &request.password)
        .await?;

    info!(user_id = %issued.user.id, "User logged in");
    set_sentry_user(&issued.user.id, Some(&issued.user.username));
    Ok(Json(issued))
}

/// Revoke the caller's token.
///
/// POST /api/logout
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn logout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    BearerToken(token): BearerToken,
) -> Result<StatusCode> {
    AuthService::new(state.pool(), state.config().session_ttl)
        .logout(&token)
        .await?;

    info!(user_id = %user.id, "User logged out");
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The authenticated user's account.
///
/// GET /api/me
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn me(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Result<Json<User>> {
    let user = AuthService::new(state.pool(), state.config().session_ttl)
        .get_user(user.id)
        .await?;
    Ok(Json(user))
}
