//! Standalone payment intent endpoint.
//!
//! Used by clients that confirm the card payment before submitting the order.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::json_body;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::payments::IntentRequest;
use crate::state::AppState;

/// Body of `POST /api/create-payment-intent`.
#[derive(Debug, Deserialize)]
pub struct CreateIntentRequest {
    /// Amount in major units, e.g. `59.98`.
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentResponse {
    pub client_secret: String,
}

/// Create a payment intent for an arbitrary amount.
///
/// POST /api/create-payment-intent
#[instrument(skip(state, payload), fields(user_id = %user.id))]
pub async fn create_intent(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    payload: std::result::Result<Json<CreateIntentRequest>, JsonRejection>,
) -> Result<Json<CreateIntentResponse>> {
    let CreateIntentRequest { amount } = json_body(payload)?;
    let processor = state
        .payments()
        .ok_or_else(|| AppError::Configuration("STRIPE_SECRET_KEY is not set".to_string()))?;

    let mut request = IntentRequest::new(amount);
    request
        .metadata
        .insert("user_id".to_string(), user.id.to_string());

    let intent = processor.create_intent(request).await?;

    Ok(Json(CreateIntentResponse {
        client_secret: intent.client_secret,
    }))
}
