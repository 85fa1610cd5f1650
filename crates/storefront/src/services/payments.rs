//! Payment processor integration.
//!
//! Card payments are authorized in the browser against a Stripe
//! `PaymentIntent`; the server only creates the intent and hands back its
//! client secret.

use std::collections::BTreeMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use cc_automotive_core::to_minor_units;

use crate::config::PaymentsConfig;

/// Errors that can occur when talking to the payment processor.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Amount is zero, negative, or too large to express in minor units.
    #[error("invalid payment amount: {0}")]
    InvalidAmount(Decimal),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The processor rejected the request.
    #[error("payment processor error ({status}): {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },

    /// Building the endpoint URL failed.
    #[error("invalid API URL: {0}")]
    Url(#[from] url::ParseError),
}

/// A request to authorize a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRequest {
    /// Amount in the store currency's standard unit.
    pub amount: Decimal,
    pub receipt_email: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl IntentRequest {
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self {
            amount,
            receipt_email: None,
            metadata: BTreeMap::new(),
        }
    }
}

/// A created payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub id: String,
    /// Secret the browser uses to confirm the payment.
    pub client_secret: String,
}

/// Creates payment authorizations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create a payment intent for `request.amount`.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidAmount` for non-positive amounts, and
    /// `PaymentError::Http`/`PaymentError::Api` when the processor call fails.
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, PaymentError>;
}

/// Stripe REST API client.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    api_base: Url,
    secret_key: SecretString,
    currency: String,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("api_base", &self.api_base)
            .field("secret_key", &"[REDACTED]")
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}

/// Stripe response body for a created intent.
#[derive(Deserialize)]
struct StripeIntent {
    id: String,
    client_secret: String,
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

impl StripeClient {
    /// Build a client from configuration. Returns `None` when no secret key
    /// is configured.
    #[must_use]
    pub fn from_config(config: &PaymentsConfig) -> Option<Self> {
        config.stripe_secret_key.as_ref().map(|key| Self {
            client: reqwest::Client::new(),
            api_base: config.stripe_api_base.clone(),
            secret_key: key.clone(),
            currency: config.currency.clone(),
        })
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    #[instrument(skip(self, request), fields(amount = %request.amount, currency = %self.currency))]
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, PaymentError> {
        let amount = to_minor_units(request.amount)
            .filter(|minor| *minor > 0)
            .ok_or(PaymentError::InvalidAmount(request.amount))?;

        let mut form: Vec<(String, String)> = vec![
            ("amount".to_owned(), amount.to_string()),
            ("currency".to_owned(), self.currency.clone()),
            (
                "automatic_payment_methods[enabled]".to_owned(),
                "true".to_owned(),
            ),
        ];
        if let Some(email) = request.receipt_email {
            form.push(("receipt_email".to_owned(), email));
        }
        form.extend(
            request
                .metadata
                .into_iter()
                .map(|(key, value)| (format!("metadata[{key}]"), value)),
        );

        let response = self
            .client
            .post(self.api_base.join("v1/payment_intents")?)
            .bearer_auth(self.secret_key.expose_secret())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<StripeErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or(body);
            return Err(PaymentError::Api { status, message });
        }

        let intent: StripeIntent = response.json().await?;
        debug!(intent_id = %intent.id, "Created payment intent");

        Ok(PaymentIntent {
            id: intent.id,
            client_secret: intent.client_secret,
        })
    }
}
