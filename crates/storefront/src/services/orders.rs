//! Order placement.
//!
//! A submission is validated, priced server-side from its item snapshots,
//! authorized with the payment processor when paid by card, and then written
//! header-plus-items in one transaction.
//!
//! Submissions carry no idempotency key: a retried request places a second
//! order.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument};

use cc_automotive_core::{
    AmountError, Email, EmailError, MAX_STORED_AMOUNT, Order, OrderItem, PaymentMethod, UserId,
    to_stored_amount,
};

use super::payments::{IntentRequest, PaymentError, PaymentIntent, PaymentProcessor};
use crate::db::{NewOrder, OrderRepository, RepositoryError};

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("order must contain at least one item")]
    EmptyOrder,

    /// A required purchaser field is blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("delivery location is required when delivery is requested")]
    MissingLocation,

    #[error("item {index}: {reason}")]
    InvalidItem { index: usize, reason: &'static str },

    #[error("item {index}: price {source}")]
    InvalidPrice { index: usize, source: AmountError },

    #[error("order total must be at most {max}", max = MAX_STORED_AMOUNT)]
    TotalTooLarge,

    /// Card payment requested but no payment processor is configured.
    #[error("card payments are not configured")]
    PaymentsUnavailable,

    #[error("payment error: {0}")]
    Payment(#[from] PaymentError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// An order as submitted by the browser.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub deliver: bool,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A cart line as submitted by the browser.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    #[serde(default, alias = "id")]
    pub product_id: String,
    #[serde(default)]
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
}

/// A placed order plus, for card payments, the secret the browser needs to
/// confirm the payment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    #[serde(flatten)]
    pub order: Order,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

fn required(value: &str, field: &'static str) -> Result<String, OrderError> {
    let value = value.trim();
    if value.is_empty() {
        Err(OrderError::MissingField(field))
    } else {
        Ok(value.to_owned())
    }
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Validate a submission and compute its subtotal.
///
/// Item prices are rounded to whole cents first, so the snapshots, the
/// stored rows and the card amount all agree.
///
/// # Errors
///
/// Returns the first validation failure found.
pub fn validate(request: &OrderRequest, user_id: Option<UserId>) -> Result<NewOrder, OrderError> {
    if request.items.is_empty() {
        return Err(OrderError::EmptyOrder);
    }

    let full_name = required(&request.full_name, "full name")?;
    let phone = required(&request.phone, "phone")?;
    let email = Email::parse(&required(&request.email, "email")?)?;

    let location = if request.deliver {
        Some(optional(request.location.as_deref()).ok_or(OrderError::MissingLocation)?)
    } else {
        None
    };

    let mut items = Vec::with_capacity(request.items.len());
    for (index, item) in request.items.iter().enumerate() {
        let product_id = item.product_id.trim();
        if product_id.is_empty() {
            return Err(OrderError::InvalidItem {
                index,
                reason: "product id is required",
            });
        }
        if item.quantity <= 0 {
            return Err(OrderError::InvalidItem {
                index,
                reason: "quantity must be positive",
            });
        }
        let price = to_stored_amount(item.price)
            .map_err(|source| OrderError::InvalidPrice { index, source })?;
        items.push(OrderItem {
            product_id: product_id.to_owned(),
            name: item.name.trim().to_owned(),
            price,
            quantity: item.quantity,
        });
    }

    let subtotal = items
        .iter()
        .try_fold(Decimal::ZERO, |total, item| {
            item.line_total().and_then(|line| total.checked_add(line))
        })
        .filter(|total| *total <= MAX_STORED_AMOUNT)
        .ok_or(OrderError::TotalTooLarge)?;

    Ok(NewOrder {
        user_id,
        items,
        subtotal,
        payment_method: request.payment_method,
        deliver: request.deliver,
        location,
        full_name,
        phone,
        email,
        notes: optional(request.notes.as_deref()),
        payment_intent_id: None,
    })
}

/// Create a payment intent for card orders; other methods need none.
///
/// # Errors
///
/// Returns `OrderError::PaymentsUnavailable` if a card order arrives without a
/// configured processor, or `OrderError::Payment` if the processor fails.
pub async fn authorize_payment(
    order: &NewOrder,
    payments: Option<&dyn PaymentProcessor>,
) -> Result<Option<PaymentIntent>, OrderError> {
    if order.payment_method != PaymentMethod::Card {
        return Ok(None);
    }
    let processor = payments.ok_or(OrderError::PaymentsUnavailable)?;

    let mut metadata = BTreeMap::new();
    metadata.insert("item_count".to_owned(), order.items.len().to_string());
    if let Some(user_id) = order.user_id {
        metadata.insert("user_id".to_owned(), user_id.to_string());
    }

    let intent = processor
        .create_intent(IntentRequest {
            amount: order.subtotal,
            receipt_email: Some(order.email.as_str().to_owned()),
            metadata,
        })
        .await?;

    Ok(Some(intent))
}

/// Order placement and history.
pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
    payments: Option<&'a dyn PaymentProcessor>,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub fn new(pool: &'a PgPool, payments: Option<&'a dyn PaymentProcessor>) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            payments,
        }
    }

    /// Validate, authorize and persist an order.
    ///
    /// Nothing is written if validation or payment authorization fails.
    ///
    /// # Errors
    ///
    /// See [`OrderError`].
    #[instrument(skip(self, request), fields(payment_method = %request.payment_method))]
    pub async fn submit(
        &self,
        request: &OrderRequest,
        user_id: Option<UserId>,
    ) -> Result<PlacedOrder, OrderError> {
        let mut new_order = validate(request, user_id)?;

        let intent = authorize_payment(&new_order, self.payments).await?;
        new_order.payment_intent_id = intent.as_ref().map(|i| i.id.clone());

        let order = self.orders.create(&new_order).await?;
        info!(order_id = %order.id, subtotal = %order.subtotal, "Order placed");

        Ok(PlacedOrder {
            order,
            client_secret: intent.map(|i| i.client_secret),
        })
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.list_for_user(user_id).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::services::payments::MockPaymentProcessor;

    fn request() -> OrderRequest {
        OrderRequest {
            items: vec![
                OrderItemRequest {
                    product_id: "p1".to_owned(),
                    name: "Brake Pad".to_owned(),
                    price: Decimal::new(2999, 2),
                    quantity: 2,
                },
                OrderItemRequest {
                    product_id: "p2".to_owned(),
                    name: "Oil Filter".to_owned(),
                    price: Decimal::new(1000, 2),
                    quantity: 1,
                },
            ],
            payment_method: PaymentMethod::Cash,
            deliver: false,
            location: None,
            full_name: "Ada Mechanic".to_owned(),
            phone: "+1 555 0100".to_owned(),
            email: "ada@example.com".to_owned(),
            notes: Some("  ".to_owned()),
        }
    }

    #[test]
    fn test_valid_order_computes_subtotal() {
        let order = validate(&request(), Some(UserId::new(1))).unwrap();
        assert_eq!(order.subtotal, Decimal::new(6998, 2));
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.notes, None);
        assert_eq!(order.user_id, Some(UserId::new(1)));
    }

    #[test]
    fn test_delivery_requires_location() {
        let mut req = request();
        req.deliver = true;
        req.location = Some("   ".to_owned());
        assert!(matches!(
            validate(&req, None),
            Err(OrderError::MissingLocation)
        ));

        req.location = Some("12 Garage Rd".to_owned());
        let order = validate(&req, None).unwrap();
        assert_eq!(order.location.as_deref(), Some("12 Garage Rd"));
    }

    #[test]
    fn test_pickup_ignores_location() {
        let mut req = request();
        req.deliver = false;
        req.location = Some("ignored".to_owned());
        assert_eq!(validate(&req, None).unwrap().location, None);
    }

    #[test]
    fn test_missing_purchaser_fields() {
        let mut req = request();
        req.items.clear();
        assert!(matches!(validate(&req, None), Err(OrderError::EmptyOrder)));

        let mut req = request();
        req.full_name = " ".to_owned();
        assert!(matches!(
            validate(&req, None),
            Err(OrderError::MissingField("full name"))
        ));

        let mut req = request();
        req.phone = String::new();
        assert!(matches!(
            validate(&req, None),
            Err(OrderError::MissingField("phone"))
        ));

        let mut req = request();
        req.email = "not-an-email".to_owned();
        assert!(matches!(
            validate(&req, None),
            Err(OrderError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_item_rules() {
        let mut req = request();
        req.items[1].quantity = 0;
        assert!(matches!(
            validate(&req, None),
            Err(OrderError::InvalidItem { index: 1, .. })
        ));

        let mut req = request();
        req.items[0].price = Decimal::new(-1, 0);
        assert!(matches!(
            validate(&req, None),
            Err(OrderError::InvalidPrice {
                index: 0,
                source: AmountError::Negative
            })
        ));

        let mut req = request();
        req.items[0].product_id = String::new();
        assert!(matches!(
            validate(&req, None),
            Err(OrderError::InvalidItem { index: 0, .. })
        ));
    }

    #[test]
    fn test_prices_are_rounded_to_cents() {
        let mut req = request();
        req.items[0].price = Decimal::new(29_999, 3);
        let order = validate(&req, None).unwrap();

        assert_eq!(order.items[0].price, Decimal::new(3000, 2));
        assert_eq!(order.subtotal, Decimal::new(7000, 2));
    }

    #[test]
    fn test_oversized_amounts_are_rejected() {
        let mut req = request();
        req.items[1].price = Decimal::new(10_000_000_000, 0);
        assert!(matches!(
            validate(&req, None),
            Err(OrderError::InvalidPrice {
                index: 1,
                source: AmountError::TooLarge
            })
        ));

        // each price fits, the total does not
        let mut req = request();
        req.items[0].price = Decimal::new(999_999_999_999, 2);
        req.items[0].quantity = 2;
        assert!(matches!(
            validate(&req, None),
            Err(OrderError::TotalTooLarge)
        ));

        // largest price at the largest quantity
        let mut req = request();
        req.items[0].price = MAX_STORED_AMOUNT;
        req.items[0].quantity = i32::MAX;
        assert!(matches!(
            validate(&req, None),
            Err(OrderError::TotalTooLarge)
        ));
    }

    #[test]
    fn test_request_deserializes_from_browser_payload() {
        let req: OrderRequest = serde_json::from_value(serde_json::json!({
            "items": [{"id": "p1", "name": "Brake Pad", "price": "29.99", "quantity": 1}],
            "paymentMethod": "mobile",
            "deliver": true,
            "location": "Depot 4",
            "fullName": "Ada",
            "phone": "555",
            "email": "ada@example.com"
        }))
        .unwrap();
        assert_eq!(req.payment_method, PaymentMethod::Mobile);
        assert_eq!(req.items[0].product_id, "p1");
        assert_eq!(req.items[0].price, Decimal::new(2999, 2));
    }

    #[tokio::test]
    async fn test_non_card_orders_skip_payment() {
        let order = validate(&request(), None).unwrap();
        let processor = MockPaymentProcessor::new();
        assert!(
            authorize_payment(&order, Some(&processor))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_card_order_creates_intent_for_subtotal() {
        let mut req = request();
        req.payment_method = PaymentMethod::Card;
        let order = validate(&req, None).unwrap();

        let mut processor = MockPaymentProcessor::new();
        processor
            .expect_create_intent()
            .withf(|r| {
                r.amount == Decimal::new(6998, 2)
                    && r.receipt_email.as_deref() == Some("ada@example.com")
            })
            .times(1)
            .returning(|_| {
                Ok(PaymentIntent {
                    id: "pi_1".to_owned(),
                    client_secret: "pi_1_secret".to_owned(),
                })
            });

        let intent = authorize_payment(&order, Some(&processor))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(intent.id, "pi_1");
    }

    #[tokio::test]
    async fn test_card_order_without_processor() {
        let mut req = request();
        req.payment_method = PaymentMethod::Card;
        let order = validate(&req, None).unwrap();
        assert!(matches!(
            authorize_payment(&order, None).await,
            Err(OrderError::PaymentsUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_processor_failure_propagates() {
        let mut req = request();
        req.payment_method = PaymentMethod::Card;
        let order = validate(&req, None).unwrap();

        let mut processor = MockPaymentProcessor::new();
        processor
            .expect_create_intent()
            .returning(|r| Err(PaymentError::InvalidAmount(r.amount)));

        assert!(matches!(
            authorize_payment(&order, Some(&processor)).await,
            Err(OrderError::Payment(_))
        ));
    }
}
