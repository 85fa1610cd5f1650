//! Orders and seller dashboard statistics.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::email::Email;
use crate::types::id::{OrderId, UserId};
use crate::types::status::{OrderStatus, PaymentMethod};

/// A line item captured at purchase time.
///
/// `price` and `name` are snapshots: later catalog changes never rewrite
/// past orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub price: Decimal,
    pub quantity: i32,
}

impl OrderItem {
    /// `price * quantity`, or `None` on overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Purchaser account, absent for guest checkouts.
    pub user_id: Option<UserId>,
    pub items: Vec<OrderItem>,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub subtotal: Decimal,
    pub payment_method: PaymentMethod,
    pub deliver: bool,
    pub location: Option<String>,
    pub full_name: String,
    pub phone: String,
    pub email: Email,
    pub notes: Option<String>,
    pub status: OrderStatus,
    /// Payment processor intent created for card orders.
    pub payment_intent_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Whether any line item refers to a product accepted by `owns`.
    pub fn touches(&self, mut owns: impl FnMut(&str) -> bool) -> bool {
        self.items.iter().any(|item| owns(&item.product_id))
    }
}

/// Dashboard figures for one seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerStats {
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total_sales: Decimal,
    pub pending_orders: usize,
    pub active_products: usize,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub monthly_revenue: Decimal,
    /// Newest first, at most five.
    pub recent_orders: Vec<Order>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let item = OrderItem {
            product_id: "p1".to_owned(),
            name: "Oil Filter".to_owned(),
            price: Decimal::new(1250, 2),
            quantity: 3,
        };
        assert_eq!(item.line_total(), Some(Decimal::new(3750, 2)));
    }

    #[test]
    fn test_line_total_overflow() {
        let item = OrderItem {
            product_id: "p1".to_owned(),
            name: "Crate Engine".to_owned(),
            price: Decimal::MAX,
            quantity: 2,
        };
        assert_eq!(item.line_total(), None);
    }
}
