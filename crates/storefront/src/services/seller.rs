//! Seller back office: dashboard statistics, inventory and listings.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use cc_automotive_core::{Order, OrderStatus, Product, SellerStats, UserId, to_stored_amount};

use crate::catalog::Catalog;
use crate::catalog::feed::PLACEHOLDER_IMAGE;
use crate::db::{OrderRepository, ProductRepository, RepositoryError};

/// Orders shown on the dashboard.
const RECENT_ORDER_COUNT: usize = 5;

/// Errors from seller operations.
#[derive(Debug, Error)]
pub enum SellerError {
    #[error("{0}")]
    Validation(String),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Compute dashboard figures for a seller.
///
/// `orders` may contain unrelated orders; only those with an item for one of
/// `products` count. `now` fixes the "current month".
pub fn aggregate<'a>(
    products: impl IntoIterator<Item = &'a Product>,
    orders: &[Order],
    now: DateTime<Utc>,
) -> SellerStats {
    let mut active_products = 0;
    let mut owned = HashSet::new();
    for product in products {
        if product.in_stock() {
            active_products += 1;
        }
        owned.insert(product.id.as_str());
    }

    let mut relevant: Vec<&Order> = orders
        .iter()
        .filter(|o| o.touches(|id| owned.contains(id)))
        .collect();

    let total_sales = relevant.iter().map(|o| o.subtotal).sum::<Decimal>();
    let pending_orders = relevant
        .iter()
        .filter(|o| o.status == OrderStatus::Pending)
        .count();
    let monthly_revenue = relevant
        .iter()
        .filter(|o| o.created_at.year() == now.year() && o.created_at.month() == now.month())
        .map(|o| o.subtotal)
        .sum::<Decimal>();

    relevant.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let recent_orders = relevant
        .into_iter()
        .take(RECENT_ORDER_COUNT)
        .cloned()
        .collect();

    SellerStats {
        total_sales,
        pending_orders,
        active_products,
        monthly_revenue,
        recent_orders,
    }
}

/// A product listing submitted from the back office.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProductRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub oem_number: Option<String>,
    #[serde(default)]
    pub supplier: Option<String>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

impl NewProductRequest {
    /// Validate and turn the listing into a catalog product owned by `seller`.
    ///
    /// # Errors
    ///
    /// Returns `SellerError::Validation` for a blank name, a negative stock
    /// level, or a price that is negative or too large to store. Prices are
    /// rounded to whole cents.
    pub fn into_product(self, seller: UserId) -> Result<Product, SellerError> {
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return Err(SellerError::Validation("name is required".to_owned()));
        }
        let price = to_stored_amount(self.price)
            .map_err(|e| SellerError::Validation(format!("price {e}")))?;
        let original_price = self
            .original_price
            .map(to_stored_amount)
            .transpose()
            .map_err(|e| SellerError::Validation(format!("original price {e}")))?;
        if self.stock < 0 {
            return Err(SellerError::Validation("stock must not be negative".to_owned()));
        }

        let key = Uuid::new_v4().simple().to_string();
        let mut images: Vec<String> = self
            .images
            .into_iter()
            .filter_map(|u| trimmed(Some(u)))
            .collect();
        let image = trimmed(self.image)
            .or_else(|| images.first().cloned())
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_owned());
        if !images.contains(&image) {
            images.insert(0, image.clone());
        }

        Ok(Product {
            sku: trimmed(self.sku).unwrap_or_else(|| {
                format!("SP-{}", key.get(..8).unwrap_or(&key).to_uppercase())
            }),
            id: format!("sp-{key}"),
            name,
            description: self.description.trim().to_owned(),
            price,
            original_price,
            image,
            images,
            category: trimmed(self.category),
            brand: trimmed(self.brand),
            stock: self.stock,
            seller_id: Some(seller),
            make: trimmed(self.make),
            model: trimmed(self.model),
            year: trimmed(self.year),
            industry: trimmed(self.industry),
            oem_number: trimmed(self.oem_number),
            supplier: trimmed(self.supplier),
        })
    }
}

/// Seller-facing operations over the catalog and order history.
pub struct SellerService<'a> {
    catalog: &'a Catalog,
    pool: &'a PgPool,
}

impl<'a> SellerService<'a> {
    #[must_use]
    pub const fn new(catalog: &'a Catalog, pool: &'a PgPool) -> Self {
        Self { catalog, pool }
    }

    /// The seller's products, in catalog order.
    pub async fn products(&self, seller: UserId) -> Vec<Product> {
        self.catalog
            .ensure_loaded()
            .await
            .owned_by(seller)
            .cloned()
            .collect()
    }

    /// Orders containing any of the seller's products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SellerError::Repository` if the query fails.
    pub async fn orders(&self, seller: UserId) -> Result<Vec<Order>, SellerError> {
        let ids: Vec<String> = self
            .products(seller)
            .await
            .into_iter()
            .map(|p| p.id)
            .collect();
        Ok(OrderRepository::new(self.pool)
            .list_containing_products(&ids)
            .await?)
    }

    /// Dashboard statistics for the seller.
    ///
    /// # Errors
    ///
    /// Returns `SellerError::Repository` if the order query fails.
    pub async fn stats_for(&self, seller: UserId) -> Result<SellerStats, SellerError> {
        let products = self.products(seller).await;
        let ids: Vec<String> = products.iter().map(|p| p.id.clone()).collect();
        let orders = OrderRepository::new(self.pool)
            .list_containing_products(&ids)
            .await?;

        Ok(aggregate(&products, &orders, Utc::now()))
    }

    /// Persist a new listing and add it to the live catalog.
    ///
    /// # Errors
    ///
    /// Returns `SellerError::Validation` for invalid listings and
    /// `SellerError::Repository` if the insert fails.
    pub async fn create_product(
        &self,
        seller: UserId,
        request: NewProductRequest,
    ) -> Result<Product, SellerError> {
        let product = request.into_product(seller)?;
        let product = ProductRepository::new(self.pool).create(&product).await?;

        self.catalog.insert(product.clone()).await;
        info!(product_id = %product.id, seller_id = %seller, "Seller product listed");

        Ok(product)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeZone;

    use cc_automotive_core::{Email, OrderId, OrderItem, PaymentMethod};

    use super::*;
    use crate::catalog::tests::product;

    fn order(id: i32, product_id: &str, subtotal: i64, status: OrderStatus, at: DateTime<Utc>) -> Order {
        Order {
            id: OrderId::new(id),
            user_id: None,
            items: vec![OrderItem {
                product_id: product_id.to_owned(),
                name: "Part".to_owned(),
                price: Decimal::from(subtotal),
                quantity: 1,
            }],
            subtotal: Decimal::from(subtotal),
            payment_method: PaymentMethod::Cash,
            deliver: false,
            location: None,
            full_name: "Buyer".to_owned(),
            phone: "555".to_owned(),
            email: Email::parse("buyer@example.com").unwrap(),
            notes: None,
            status,
            payment_intent_id: None,
            created_at: at,
        }
    }

    fn seller_products() -> Vec<Product> {
        let mut a = product("s1", "Pad", 10);
        a.stock = 4;
        let mut b = product("s2", "Rotor", 20);
        b.stock = 0;
        vec![a, b]
    }

    #[test]
    fn test_aggregate_dashboard() {
        let now = Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap();
        let this_month = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let last_month = Utc.with_ymd_and_hms(2026, 2, 27, 9, 0, 0).unwrap();
        let last_year = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();

        let orders = vec![
            order(1, "s1", 100, OrderStatus::Pending, this_month),
            order(2, "s2", 50, OrderStatus::Paid, last_month),
            order(3, "other", 999, OrderStatus::Pending, this_month),
            order(4, "s1", 25, OrderStatus::Delivered, last_year),
        ];

        let stats = aggregate(&seller_products(), &orders, now);
        assert_eq!(stats.total_sales, Decimal::from(175));
        assert_eq!(stats.pending_orders, 1);
        assert_eq!(stats.active_products, 1);
        assert_eq!(stats.monthly_revenue, Decimal::from(100));
        let recent: Vec<i32> = stats.recent_orders.iter().map(|o| o.id.as_i32()).collect();
        assert_eq!(recent, vec![1, 2, 4]);
    }

    #[test]
    fn test_recent_orders_capped_newest_first() {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let orders: Vec<Order> = (1..=8)
            .map(|i| {
                order(
                    i,
                    "s1",
                    10,
                    OrderStatus::Pending,
                    base + chrono::Duration::days(i64::from(i)),
                )
            })
            .collect();

        let stats = aggregate(&seller_products(), &orders, base);
        let recent: Vec<i32> = stats.recent_orders.iter().map(|o| o.id.as_i32()).collect();
        assert_eq!(recent, vec![8, 7, 6, 5, 4]);
        assert_eq!(stats.pending_orders, 8);
    }

    #[test]
    fn test_seller_without_products() {
        let now = Utc::now();
        let orders = vec![order(1, "s1", 10, OrderStatus::Pending, now)];
        let stats = aggregate(&Vec::<Product>::new(), &orders, now);
        assert_eq!(stats.total_sales, Decimal::ZERO);
        assert!(stats.recent_orders.is_empty());
    }

    #[test]
    fn test_new_product_request() {
        let request: NewProductRequest = serde_json::from_value(serde_json::json!({
            "name": "  Turbo Hose ",
            "price": 45.5,
            "stock": 3,
            "images": ["https://cdn/hose.jpg"],
            "make": "Subaru",
            "year": "2019"
        }))
        .unwrap();
        let product = request.into_product(UserId::new(7)).unwrap();

        assert!(product.id.starts_with("sp-"));
        assert!(product.sku.starts_with("SP-"));
        assert_eq!(product.name, "Turbo Hose");
        assert_eq!(product.image, "https://cdn/hose.jpg");
        assert_eq!(product.images, vec!["https://cdn/hose.jpg"]);
        assert_eq!(product.seller_id, Some(UserId::new(7)));
        assert_eq!(product.make.as_deref(), Some("Subaru"));
    }

    #[test]
    fn test_new_product_validation() {
        let blank: NewProductRequest =
            serde_json::from_value(serde_json::json!({"name": " ", "price": 1})).unwrap();
        assert!(matches!(
            blank.into_product(UserId::new(1)),
            Err(SellerError::Validation(_))
        ));

        let negative: NewProductRequest =
            serde_json::from_value(serde_json::json!({"name": "Hose", "price": "-2"})).unwrap();
        assert!(matches!(
            negative.into_product(UserId::new(1)),
            Err(SellerError::Validation(msg)) if msg == "price must not be negative"
        ));

        let huge: NewProductRequest = serde_json::from_value(serde_json::json!({
            "name": "Hose",
            "price": "10000000000"
        }))
        .unwrap();
        assert!(matches!(
            huge.into_product(UserId::new(1)),
            Err(SellerError::Validation(msg)) if msg == "price must be at most 9999999999.99"
        ));

        let huge_original: NewProductRequest = serde_json::from_value(serde_json::json!({
            "name": "Hose",
            "price": 2,
            "originalPrice": "100000000000000000000"
        }))
        .unwrap();
        assert!(matches!(
            huge_original.into_product(UserId::new(1)),
            Err(SellerError::Validation(msg)) if msg.starts_with("original price")
        ));

        let fractional: NewProductRequest = serde_json::from_value(serde_json::json!({
            "name": "Hose",
            "price": "12.345",
            "originalPrice": "15.005"
        }))
        .unwrap();
        let product = fractional.into_product(UserId::new(1)).unwrap();
        assert_eq!(product.price, Decimal::new(1235, 2));
        assert_eq!(product.original_price, Some(Decimal::new(1501, 2)));

        let no_image: NewProductRequest =
            serde_json::from_value(serde_json::json!({"name": "Hose", "price": 2})).unwrap();
        assert_eq!(
            no_image.into_product(UserId::new(1)).unwrap().image,
            PLACEHOLDER_IMAGE
        );
    }
}
