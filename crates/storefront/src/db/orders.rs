//! Order repository.
//!
//! Orders are written header-plus-items in a single transaction so a failure
//! can never leave an order without its line items.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use cc_automotive_core::{
    Email, Order, OrderId, OrderItem, OrderStatus, PaymentMethod, UserId,
};

use super::RepositoryError;

const ORDER_COLUMNS: &str = "id, user_id, subtotal, payment_method, deliver, location, full_name, \
     phone, email, notes, status, payment_intent_id, created_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: Option<UserId>,
    subtotal: Decimal,
    payment_method: PaymentMethod,
    deliver: bool,
    location: Option<String>,
    full_name: String,
    phone: String,
    email: Email,
    notes: Option<String>,
    status: OrderStatus,
    payment_intent_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            items,
            subtotal: self.subtotal,
            payment_method: self.payment_method,
            deliver: self.deliver,
            location: self.location,
            full_name: self.full_name,
            phone: self.phone,
            email: self.email,
            notes: self.notes,
            status: self.status,
            payment_intent_id: self.payment_intent_id,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    order_id: OrderId,
    product_id: String,
    name: String,
    price: Decimal,
    quantity: i32,
}

/// A validated order ready to be written.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<UserId>,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub payment_method: PaymentMethod,
    pub deliver: bool,
    pub location: Option<String>,
    pub full_name: String,
    pub phone: String,
    pub email: Email,
    pub notes: Option<String>,
    pub payment_intent_id: Option<String>,
}

/// Repository for orders and their line items.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert the order header (status `pending`) and its items atomically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing is
    /// committed in that case.
    pub async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let header = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO storefront.order (
                user_id, subtotal, payment_method, deliver, location,
                full_name, phone, email, notes, status, payment_intent_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order.user_id)
        .bind(order.subtotal)
        .bind(order.payment_method)
        .bind(order.deliver)
        .bind(&order.location)
        .bind(&order.full_name)
        .bind(&order.phone)
        .bind(&order.email)
        .bind(&order.notes)
        .bind(OrderStatus::Pending)
        .bind(&order.payment_intent_id)
        .fetch_one(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                r"
                INSERT INTO storefront.order_item (order_id, product_id, name, price, quantity)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(header.id)
            .bind(&item.product_id)
            .bind(&item.name)
            .bind(item.price)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(header.into_order(order.items.clone()))
    }

    /// Orders placed by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let headers = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.order \
             WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        self.attach_items(headers).await
    }

    /// Orders with at least one line item for any of `product_ids`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_containing_products(
        &self,
        product_ids: &[String],
    ) -> Result<Vec<Order>, RepositoryError> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }

        let headers = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.order o \
             WHERE EXISTS ( \
                 SELECT 1 FROM storefront.order_item i \
                 WHERE i.order_id = o.id AND i.product_id = ANY($1) \
             ) \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(product_ids)
        .fetch_all(self.pool)
        .await?;

        self.attach_items(headers).await
    }

    async fn attach_items(&self, headers: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        if headers.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = headers.iter().map(|h| h.id.as_i32()).collect();
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT order_id, product_id, name, price, quantity
            FROM storefront.order_item
            WHERE order_id = ANY($1)
            ORDER BY order_id, id
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut items_by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            items_by_order.entry(row.order_id).or_default().push(OrderItem {
                product_id: row.product_id,
                name: row.name,
                price: row.price,
                quantity: row.quantity,
            });
        }

        Ok(headers
            .into_iter()
            .map(|h| {
                let items = items_by_order.remove(&h.id).unwrap_or_default();
                h.into_order(items)
            })
            .collect())
    }
}
