//! Order route handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::instrument;

use cc_automotive_core::Order;

use super::json_body;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::services::orders::{OrderRequest, OrderService, PlacedOrder};
use crate::state::AppState;

/// Place an order for the authenticated user.
///
/// POST /api/orders
///
/// Card orders are authorized with the payment processor before anything is
/// written; the response then carries the `clientSecret` for confirmation.
#[instrument(skip(state, payload), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    payload: std::result::Result<Json<OrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PlacedOrder>)> {
    let request = json_body(payload)?;
    let method = request.payment_method.to_string();
    let items = request.items.len().to_string();
    add_breadcrumb(
        "order",
        "Order submitted",
        Some(&[("payment_method", method.as_str()), ("items", items.as_str())]),
    );

    let placed = OrderService::new(state.pool(), state.payments())
        .submit(&request, Some(user.id))
        .await?;

    Ok((StatusCode::CREATED, Json(placed)))
}

/// The authenticated user's orders, newest first.
///
/// GET /api/orders
#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderService::new(state.pool(), state.payments())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders))
}
