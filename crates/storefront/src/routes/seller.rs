//! Seller back office route handlers.
//!
//! Any authenticated user is a seller of the products they list.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::instrument;

use cc_automotive_core::{Order, Product, SellerStats};

use super::json_body;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::seller::{NewProductRequest, SellerService};
use crate::state::AppState;

/// Dashboard statistics for the caller.
///
/// GET /api/seller/stats
#[instrument(skip_all, fields(seller_id = %user.id))]
pub async fn stats(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<SellerStats>> {
    let stats = SellerService::new(state.catalog(), state.pool())
        .stats_for(user.id)
        .await?;
    Ok(Json(stats))
}

/// The caller's listings, in catalog order.
///
/// GET /api/seller/products
pub async fn products(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Json<Vec<Product>> {
    Json(
        SellerService::new(state.catalog(), state.pool())
            .products(user.id)
            .await,
    )
}

/// List a new product owned by the caller.
///
/// POST /api/seller/products
#[instrument(skip_all, fields(seller_id = %user.id))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    payload: std::result::Result<Json<NewProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>)> {
    let request = json_body(payload)?;
    let product = SellerService::new(state.catalog(), state.pool())
        .create_product(user.id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Orders containing any of the caller's listings, newest first.
///
/// GET /api/seller/orders
#[instrument(skip_all, fields(seller_id = %user.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = SellerService::new(state.catalog(), state.pool())
        .orders(user.id)
        .await?;
    Ok(Json(orders))
}
