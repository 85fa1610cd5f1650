//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (database ping)
//!
//! # Catalog
//! GET  /api/products               - Filtered product listing (X-Total-Count header)
//! GET  /api/products/{id}          - Product detail
//! GET  /api/categories             - Distinct categories
//! GET  /api/brands                 - Distinct brands
//! GET  /api/price-range            - Minimum and maximum price
//!
//! # Orders (requires auth)
//! POST /api/orders                 - Place an order
//! GET  /api/orders                 - Caller's orders
//! POST /api/create-payment-intent  - Create a payment intent for an amount
//!
//! # Auth (rate limited)
//! POST /api/register               - Create an account, returns a token
//! POST /api/login                  - Exchange credentials for a token
//! POST /api/logout                 - Revoke the caller's token
//! GET  /api/me                     - Current user
//!
//! # Seller (requires auth)
//! GET  /api/seller/stats           - Dashboard statistics
//! GET  /api/seller/products        - Seller's listings
//! POST /api/seller/products        - Create a listing
//! GET  /api/seller/orders          - Orders touching the seller's listings
//! ```

pub mod auth;
pub mod orders;
pub mod payments;
pub mod products;
pub mod seller;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};

use crate::error::AppError;
use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Unwrap a JSON body, turning extractor rejections into 400 responses with
/// a JSON message instead of axum's plain-text default.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .route("/categories", get(products::categories))
        .route("/brands", get(products::brands))
        .route("/price-range", get(products::price_range))
}

/// Create the order and payment routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(orders::index).post(orders::create))
        .route("/create-payment-intent", post(payments::create_intent))
        .layer(api_rate_limiter())
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(auth_rate_limiter())
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the seller back office routes router.
pub fn seller_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(seller::stats))
        .route("/products", get(seller::products).post(seller::create_product))
        .route("/orders", get(seller::orders))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .merge(catalog_routes())
        .merge(order_routes())
        .merge(auth_routes())
        .nest("/seller", seller_routes());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
pub(crate) mod tests {
    use std::net::Ipv4Addr;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, Response};
    use secrecy::SecretString;
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use url::Url;

    use cc_automotive_core::{Product, UserId};

    use crate::catalog::{Catalog, FeedClient};
    use crate::models::CurrentUser;
    use crate::config::{CatalogConfig, LogFormat, PaymentsConfig, StorefrontConfig};
    use crate::services::auth::MockTokenVerifier;
    use crate::services::payments::PaymentProcessor;

    use super::*;

    pub(crate) fn config(feed_url: Url) -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/cc_test"),
            host: Ipv4Addr::LOCALHOST.into(),
            port: 0,
            catalog: CatalogConfig {
                feed_url,
                feed_timeout: Duration::from_secs(5),
            },
            payments: PaymentsConfig {
                stripe_secret_key: None,
                stripe_api_base: Url::parse("http://127.0.0.1:9").unwrap(),
                currency: "usd".to_string(),
            },
            session_ttl: Duration::from_secs(3600),
            cors_allowed_origin: None,
            log_format: LogFormat::Pretty,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Application state backed by a local fake feed serving `products`.
    ///
    /// The pool connects lazily, so handlers that never touch the database
    /// run without Postgres.
    pub(crate) async fn state_with(
        products: Vec<Product>,
        verifier: MockTokenVerifier,
        payments: Option<Arc<dyn PaymentProcessor>>,
    ) -> AppState {
        let body: Vec<Value> = products
            .into_iter()
            .map(|p| serde_json::to_value(p).unwrap())
            .collect();
        let feed = Router::new().route("/feed", get(move || async move { Json(body) }));
        let feed_url = crate::catalog::tests::serve(feed).await.join("feed").unwrap();

        let config = config(feed_url);
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/cc_test")
            .unwrap();
        let catalog = Catalog::new(FeedClient::new(&config.catalog).unwrap(), Vec::new());

        AppState::with_components(config, pool, catalog, Arc::new(verifier), payments)
    }

    /// A verifier that accepts any token as the given user.
    pub(crate) fn authed_as(id: i32, username: &str) -> MockTokenVerifier {
        let user = CurrentUser {
            id: UserId::new(id),
            username: username.to_owned(),
        };
        let mut verifier = MockTokenVerifier::new();
        verifier
            .expect_verify()
            .returning(move |_| Ok(user.clone()));
        verifier
    }

    pub(crate) async fn send(app: Router, request: Request<Body>) -> (StatusCode, Response<Body>) {
        let response = app.oneshot(request).await.unwrap();
        (response.status(), response)
    }

    pub(crate) async fn body_json(response: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let state = state_with(Vec::new(), MockTokenVerifier::new(), None).await;
        let app = routes().with_state(state);

        let (status, response) = send(
            app,
            Request::builder().uri("/health").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[test]
    fn test_json_body_passes_value_through() {
        let value = json_body(Ok(Json(7_u32))).unwrap();
        assert_eq!(value, 7);
    }
}
