//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::catalog::{Catalog, FeedClient, FeedError};
use crate::config::StorefrontConfig;
use crate::services::auth::{SessionTokenVerifier, TokenVerifier};
use crate::services::payments::{PaymentProcessor, StripeClient};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    catalog: Catalog,
    verifier: Arc<dyn TokenVerifier>,
    payments: Option<Arc<dyn PaymentProcessor>>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    /// * `catalog` - Product cache, usually built with [`AppState::build_catalog`]
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool, catalog: Catalog) -> Self {
        let verifier: Arc<dyn TokenVerifier> = Arc::new(SessionTokenVerifier::new(pool.clone()));
        let payments = StripeClient::from_config(&config.payments)
            .map(|client| Arc::new(client) as Arc<dyn PaymentProcessor>);

        Self::with_components(config, pool, catalog, verifier, payments)
    }

    /// Create application state with explicit token verifier and payment processor.
    #[must_use]
    pub fn with_components(
        config: StorefrontConfig,
        pool: PgPool,
        catalog: Catalog,
        verifier: Arc<dyn TokenVerifier>,
        payments: Option<Arc<dyn PaymentProcessor>>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                verifier,
                payments,
            }),
        }
    }

    /// Build the product cache for `config`, seeded with persisted seller products.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::Http` if the feed HTTP client cannot be constructed.
    pub fn build_catalog(
        config: &StorefrontConfig,
        listed: Vec<cc_automotive_core::Product>,
    ) -> Result<Catalog, FeedError> {
        Ok(Catalog::new(FeedClient::new(&config.catalog)?, listed))
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the product cache.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get the bearer token verifier.
    #[must_use]
    pub fn verifier(&self) -> &dyn TokenVerifier {
        self.inner.verifier.as_ref()
    }

    /// Get the payment processor, if card payments are configured.
    #[must_use]
    pub fn payments(&self) -> Option<&dyn PaymentProcessor> {
        self.inner.payments.as_deref()
    }
}
