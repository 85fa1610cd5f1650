//! Seller reporting.
//!
//! # Usage
//!
//! ```bash
//! cc-cli seller stats 42
//! ```
//!
//! Uses the same environment as the storefront server (database URL and
//! product feed).

use cc_automotive_core::UserId;
use cc_automotive_storefront::catalog::FeedError;
use cc_automotive_storefront::config::{ConfigError, StorefrontConfig};
use cc_automotive_storefront::db::{self, ProductRepository, RepositoryError};
use cc_automotive_storefront::services::seller::{SellerError, SellerService};
use cc_automotive_storefront::state::AppState;
use thiserror::Error;

/// Errors that can occur while computing seller stats.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Seller error: {0}")]
    Seller(#[from] SellerError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Print a seller's dashboard statistics as JSON.
///
/// # Errors
///
/// Returns an error if configuration is incomplete or a query fails.
pub async fn stats(seller: i32) -> Result<(), StatsError> {
    let config = StorefrontConfig::from_env()?;

    tracing::info!("Connecting to storefront database...");
    let pool = db::create_pool(&config.database_url).await?;

    let listed = ProductRepository::new(&pool).list_all().await?;
    let catalog = AppState::build_catalog(&config, listed)?;

    let stats = SellerService::new(&catalog, &pool)
        .stats_for(UserId::new(seller))
        .await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    }

    Ok(())
}
