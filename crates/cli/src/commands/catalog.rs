//! Product feed inspection.
//!
//! # Usage
//!
//! ```bash
//! # Summarize the configured feed (CATALOG_FEED_URL)
//! cc-cli catalog summary
//!
//! # Summarize another feed
//! cc-cli catalog summary --url https://feeds.example.com/parts.json
//! ```

use std::time::Duration;

use cc_automotive_storefront::catalog::{self, FeedClient, FeedError};
use cc_automotive_storefront::config::CatalogConfig;
use thiserror::Error;
use url::Url;

/// Timeout for the one-off feed fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while summarizing the feed.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid feed URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),
}

/// Fetch the feed once and log what it contains.
///
/// # Errors
///
/// Returns an error if no feed URL is available or the fetch fails.
pub async fn summary(url: Option<String>) -> Result<(), CatalogError> {
    let url = match url {
        Some(url) => url,
        None => std::env::var("CATALOG_FEED_URL")
            .map_err(|_| CatalogError::MissingEnvVar("CATALOG_FEED_URL"))?,
    };

    let client = FeedClient::new(&CatalogConfig {
        feed_url: Url::parse(&url)?,
        feed_timeout: FETCH_TIMEOUT,
    })?;

    tracing::info!(url = %client.url(), "Fetching product feed...");
    let products = client.fetch().await?;

    let range = catalog::price_range(&products);
    tracing::info!(
        products = products.len(),
        min_price = %range.min,
        max_price = %range.max,
        "Feed summary"
    );
    tracing::info!(categories = ?catalog::categories(&products), "Categories");
    tracing::info!(brands = ?catalog::brands(&products), "Brands");

    let sellers = products.iter().filter(|p| p.seller_id.is_some()).count();
    if sellers > 0 {
        tracing::info!(count = sellers, "Feed products attributed to sellers");
    }

    Ok(())
}
