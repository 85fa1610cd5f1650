//! Remote product feed client.
//!
//! The feed is a JSON array of loosely typed product objects. Prices arrive
//! as numbers or strings, images as an `images` array of `{url}` objects (or
//! bare strings) and/or a single `image` field, and most descriptive fields
//! may be missing. [`normalize`] turns each entry into a [`Product`].

use rand::Rng;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use cc_automotive_core::{Product, UserId, parse_amount};

use crate::config::CatalogConfig;

/// Image used when an entry has no usable image.
pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder-part.svg";

/// Sentinel for a missing product name.
pub const DEFAULT_NAME: &str = "Unnamed Product";
/// Sentinel for a missing description.
pub const DEFAULT_DESCRIPTION: &str = "No description available";
/// Sentinel for a missing category.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";
/// Sentinel for a missing brand.
pub const DEFAULT_BRAND: &str = "Unknown";

/// Placeholder inventory: the feed carries no stock levels.
const STOCK_RANGE: std::ops::RangeInclusive<i32> = 1..=50;

/// Errors that can occur while fetching the product feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The feed answered with a non-success status.
    #[error("feed returned HTTP {0}")]
    Status(reqwest::StatusCode),

    /// The body was not a JSON array.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Client for the remote product feed.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: reqwest::Client,
    url: Url,
}

impl FeedClient {
    /// Create a feed client with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::Http` if the HTTP client cannot be constructed.
    pub fn new(config: &CatalogConfig) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(config.feed_timeout)
            .build()?;

        Ok(Self {
            client,
            url: config.feed_url.clone(),
        })
    }

    /// The feed URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Fetch and normalize the feed.
    ///
    /// # Errors
    ///
    /// Returns `FeedError` on network failure, a non-2xx status, or a body that
    /// is not a JSON array.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch(&self) -> Result<Vec<Product>, FeedError> {
        let response = self.client.get(self.url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status));
        }

        let body = response.bytes().await?;
        let entries: Vec<Value> = serde_json::from_slice(&body)?;
        debug!(entries = entries.len(), "Fetched product feed");

        Ok(normalize(entries, &mut rand::rng()))
    }
}

/// Raw feed entry. Every field is optional; unknown fields are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default, alias = "title")]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    price: Value,
    #[serde(default)]
    original_price: Value,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    images: Vec<FeedImage>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    sku: Option<String>,
    #[serde(default)]
    seller_id: Option<i32>,
    #[serde(default)]
    make: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    year: Option<String>,
    #[serde(default)]
    industry: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    oem_number: Option<String>,
    #[serde(default)]
    supplier: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedImage {
    Url(String),
    Object {
        #[serde(default)]
        url: Option<String>,
    },
}

impl FeedImage {
    fn url(&self) -> Option<&str> {
        match self {
            Self::Url(url) => Some(url.as_str()),
            Self::Object { url } => url.as_deref(),
        }
        .map(str::trim)
        .filter(|u| !u.is_empty())
    }
}

/// Accept strings or numbers (e.g. `"year": 2020`), mapping anything else to `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

/// Normalize raw feed entries into products, in feed order.
///
/// Each entry gets a 1-based sequential number used as its ID when the feed
/// provides none, and as the SKU suffix when the feed has no SKU. Stock is
/// drawn from `rng`. Entries that are not JSON objects are skipped.
pub fn normalize<R: Rng + ?Sized>(entries: Vec<Value>, rng: &mut R) -> Vec<Product> {
    let mut products = Vec::with_capacity(entries.len());

    for (position, raw) in entries.into_iter().enumerate() {
        let sequence = position + 1;
        let entry = match serde_json::from_value::<FeedEntry>(raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(position = sequence, error = %e, "Skipping malformed feed entry");
                continue;
            }
        };
        products.push(normalize_entry(entry, sequence, rng.random_range(STOCK_RANGE)));
    }

    products
}

fn normalize_entry(entry: FeedEntry, sequence: usize, stock: i32) -> Product {
    let mut images: Vec<String> = entry
        .images
        .iter()
        .filter_map(FeedImage::url)
        .map(str::to_owned)
        .collect();
    let explicit_image = non_blank(entry.image);

    // images[0].url, then image, then the placeholder
    let image = match entry.images.first().and_then(FeedImage::url) {
        Some(url) => url.to_owned(),
        None => explicit_image
            .clone()
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_owned()),
    };
    if let Some(explicit) = explicit_image
        && !images.contains(&explicit)
    {
        images.push(explicit);
    }
    if images.first() != Some(&image) {
        images.retain(|u| u != &image);
        images.insert(0, image.clone());
    }

    let price = parse_amount(&entry.price).unwrap_or_else(|| {
        debug!(position = sequence, price = %entry.price, "Unparseable feed price, using 0");
        Decimal::ZERO
    });

    Product {
        id: non_blank(entry.id).unwrap_or_else(|| sequence.to_string()),
        name: non_blank(entry.name).unwrap_or_else(|| DEFAULT_NAME.to_owned()),
        description: non_blank(entry.description)
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_owned()),
        price,
        original_price: parse_amount(&entry.original_price),
        image,
        images,
        category: Some(non_blank(entry.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_owned())),
        brand: Some(non_blank(entry.brand).unwrap_or_else(|| DEFAULT_BRAND.to_owned())),
        stock,
        sku: non_blank(entry.sku).unwrap_or_else(|| format!("CC-{sequence:06}")),
        seller_id: entry.seller_id.map(UserId::new),
        make: non_blank(entry.make),
        model: non_blank(entry.model),
        year: non_blank(entry.year),
        industry: non_blank(entry.industry),
        oem_number: non_blank(entry.oem_number),
        supplier: non_blank(entry.supplier),
    }
}
