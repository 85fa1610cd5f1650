//! Product catalog: remote feed, in-memory cache, query engine and facets.
//!
//! The feed is fetched at most once per process. Concurrent callers that
//! find the cache empty share one in-flight fetch (`moka` `try_get_with`);
//! a failed fetch is logged and not cached, so the next request retries.
//!
//! Seller-created products are kept alongside the feed products and are
//! appended after them in catalog order.

pub mod facets;
pub mod feed;
pub mod query;

use std::collections::HashMap;
use std::sync::Arc;

use moka::future::Cache;
use tokio::sync::RwLock;
use tracing::{error, info, instrument};

use cc_automotive_core::{Product, UserId};

pub use facets::{brands, categories, price_range};
pub use feed::{FeedClient, FeedError};
pub use query::{QueryResult, query};

/// Feed products in feed order, indexed by ID.
#[derive(Debug, Default)]
struct FeedProducts {
    products: Vec<Product>,
    index: HashMap<String, usize>,
}

impl FeedProducts {
    fn new(products: Vec<Product>) -> Self {
        let mut index = HashMap::with_capacity(products.len());
        for (i, product) in products.iter().enumerate() {
            // first occurrence wins for duplicated feed IDs
            index.entry(product.id.clone()).or_insert(i);
        }
        Self { products, index }
    }
}

/// A consistent, cheaply cloneable view of the whole catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    feed: Arc<FeedProducts>,
    listed: Arc<Vec<Product>>,
}

impl CatalogSnapshot {
    /// All products in catalog order: feed order, then seller listings in
    /// creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.feed.products.iter().chain(self.listed.iter())
    }

    /// Look up a product by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.feed
            .index
            .get(id)
            .and_then(|&i| self.feed.products.get(i))
            .or_else(|| self.listed.iter().find(|p| p.id == id))
    }

    /// Products listed by `seller`.
    pub fn owned_by(&self, seller: UserId) -> impl Iterator<Item = &Product> {
        self.iter().filter(move |p| p.is_owned_by(seller))
    }

    /// Total number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.feed.products.len() + self.listed.len()
    }

    /// Whether the catalog holds no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-wide product cache.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    feed_client: FeedClient,
    feed: Cache<(), Arc<FeedProducts>>,
    listed: RwLock<Arc<Vec<Product>>>,
}

impl Catalog {
    /// Create an empty catalog backed by `feed_client`.
    ///
    /// `listed` holds seller-created products loaded from the database; they
    /// are part of every snapshot regardless of the feed's state.
    #[must_use]
    pub fn new(feed_client: FeedClient, listed: Vec<Product>) -> Self {
        let feed = Cache::builder().max_capacity(1).build();

        Self {
            inner: Arc::new(CatalogInner {
                feed_client,
                feed,
                listed: RwLock::new(Arc::new(listed)),
            }),
        }
    }

    /// Return the catalog, fetching the feed first if it has not been loaded.
    ///
    /// Never fails: when the feed cannot be fetched the snapshot contains only
    /// seller-created products, and the next call tries the feed again.
    #[instrument(skip(self))]
    pub async fn ensure_loaded(&self) -> CatalogSnapshot {
        let client = &self.inner.feed_client;
        let feed = match self
            .inner
            .feed
            .try_get_with((), async {
                let products = client.fetch().await?;
                info!(count = products.len(), "Product feed loaded");
                Ok::<_, FeedError>(Arc::new(FeedProducts::new(products)))
            })
            .await
        {
            Ok(feed) => feed,
            Err(e) => {
                error!(error = %e, url = %client.url(), "Failed to load product feed");
                Arc::default()
            }
        };

        CatalogSnapshot {
            feed,
            listed: Arc::clone(&*self.inner.listed.read().await),
        }
    }

    /// Look up a single product, loading the catalog if needed.
    pub async fn get(&self, id: &str) -> Option<Product> {
        self.ensure_loaded().await.get(id).cloned()
    }

    /// Append a seller-created product.
    ///
    /// Readers holding an older snapshot keep seeing it; later snapshots
    /// include the new product.
    pub async fn insert(&self, product: Product) {
        let mut listed = self.inner.listed.write().await;
        let mut next = Vec::with_capacity(listed.len() + 1);
        next.extend(listed.iter().cloned());
        next.push(product);
        *listed = Arc::new(next);
    }
}
