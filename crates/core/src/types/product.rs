//! Catalog products and the query specification used to search them.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::UserId;

/// A purchasable automotive part.
///
/// Prices serialize as JSON numbers because that is what storefront clients
/// do arithmetic on; they deserialize from either numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product identifier.
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub price: Decimal,
    /// Pre-discount price, shown struck through when present.
    #[serde(
        default,
        serialize_with = "rust_decimal::serde::float_option::serialize"
    )]
    pub original_price: Option<Decimal>,
    /// Primary image URL (always set, falls back to a placeholder).
    pub image: String,
    /// Every known image URL, primary first.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    pub stock: i32,
    pub sku: String,
    /// Owning seller, if the product was listed through the back office.
    #[serde(default)]
    pub seller_id: Option<UserId>,
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

impl Product {
    /// Whether the product can currently be sold.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Whether the product is listed by the given seller.
    #[must_use]
    pub fn is_owned_by(&self, seller: UserId) -> bool {
        self.seller_id == Some(seller)
    }
}

/// Catalog ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Feed order, no reordering.
    #[default]
    Featured,
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
}

/// Returned when a sort parameter names no known ordering.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort key: {0}")]
pub struct UnknownSortKey(pub String);

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "featured" => Ok(Self::Featured),
            "price-asc" => Ok(Self::PriceAsc),
            "price-desc" => Ok(Self::PriceDesc),
            "name-asc" => Ok(Self::NameAsc),
            "name-desc" => Ok(Self::NameDesc),
            other => Err(UnknownSortKey(other.to_owned())),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Featured => "featured",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
        })
    }
}

/// Vehicle fitment constraints.
///
/// `make` and `model` match by case-insensitive substring, `year` by exact
/// string equality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompatibilityFilter {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<String>,
}

/// A catalog query.
///
/// Every field is optional: an empty list or `None` means "no constraint on
/// this dimension". Pagination applies only when both `page` (1-based) and
/// `limit` are set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub categories: Vec<String>,
    pub brands: Vec<String>,
    pub suppliers: Vec<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub compatibility: CompatibilityFilter,
    pub search: Option<String>,
    pub sort: SortKey,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Lowest and highest price across the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceRange {
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub min: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub max: Decimal,
}
