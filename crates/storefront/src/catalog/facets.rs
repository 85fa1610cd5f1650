//! Facets derived from the full catalog.

use std::collections::BTreeSet;

use cc_automotive_core::{PriceRange, Product};

/// Distinct categories, sorted.
pub fn categories<'a>(products: impl IntoIterator<Item = &'a Product>) -> Vec<String> {
    distinct(products.into_iter().filter_map(|p| p.category.as_deref()))
}

/// Distinct brands, sorted.
pub fn brands<'a>(products: impl IntoIterator<Item = &'a Product>) -> Vec<String> {
    distinct(products.into_iter().filter_map(|p| p.brand.as_deref()))
}

/// Lowest and highest price, or `{0, 0}` for an empty catalog.
pub fn price_range<'a>(products: impl IntoIterator<Item = &'a Product>) -> PriceRange {
    products
        .into_iter()
        .fold(None, |range: Option<PriceRange>, p| {
            Some(match range {
                None => PriceRange {
                    min: p.price,
                    max: p.price,
                },
                Some(r) => PriceRange {
                    min: r.min.min(p.price),
                    max: r.max.max(p.price),
                },
            })
        })
        .unwrap_or_default()
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_owned)
        .collect()
}
