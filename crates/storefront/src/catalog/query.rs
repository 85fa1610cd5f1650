//! Catalog query engine: filter, sort, paginate.

use std::cmp::Ordering;

use cc_automotive_core::{Product, ProductFilter, SortKey};

/// One page of matching products plus the total match count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub items: Vec<Product>,
    /// Matches after filtering, before pagination.
    pub total: usize,
}

/// Run `filter` over `products`.
///
/// Filtering preserves input order; sorting is stable, so `featured` (and
/// ties under any other key) keep catalog order.
pub fn query<'a, I>(products: I, filter: &ProductFilter) -> QueryResult
where
    I: IntoIterator<Item = &'a Product>,
{
    let needle = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut matched: Vec<&Product> = products
        .into_iter()
        .filter(|p| matches(p, filter, needle.as_deref()))
        .collect();
    let total = matched.len();

    sort(&mut matched, filter.sort);

    let items = match (filter.page, filter.limit) {
        (Some(page), Some(limit)) => paginate(&matched, page, limit),
        _ => matched.as_slice(),
    };

    QueryResult {
        items: items.iter().map(|&p| p.clone()).collect(),
        total,
    }
}

fn paginate<'s, 'p>(matched: &'s [&'p Product], page: u32, limit: u32) -> &'s [&'p Product] {
    let Some(page_index) = (page as usize).checked_sub(1) else {
        return &[];
    };
    let limit = limit as usize;
    let Some(start) = page_index.checked_mul(limit) else {
        return &[];
    };
    if limit == 0 || start >= matched.len() {
        return &[];
    }
    let end = start.saturating_add(limit).min(matched.len());
    matched.get(start..end).unwrap_or_default()
}

/// Whether `product` satisfies every active constraint of `filter`.
///
/// `needle` is the lowercased search term, if any.
fn matches(product: &Product, filter: &ProductFilter, needle: Option<&str>) -> bool {
    if !filter.suppliers.is_empty() && !in_set(product.supplier.as_deref(), &filter.suppliers) {
        return false;
    }

    let fitment = &filter.compatibility;
    if let Some(make) = fitment.make.as_deref()
        && !contains_ignore_case(product.make.as_deref(), make)
    {
        return false;
    }
    if let Some(model) = fitment.model.as_deref()
        && !contains_ignore_case(product.model.as_deref(), model)
    {
        return false;
    }
    if let Some(year) = fitment.year.as_deref()
        && product.year.as_deref() != Some(year)
    {
        return false;
    }

    if !filter.categories.is_empty() && !in_set(product.category.as_deref(), &filter.categories) {
        return false;
    }
    if !filter.brands.is_empty() && !in_set(product.brand.as_deref(), &filter.brands) {
        return false;
    }

    if filter.min_price.is_some_and(|min| product.price < min) {
        return false;
    }
    if filter.max_price.is_some_and(|max| product.price > max) {
        return false;
    }

    needle.is_none_or(|needle| {
        [
            Some(product.name.as_str()),
            Some(product.description.as_str()),
            product.brand.as_deref(),
            product.category.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
    })
}

fn in_set(value: Option<&str>, set: &[String]) -> bool {
    value.is_some_and(|v| set.iter().any(|s| s == v))
}

fn contains_ignore_case(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

fn sort(products: &mut [&Product], key: SortKey) {
    match key {
        SortKey::Featured => {}
        SortKey::PriceAsc => products.sort_by(|a, b| a.price.cmp(&b.price)),
        SortKey::PriceDesc => products.sort_by(|a, b| b.price.cmp(&a.price)),
        SortKey::NameAsc => products.sort_by(|a, b| compare_names(&a.name, &b.name)),
        SortKey::NameDesc => products.sort_by(|a, b| compare_names(&b.name, &a.name)),
    }
}

/// Case-insensitive comparison, falling back to exact comparison so that
/// names differing only in case still have a deterministic order.
///
/// Not locale-aware: lowercased names compare by code point, so accented
/// initials ("Éclair") sort after every unaccented ASCII name.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::catalog::tests::product;
    use cc_automotive_core::CompatibilityFilter;

    fn numbered(n: usize) -> Vec<Product> {
        (1..=n)
            .map(|i| product(&format!("p{i}"), &format!("Part {i:02}"), i64::try_from(i).unwrap()))
            .collect()
    }

    fn ids(result: &QueryResult) -> Vec<&str> {
        result.items.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_no_constraints_returns_everything_in_order() {
        let catalog = numbered(7);
        let result = query(&catalog, &ProductFilter::default());
        assert_eq!(result.total, 7);
        assert_eq!(result.items, catalog);
    }

    #[test]
    fn test_price_bounds() {
        let catalog = numbered(10);
        let filter = ProductFilter {
            min_price: Some(Decimal::from(3)),
            max_price: Some(Decimal::from(6)),
            ..ProductFilter::default()
        };
        let result = query(&catalog, &filter);
        assert_eq!(result.total, 4);
        assert!(result.items.iter().all(|p| p.price >= Decimal::from(3) && p.price <= Decimal::from(6)));

        let inverted = ProductFilter {
            min_price: Some(Decimal::from(8)),
            max_price: Some(Decimal::from(2)),
            ..ProductFilter::default()
        };
        let result = query(&catalog, &inverted);
        assert_eq!(result.total, 0);
        assert!(result.items.is_empty());
    }

    #[test]
    fn test_pagination_windows() {
        let catalog = numbered(25);
        let page = |page, limit| ProductFilter {
            page: Some(page),
            limit: Some(limit),
            ..ProductFilter::default()
        };

        let second = query(&catalog, &page(2, 10));
        assert_eq!(second.total, 25);
        assert_eq!(second.items.first().unwrap().id, "p11");
        assert_eq!(second.items.last().unwrap().id, "p20");

        let third = query(&catalog, &page(3, 10));
        assert_eq!(ids(&third), vec!["p21", "p22", "p23", "p24", "p25"]);

        assert!(query(&catalog, &page(4, 10)).items.is_empty());
        assert!(query(&catalog, &page(0, 10)).items.is_empty());
        assert!(query(&catalog, &page(1, 0)).items.is_empty());
        assert!(query(&catalog, &page(u32::MAX, u32::MAX)).items.is_empty());
    }

    #[test]
    fn test_page_without_limit_is_ignored() {
        let catalog = numbered(5);
        let filter = ProductFilter {
            page: Some(2),
            ..ProductFilter::default()
        };
        assert_eq!(query(&catalog, &filter).items.len(), 5);
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let mut by_name = product("a", "Ceramic BRAKE Pad", 10);
        by_name.category = Some("pads".to_owned());
        let mut by_description = product("b", "Rotor", 20);
        by_description.description = "Pairs well with brake pads".to_owned();
        let mut by_brand = product("c", "Caliper", 30);
        by_brand.brand = Some("BrakeMaster".to_owned());
        let mut by_category = product("d", "Line", 40);
        by_category.category = Some("Brakes".to_owned());
        let unrelated = product("e", "Air Filter", 50);

        let catalog = vec![by_name, by_description, by_brand, by_category, unrelated];
        let filter = ProductFilter {
            search: Some("brake".to_owned()),
            ..ProductFilter::default()
        };
        let result = query(&catalog, &filter);
        assert_eq!(ids(&result), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_compatibility_matching() {
        let mut corolla = product("a", "Filter", 10);
        corolla.make = Some("Toyota".to_owned());
        corolla.model = Some("Corolla".to_owned());
        corolla.year = Some("2020".to_owned());
        let mut vague_year = product("b", "Filter", 10);
        vague_year.make = Some("Toyota".to_owned());
        vague_year.year = Some("2020 model".to_owned());
        let no_fitment = product("c", "Filter", 10);
        let catalog = vec![corolla, vague_year, no_fitment];

        let by_make = ProductFilter {
            compatibility: CompatibilityFilter {
                make: Some("Toy".to_owned()),
                ..CompatibilityFilter::default()
            },
            ..ProductFilter::default()
        };
        assert_eq!(ids(&query(&catalog, &by_make)), vec!["a", "b"]);

        let by_year = ProductFilter {
            compatibility: CompatibilityFilter {
                year: Some("2020".to_owned()),
                ..CompatibilityFilter::default()
            },
            ..ProductFilter::default()
        };
        assert_eq!(ids(&query(&catalog, &by_year)), vec!["a"]);

        let by_model = ProductFilter {
            compatibility: CompatibilityFilter {
                model: Some("coROLLA".to_owned()),
                ..CompatibilityFilter::default()
            },
            ..ProductFilter::default()
        };
        assert_eq!(ids(&query(&catalog, &by_model)), vec!["a"]);
    }

    #[test]
    fn test_set_filters_exclude_missing_fields() {
        let mut denso = product("a", "Plug", 5);
        denso.supplier = Some("Denso".to_owned());
        denso.brand = Some("Denso".to_owned());
        denso.category = Some("ignition".to_owned());
        let mut bosch = product("b", "Plug", 6);
        bosch.supplier = Some("Bosch".to_owned());
        bosch.category = Some("ignition".to_owned());
        let bare = product("c", "Plug", 7);
        let catalog = vec![denso, bosch, bare];

        let suppliers = ProductFilter {
            suppliers: vec!["Denso".to_owned(), "Bosch".to_owned()],
            ..ProductFilter::default()
        };
        assert_eq!(ids(&query(&catalog, &suppliers)), vec!["a", "b"]);

        let brands = ProductFilter {
            brands: vec!["Denso".to_owned()],
            ..ProductFilter::default()
        };
        assert_eq!(ids(&query(&catalog, &brands)), vec!["a"]);

        let categories = ProductFilter {
            categories: vec!["ignition".to_owned()],
            ..ProductFilter::default()
        };
        assert_eq!(query(&catalog, &categories).total, 2);
    }

    #[test]
    fn test_name_sort_orders_by_lowercased_code_point() {
        let catalog = vec![
            product("e", "Éclair Clamp", 5),
            product("z", "Zed Bracket", 5),
            product("b", "bolt", 5),
            product("B", "Bolt", 5),
        ];
        let filter = ProductFilter {
            sort: SortKey::NameAsc,
            ..ProductFilter::default()
        };

        assert_eq!(ids(&query(&catalog, &filter)), vec!["B", "b", "z", "e"]);
    }

    #[test]
    fn test_sorting_is_stable_and_idempotent() {
        let catalog = vec![
            product("a", "beta", 20),
            product("b", "Alpha", 10),
            product("c", "alpha", 20),
            product("d", "Gamma", 10),
        ];

        for key in [
            SortKey::PriceAsc,
            SortKey::PriceDesc,
            SortKey::NameAsc,
            SortKey::NameDesc,
        ] {
            let filter = ProductFilter {
                sort: key,
                ..ProductFilter::default()
            };
            let once = query(&catalog, &filter);
            let twice = query(&once.items, &filter);
            assert_eq!(once.items, twice.items, "{key} not idempotent");
        }

        let price_asc = ProductFilter {
            sort: SortKey::PriceAsc,
            ..ProductFilter::default()
        };
        assert_eq!(ids(&query(&catalog, &price_asc)), vec!["b", "d", "a", "c"]);

        let price_desc = ProductFilter {
            sort: SortKey::PriceDesc,
            ..ProductFilter::default()
        };
        assert_eq!(ids(&query(&catalog, &price_desc)), vec!["a", "c", "b", "d"]);

        let name_asc = ProductFilter {
            sort: SortKey::NameAsc,
            ..ProductFilter::default()
        };
        assert_eq!(ids(&query(&catalog, &name_asc)), vec!["b", "c", "a", "d"]);

        let name_desc = ProductFilter {
            sort: SortKey::NameDesc,
            ..ProductFilter::default()
        };
        assert_eq!(ids(&query(&catalog, &name_desc)), vec!["d", "a", "c", "b"]);
    }

    #[test]
    fn test_total_counts_before_pagination() {
        let catalog = numbered(12);
        let filter = ProductFilter {
            search: Some("part 1".to_owned()),
            page: Some(1),
            limit: Some(2),
            ..ProductFilter::default()
        };
        let result = query(&catalog, &filter);
        assert_eq!(result.total, 3);
        assert_eq!(ids(&result), vec!["p10", "p11"]);
    }
}
