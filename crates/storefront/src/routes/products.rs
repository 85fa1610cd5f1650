//! Catalog route handlers.
//!
//! All handlers read from an in-memory snapshot of the catalog; the first
//! request after startup triggers the feed fetch.

use std::str::FromStr;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use cc_automotive_core::{CompatibilityFilter, PriceRange, Product, ProductFilter, SortKey};

use crate::catalog;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Response header carrying the number of matches before pagination.
pub const TOTAL_COUNT_HEADER: HeaderName = HeaderName::from_static("x-total-count");

/// Raw query string for `GET /api/products`.
///
/// Everything arrives as text so that malformed numbers produce a JSON 400
/// rather than the extractor's plain-text rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub categories: Option<String>,
    pub brands: Option<String>,
    pub suppliers: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<String>,
    pub search: Option<String>,
}

/// Treat absent and blank parameters alike.
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn list(value: Option<&str>) -> Vec<String> {
    present(value)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn parse<T: FromStr>(name: &str, value: Option<&str>) -> Result<Option<T>> {
    present(value)
        .map(|v| {
            v.parse()
                .map_err(|_| AppError::BadRequest(format!("Invalid {name}: {v}")))
        })
        .transpose()
}

impl TryFrom<ProductQuery> for ProductFilter {
    type Error = AppError;

    fn try_from(query: ProductQuery) -> Result<Self> {
        let sort = present(query.sort.as_deref())
            .map(SortKey::from_str)
            .transpose()
            .map_err(|e| AppError::BadRequest(e.to_string()))?
            .unwrap_or_default();

        Ok(Self {
            categories: list(query.categories.as_deref()),
            brands: list(query.brands.as_deref()),
            suppliers: list(query.suppliers.as_deref()),
            min_price: parse("minPrice", query.min_price.as_deref())?,
            max_price: parse("maxPrice", query.max_price.as_deref())?,
            compatibility: CompatibilityFilter {
                make: present(query.make.as_deref()).map(String::from),
                model: present(query.model.as_deref()).map(String::from),
                year: present(query.year.as_deref()).map(String::from),
            },
            search: present(query.search.as_deref()).map(String::from),
            sort,
            page: parse("page", query.page.as_deref())?,
            limit: parse("limit", query.limit.as_deref())?,
        })
    }
}

/// List products matching the query.
///
/// GET /api/products
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Response> {
    let filter = ProductFilter::try_from(query)?;
    let snapshot = state.catalog().ensure_loaded().await;
    let result = catalog::query(snapshot.iter(), &filter);

    let total = HeaderValue::from(result.total);
    Ok(([(TOTAL_COUNT_HEADER, total)], Json(result.items)).into_response())
}

/// Get a single product.
///
/// GET /api/products/{id}
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Product>> {
    state
        .catalog()
        .get(&id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
}

/// Distinct categories, sorted.
///
/// GET /api/categories
pub async fn categories(State(state): State<AppState>) -> Json<Vec<String>> {
    let snapshot = state.catalog().ensure_loaded().await;
    Json(catalog::categories(snapshot.iter()))
}

/// Distinct brands, sorted.
///
/// GET /api/brands
pub async fn brands(State(state): State<AppState>) -> Json<Vec<String>> {
    let snapshot = state.catalog().ensure_loaded().await;
    Json(catalog::brands(snapshot.iter()))
}

/// Lowest and highest price in the catalog, `{0, 0}` when it is empty.
///
/// GET /api/price-range
pub async fn price_range(State(state): State<AppState>) -> Json<PriceRange> {
    let snapshot = state.catalog().ensure_loaded().await;
    Json(catalog::price_range(snapshot.iter()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use rust_decimal::Decimal;

    use super::*;
    use crate::catalog::tests::product;
    use crate::routes::tests::{body_json, send, state_with};
    use crate::routes::routes;
    use crate::services::auth::MockTokenVerifier;

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn app() -> axum::Router {
        let mut rotor = product("p1", "Rotor", 80);
        rotor.category = Some("brakes".to_string());
        rotor.brand = Some("Brembo".to_string());
        rotor.make = Some("Toyota".to_string());

        let mut pads = product("p2", "Brake Pad", 30);
        pads.category = Some("brakes".to_string());
        pads.brand = Some("Akebono".to_string());

        let mut filter = product("p3", "Oil Filter", 12);
        filter.category = Some("engine".to_string());
        filter.brand = Some("Bosch".to_string());

        let state = state_with(vec![rotor, pads, filter], MockTokenVerifier::new(), None).await;
        routes().with_state(state)
    }

    #[test]
    fn test_query_parsing() {
        let filter = ProductFilter::try_from(ProductQuery {
            categories: Some("brakes, engine,,".to_string()),
            min_price: Some("10.5".to_string()),
            max_price: Some(String::new()),
            sort: Some("price-desc".to_string()),
            page: Some("2".to_string()),
            limit: Some("10".to_string()),
            make: Some("  ".to_string()),
            year: Some("2020".to_string()),
            ..ProductQuery::default()
        })
        .unwrap();

        assert_eq!(filter.categories, vec!["brakes", "engine"]);
        assert_eq!(filter.min_price, Some(Decimal::new(105, 1)));
        assert_eq!(filter.max_price, None);
        assert_eq!(filter.sort, SortKey::PriceDesc);
        assert_eq!(filter.page, Some(2));
        assert_eq!(filter.limit, Some(10));
        assert_eq!(filter.compatibility.make, None);
        assert_eq!(filter.compatibility.year.as_deref(), Some("2020"));
    }

    #[test]
    fn test_query_parsing_rejects_bad_values() {
        for query in [
            ProductQuery {
                min_price: Some("cheap".to_string()),
                ..ProductQuery::default()
            },
            ProductQuery {
                page: Some("-1".to_string()),
                ..ProductQuery::default()
            },
            ProductQuery {
                sort: Some("random".to_string()),
                ..ProductQuery::default()
            },
        ] {
            let err = ProductFilter::try_from(query).unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)));
        }
    }

    #[tokio::test]
    async fn test_index_filters_and_sets_total() {
        let (status, response) = send(
            app().await,
            get("/api/products?categories=brakes&sort=price-asc&page=1&limit=1"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(response.headers()[TOTAL_COUNT_HEADER], "2");
        let body = body_json(response).await;
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], "p2");
    }

    #[tokio::test]
    async fn test_index_compatibility_substring() {
        let (_, response) = send(app().await, get("/api/products?make=toy")).await;
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["id"], "p1");
    }

    #[tokio::test]
    async fn test_index_bad_number_is_400() {
        let (status, response) = send(app().await, get("/api/products?maxPrice=lots")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["message"], "Invalid maxPrice: lots");
    }

    #[tokio::test]
    async fn test_show() {
        let app = app().await;

        let (status, response) = send(app.clone(), get("/api/products/p3")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body_json(response).await["name"], "Oil Filter");

        let (status, response) = send(app, get("/api/products/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["message"], "Product not found");
    }

    #[tokio::test]
    async fn test_facets() {
        let app = app().await;

        let (_, response) = send(app.clone(), get("/api/categories")).await;
        assert_eq!(body_json(response).await, serde_json::json!(["brakes", "engine"]));

        let (_, response) = send(app.clone(), get("/api/brands")).await;
        assert_eq!(
            body_json(response).await,
            serde_json::json!(["Akebono", "Bosch", "Brembo"])
        );

        let (_, response) = send(app, get("/api/price-range")).await;
        let range = body_json(response).await;
        assert_eq!(range["min"], 12.0);
        assert_eq!(range["max"], 80.0);
    }
}
