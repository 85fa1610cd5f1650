//! Seller-listed product repository.

use rust_decimal::Decimal;
use sqlx::PgPool;

use cc_automotive_core::{Product, UserId};

use super::RepositoryError;

const PRODUCT_COLUMNS: &str = "id, seller_id, name, description, price, original_price, image, \
     images, category, brand, stock, sku, make, model, year, industry, oem_number, supplier";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    seller_id: UserId,
    name: String,
    description: String,
    price: Decimal,
    original_price: Option<Decimal>,
    image: String,
    images: Vec<String>,
    category: Option<String>,
    brand: Option<String>,
    stock: i32,
    sku: String,
    make: Option<String>,
    model: Option<String>,
    year: Option<String>,
    industry: Option<String>,
    oem_number: Option<String>,
    supplier: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
            price: r.price,
            original_price: r.original_price,
            image: r.image,
            images: r.images,
            category: r.category,
            brand: r.brand,
            stock: r.stock,
            sku: r.sku,
            seller_id: Some(r.seller_id),
            make: r.make,
            model: r.model,
            year: r.year,
            industry: r.industry,
            oem_number: r.oem_number,
            supplier: r.supplier,
        }
    }
}

/// Repository for products created through the seller back office.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All seller-listed products, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Persist a product. `product.seller_id` must be set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the product has no seller.
    /// Returns `RepositoryError::Conflict` if the product ID is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, product: &Product) -> Result<Product, RepositoryError> {
        let seller_id = product.seller_id.ok_or_else(|| {
            RepositoryError::DataCorruption("seller product without seller_id".to_owned())
        })?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO storefront.product (
                id, seller_id, name, description, price, original_price, image, images,
                category, brand, stock, sku, make, model, year, industry, oem_number, supplier
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&product.id)
        .bind(seller_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.original_price)
        .bind(&product.image)
        .bind(&product.images)
        .bind(&product.category)
        .bind(&product.brand)
        .bind(product.stock)
        .bind(&product.sku)
        .bind(&product.make)
        .bind(&product.model)
        .bind(&product.year)
        .bind(&product.industry)
        .bind(&product.oem_number)
        .bind(&product.supplier)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "product id"))?;

        Ok(row.into())
    }
}
