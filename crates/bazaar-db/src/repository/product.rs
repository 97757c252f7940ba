//! # Product Repository
//!
//! Database operations for the seller catalog.
//!
//! ## Key Operations
//! - Insert and fetch listings
//! - Enumerated seller edits (`ProductUpdate`), sell price re-derived in core
//! - Soft deactivation (products are never deleted; orders reference them)
//! - Filtered, sorted seller listings
//!
//! ## Edit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How a Seller Edit Is Applied                         │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    UPDATE products SET updated_at = ? WHERE id = ?   ← write lock      │
//! │       │                                              (0 rows → 404)    │
//! │       ▼                                                                 │
//! │    SELECT * FROM products WHERE id = ?                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │    Product::apply(update)   ← validation + sell price in bazaar-core   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │    UPDATE products SET name, cost_price, sell_price, ...               │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  Checkouts decrementing stock wait on the same lock, so an edit never  │
//! │  overwrites a concurrent sale with a stale quantity.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bazaar_core::validation::validate_search_query;
use bazaar_core::{CoreError, Product, ProductStatus, ProductUpdate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

// =============================================================================
// Listing Filter
// =============================================================================

/// Sort order for seller product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    NameAsc,
    PriceAsc,
    PriceDesc,
    StockAsc,
}

impl ProductSort {
    const fn order_by(&self) -> &'static str {
        match self {
            ProductSort::Newest => "created_at DESC, rowid DESC",
            ProductSort::NameAsc => "name COLLATE NOCASE ASC, rowid ASC",
            ProductSort::PriceAsc => "sell_price ASC, rowid ASC",
            ProductSort::PriceDesc => "sell_price DESC, rowid ASC",
            ProductSort::StockAsc => "quantity ASC, rowid ASC",
        }
    }
}

/// Seller listing filter. All fields optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    pub status: Option<ProductStatus>,
    /// Case-insensitive match on name or SKU.
    pub search: Option<String>,
    #[serde(default)]
    pub sort: ProductSort,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let product = repo.insert(&product).await?;
/// let listing = repo.list_by_seller("seller-1", &ProductFilter::default()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The inserted product
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, seller_id = %product.seller_id, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, seller_id, name, description, sku,
                cost_price, tax_rate, sell_price, quantity,
                status, rating, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9,
                ?10, ?11, ?12, ?13
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.seller_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.sku)
        .bind(product.cost_price)
        .bind(product.tax_rate)
        .bind(product.sell_price)
        .bind(product.quantity)
        .bind(product.status)
        .bind(product.rating)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => {
                DbError::duplicate(field, product.sku.clone().unwrap_or_default())
            }
            other => other,
        })?;

        Ok(product.clone())
    }

    /// Applies an enumerated seller edit and returns the stored product.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    /// * `Err(DbError::Rejected)` - The edit failed validation; nothing written
    pub async fn update(
        &self,
        id: &str,
        update: &ProductUpdate,
        now: DateTime<Utc>,
    ) -> DbResult<Product> {
        debug!(id = %id, "Updating product");

        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query("UPDATE products SET updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        if locked.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        let mut product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        product.apply(update, now)?;

        sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3,
                cost_price = ?4,
                tax_rate = ?5,
                sell_price = ?6,
                quantity = ?7,
                status = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.cost_price)
        .bind(product.tax_rate)
        .bind(product.sell_price)
        .bind(product.quantity)
        .bind(product.status)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(product)
    }

    /// Soft-deletes a product by marking it inactive.
    ///
    /// Orders keep referencing the row; new orders are refused.
    pub async fn deactivate(&self, id: &str, now: DateTime<Utc>) -> DbResult<()> {
        debug!(id = %id, "Deactivating product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET status = 'inactive', updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Lists a seller's products.
    pub async fn list_by_seller(
        &self,
        seller_id: &str,
        filter: &ProductFilter,
    ) -> DbResult<Vec<Product>> {
        let pattern = match &filter.search {
            Some(query) => {
                let query = validate_search_query(query).map_err(CoreError::from)?;
                (!query.is_empty()).then(|| format!("%{}%", query))
            }
            None => None,
        };

        debug!(seller_id = %seller_id, search = ?pattern, "Listing seller products");

        let sql = format!(
            r#"
            SELECT * FROM products
            WHERE seller_id = ?1
            AND (?2 IS NULL OR status = ?2)
            AND (?3 IS NULL OR name LIKE ?3 OR sku LIKE ?3)
            ORDER BY {}
            "#,
            filter.sort.order_by()
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(seller_id)
            .bind(filter.status)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Counts a seller's listings, active or not.
    pub async fn count_by_seller(&self, seller_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE seller_id = ?1")
            .bind(seller_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
