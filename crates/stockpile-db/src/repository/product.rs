//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Key Operations
//! - CRUD on products (dual-key: UUID id + unique SKU)
//! - Prefix search over SKU and name
//!
//! Current stock is never stored on a product row; ask the
//! [`StockLedger`](crate::repository::ledger::StockLedger) instead.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, StoreError, StoreResult};
use stockpile_core::validation::{validate_product_name, validate_sku};
use stockpile_core::{NewProduct, Product};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let product = repo.create(NewProduct {
///     sku: "WIDGET-01".into(),
///     name: "Blue Widget".into(),
///     cost_price_cents: Some(1000),
///     selling_price_cents: Some(2500),
///     category_id: None,
///     supplier_id: None,
/// }).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Creates a product.
    ///
    /// SKU uniqueness is enforced by the database; a collision comes back
    /// as `DbError::UniqueViolation`.
    pub async fn create(&self, input: NewProduct) -> StoreResult<Product> {
        validate_sku(&input.sku)?;
        validate_product_name(&input.name)?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            sku: input.sku.trim().to_string(),
            name: input.name.trim().to_string(),
            cost_price_cents: input.cost_price_cents,
            selling_price_cents: input.selling_price_cents,
            category_id: input.category_id,
            supplier_id: input.supplier_id,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, sku = %product.sku, "Creating product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name,
                cost_price_cents, selling_price_cents,
                category_id, supplier_id,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.cost_price_cents)
        .bind(product.selling_price_cents)
        .bind(&product.category_id)
        .bind(&product.supplier_id)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, name,
                   cost_price_cents, selling_price_cents,
                   category_id, supplier_id,
                   created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by SKU.
    pub async fn get_by_sku(&self, sku: &str) -> StoreResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, name,
                   cost_price_cents, selling_price_cents,
                   category_id, supplier_id,
                   created_at, updated_at
            FROM products
            WHERE sku = ?1
            "#,
        )
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists all products, ordered by name.
    pub async fn list(&self) -> StoreResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, name,
                   cost_price_cents, selling_price_cents,
                   category_id, supplier_id,
                   created_at, updated_at
            FROM products
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Prefix search over SKU and name.
    pub async fn search(&self, query: &str, limit: u32) -> StoreResult<Vec<Product>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching products");

        let pattern = format!("{}%", query);
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, name,
                   cost_price_cents, selling_price_cents,
                   category_id, supplier_id,
                   created_at, updated_at
            FROM products
            WHERE sku LIKE ?1 OR name LIKE ?1
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Updates a product's prices and classification. Identity fields
    /// (id, sku) are immutable.
    pub async fn update(&self, product: &Product) -> StoreResult<()> {
        let now = Utc::now();

        validate_product_name(&product.name)?;

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                cost_price_cents = ?3,
                selling_price_cents = ?4,
                category_id = ?5,
                supplier_id = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.cost_price_cents)
        .bind(product.selling_price_cents)
        .bind(&product.category_id)
        .bind(&product.supplier_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Db(DbError::not_found("Product", &product.id)));
        }

        Ok(())
    }

    /// Deletes a product.
    ///
    /// Ledger movements and sale items reference products with
    /// `ON DELETE RESTRICT`, so a product with history cannot be deleted;
    /// the attempt comes back as `DbError::ForeignKeyViolation`.
    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Db(DbError::not_found("Product", id)));
        }

        Ok(())
    }

    /// Total number of products in the catalog.
    pub async fn count(&self) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn widget() -> NewProduct {
        NewProduct {
            sku: "WIDGET-01".to_string(),
            name: "Blue Widget".to_string(),
            cost_price_cents: Some(1000),
            selling_price_cents: Some(2500),
            category_id: None,
            supplier_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let db = test_db().await;
        let repo = db.products();

        let created = repo.create(widget()).await.unwrap();

        let by_id = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(by_id.sku, "WIDGET-01");

        let by_sku = repo.get_by_sku("WIDGET-01").await.unwrap().unwrap();
        assert_eq!(by_sku.id, created.id);

        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = test_db().await;
        let repo = db.products();

        repo.create(widget()).await.unwrap();
        let err = repo.create(widget()).await.unwrap_err();

        assert!(matches!(
            err,
            StoreError::Db(DbError::UniqueViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_input_rejected() {
        let db = test_db().await;
        let repo = db.products();

        let mut bad_sku = widget();
        bad_sku.sku = "NOT A SKU!".to_string();
        assert!(matches!(
            repo.create(bad_sku).await.unwrap_err(),
            StoreError::Core(_)
        ));

        let mut empty_name = widget();
        empty_name.name = "  ".to_string();
        assert!(repo.create(empty_name).await.is_err());
    }

    #[tokio::test]
    async fn test_update_prices() {
        let db = test_db().await;
        let repo = db.products();

        let mut product = repo.create(widget()).await.unwrap();
        product.selling_price_cents = Some(2999);
        repo.update(&product).await.unwrap();

        let fetched = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(fetched.selling_price_cents, Some(2999));
    }

    #[tokio::test]
    async fn test_search_prefix() {
        let db = test_db().await;
        let repo = db.products();

        repo.create(widget()).await.unwrap();
        let mut other = widget();
        other.sku = "GADGET-01".to_string();
        other.name = "Green Gadget".to_string();
        repo.create(other).await.unwrap();

        let results = repo.search("WID", 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].sku, "WIDGET-01");
    }

    #[tokio::test]
    async fn test_delete_missing_product() {
        let db = test_db().await;
        let err = db.products().delete("no-such-id").await.unwrap_err();
        assert!(matches!(err, StoreError::Db(DbError::NotFound { .. })));
    }
}
