//! # Directory Repository
//!
//! Categories, suppliers, and clients. Thin lookup tables: the ledger and
//! reports only need their ids for grouping and their names for labels.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreResult;
use stockpile_core::validation::validate_product_name;
use stockpile_core::{Category, Client, Supplier};

/// Repository for the category/supplier/client lookup tables.
#[derive(Debug, Clone)]
pub struct DirectoryRepository {
    pool: SqlitePool,
}

impl DirectoryRepository {
    /// Creates a new DirectoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DirectoryRepository { pool }
    }

    /// Creates a category.
    pub async fn create_category(&self, name: &str) -> StoreResult<Category> {
        validate_product_name(name)?;
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
        };

        debug!(id = %category.id, name = %category.name, "Creating category");

        sqlx::query("INSERT INTO categories (id, name) VALUES (?1, ?2)")
            .bind(&category.id)
            .bind(&category.name)
            .execute(&self.pool)
            .await?;

        Ok(category)
    }

    /// Lists all categories, ordered by name.
    pub async fn categories(&self) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Creates a supplier.
    pub async fn create_supplier(&self, name: &str) -> StoreResult<Supplier> {
        validate_product_name(name)?;
        let supplier = Supplier {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
        };

        debug!(id = %supplier.id, name = %supplier.name, "Creating supplier");

        sqlx::query("INSERT INTO suppliers (id, name) VALUES (?1, ?2)")
            .bind(&supplier.id)
            .bind(&supplier.name)
            .execute(&self.pool)
            .await?;

        Ok(supplier)
    }

    /// Lists all suppliers, ordered by name.
    pub async fn suppliers(&self) -> StoreResult<Vec<Supplier>> {
        let rows = sqlx::query_as::<_, Supplier>("SELECT id, name FROM suppliers ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Creates a client.
    pub async fn create_client(&self, name: &str) -> StoreResult<Client> {
        validate_product_name(name)?;
        let client = Client {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
        };

        debug!(id = %client.id, name = %client.name, "Creating client");

        sqlx::query("INSERT INTO clients (id, name) VALUES (?1, ?2)")
            .bind(&client.id)
            .bind(&client.name)
            .execute(&self.pool)
            .await?;

        Ok(client)
    }

    /// Lists all clients, ordered by name.
    pub async fn clients(&self) -> StoreResult<Vec<Client>> {
        let rows = sqlx::query_as::<_, Client>("SELECT id, name FROM clients ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_directory_roundtrip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let dir = db.directory();

        dir.create_category("Beverages").await.unwrap();
        dir.create_category("Snacks").await.unwrap();
        dir.create_supplier("Acme").await.unwrap();
        dir.create_client("Walk-in").await.unwrap();

        let categories = dir.categories().await.unwrap();
        assert_eq!(categories.len(), 2);
        // Ordered by name
        assert_eq!(categories[0].name, "Beverages");

        assert_eq!(dir.suppliers().await.unwrap().len(), 1);
        assert_eq!(dir.clients().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.directory().create_category("  ").await.is_err());
    }
}
