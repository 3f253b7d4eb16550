//! # Stock Ledger
//!
//! Append-only log of signed stock movements. Current stock is always
//! derived, never cached.
//!
//! ## Ledger Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Append-Only Stock Ledger                            │
//! │                                                                         │
//! │  record_addition(A, 100, "purchase", "PO-1")                           │
//! │       │   insert { quantity: +100, kind: in }                          │
//! │       ▼                                                                 │
//! │  record_removal(A, 5, "Sale: SALE-...", sale_ref)                      │
//! │       │   insert { quantity: -5, kind: out }                           │
//! │       ▼                                                                 │
//! │  current_stock(A) = SUM(quantity) = 95                                 │
//! │                                                                         │
//! │  Entries are never updated or deleted. Corrections are compensating    │
//! │  entries (a cancelled sale appends a matching addition).               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Atomicity
//! A removal is "read the sum, compare, append" - two queries that must not
//! interleave with a concurrent removal for the same product. Both write
//! paths run under a `BEGIN IMMEDIATE` transaction so the check and the
//! append are a single atomic unit.
//!
//! The `*_in_tx` functions are the real implementations; the
//! [`SaleCoordinator`](crate::repository::sale::SaleCoordinator) calls them
//! on its own transaction so a multi-line sale commits or rolls back as one.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::repository::ImmediateTx;
use stockpile_core::report::{
    stock_status_counts, ReportRange, StockStatusCounts, LOW_STOCK_THRESHOLD,
};
use stockpile_core::validation::validate_reason;
use stockpile_core::{CoreError, MovementKind, StockMovement};

/// Append-only stock ledger service.
#[derive(Debug, Clone)]
pub struct StockLedger {
    pool: SqlitePool,
}

impl StockLedger {
    /// Creates a new StockLedger.
    pub fn new(pool: SqlitePool) -> Self {
        StockLedger { pool }
    }

    /// Records a stock addition (purchase, correction, restitution).
    ///
    /// ## Arguments
    /// * `quantity` - Magnitude, must be positive; the ledger stores `+quantity`
    /// * `reason` - Free-text audit reason, e.g. "purchase"
    /// * `reference` - Optional external reference, e.g. a purchase order id
    pub async fn record_addition(
        &self,
        product_id: &str,
        quantity: i64,
        reason: &str,
        reference: Option<&str>,
    ) -> StoreResult<StockMovement> {
        let mut tx = ImmediateTx::begin(&self.pool).await?;
        let result = record_addition_in_tx(tx.conn(), product_id, quantity, reason, reference).await;
        match result {
            Ok(movement) => {
                tx.commit().await?;
                Ok(movement)
            }
            Err(err) => {
                tx.rollback().await;
                Err(err)
            }
        }
    }

    /// Records a stock removal (sale, shrinkage, correction).
    ///
    /// Fails with `InsufficientStock` when `quantity` exceeds the derived
    /// current stock; the ledger is left untouched in that case.
    pub async fn record_removal(
        &self,
        product_id: &str,
        quantity: i64,
        reason: &str,
        reference: Option<&str>,
    ) -> StoreResult<StockMovement> {
        let mut tx = ImmediateTx::begin(&self.pool).await?;
        let result = record_removal_in_tx(tx.conn(), product_id, quantity, reason, reference).await;
        match result {
            Ok(movement) => {
                tx.commit().await?;
                Ok(movement)
            }
            Err(err) => {
                tx.rollback().await;
                Err(err)
            }
        }
    }

    /// Derived current stock: the sum of all movements for the product.
    ///
    /// A product with no movements (or an unknown id) sums to 0.
    pub async fn current_stock(&self, product_id: &str) -> StoreResult<i64> {
        let stock: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM stock_movements WHERE product_id = ?1",
        )
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(stock)
    }

    /// Movement history for a product, oldest first, optionally limited
    /// to a date window.
    pub async fn history(
        &self,
        product_id: &str,
        range: Option<ReportRange>,
    ) -> StoreResult<Vec<StockMovement>> {
        let (start, end) = match range {
            Some(r) => (Some(r.start), Some(r.end)),
            None => (None, None),
        };

        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, product_id, quantity, kind, reason, reference, created_at
            FROM stock_movements
            WHERE product_id = ?1
              AND (?2 IS NULL OR created_at >= ?2)
              AND (?3 IS NULL OR created_at <= ?3)
            ORDER BY created_at, id
            "#,
        )
        .bind(product_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Current stock per product, for every catalog product (products
    /// without movements appear with 0).
    pub async fn stock_levels(&self) -> StoreResult<Vec<(String, i64)>> {
        let levels = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT p.id, COALESCE(SUM(m.quantity), 0)
            FROM products p
            LEFT JOIN stock_movements m ON m.product_id = p.id
            GROUP BY p.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(levels)
    }

    /// Counts of products by stock level (in / low / out), using the
    /// standard low-stock threshold.
    pub async fn stock_status(&self) -> StoreResult<StockStatusCounts> {
        self.stock_status_with(LOW_STOCK_THRESHOLD).await
    }

    /// Same as [`stock_status`](Self::stock_status) with a caller-supplied
    /// threshold.
    pub async fn stock_status_with(&self, threshold: i64) -> StoreResult<StockStatusCounts> {
        let levels = self.stock_levels().await?;
        Ok(stock_status_counts(
            levels.into_iter().map(|(_, stock)| stock),
            threshold,
        ))
    }
}

// =============================================================================
// In-Transaction Operations
// =============================================================================
// Shared by the ledger's own write paths and the sale coordinator, which
// folds these into its sale transaction.

/// Resolves a product's SKU, failing with `ProductNotFound`.
pub(crate) async fn product_sku(
    conn: &mut SqliteConnection,
    product_id: &str,
) -> StoreResult<String> {
    let sku: Option<String> = sqlx::query_scalar("SELECT sku FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

    sku.ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()).into())
}

/// Derived current stock, read inside the caller's transaction.
pub(crate) async fn current_stock_in_tx(
    conn: &mut SqliteConnection,
    product_id: &str,
) -> StoreResult<i64> {
    let stock: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(quantity), 0) FROM stock_movements WHERE product_id = ?1",
    )
    .bind(product_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(stock)
}

/// Appends a positive movement inside the caller's transaction.
pub(crate) async fn record_addition_in_tx(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
    reason: &str,
    reference: Option<&str>,
) -> StoreResult<StockMovement> {
    if quantity <= 0 {
        return Err(CoreError::InvalidQuantity { quantity }.into());
    }
    validate_reason(reason)?;
    product_sku(conn, product_id).await?;

    let movement = build_movement(product_id, quantity, MovementKind::In, reason, reference);
    debug!(product_id = %product_id, quantity = quantity, "Recording stock addition");
    insert_movement(conn, &movement).await?;

    Ok(movement)
}

/// Checks availability and appends a negative movement inside the caller's
/// transaction. The caller holds the write lock (BEGIN IMMEDIATE), so the
/// check cannot interleave with another removal.
pub(crate) async fn record_removal_in_tx(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
    reason: &str,
    reference: Option<&str>,
) -> StoreResult<StockMovement> {
    if quantity <= 0 {
        return Err(CoreError::InvalidQuantity { quantity }.into());
    }
    validate_reason(reason)?;
    let sku = product_sku(conn, product_id).await?;

    let available = current_stock_in_tx(conn, product_id).await?;
    if available < quantity {
        return Err(CoreError::InsufficientStock {
            sku,
            available,
            requested: quantity,
        }
        .into());
    }

    let movement = build_movement(product_id, -quantity, MovementKind::Out, reason, reference);
    debug!(product_id = %product_id, quantity = quantity, "Recording stock removal");
    insert_movement(conn, &movement).await?;

    Ok(movement)
}

fn build_movement(
    product_id: &str,
    quantity: i64,
    kind: MovementKind,
    reason: &str,
    reference: Option<&str>,
) -> StockMovement {
    StockMovement {
        id: Uuid::new_v4().to_string(),
        product_id: product_id.to_string(),
        quantity,
        kind,
        reason: reason.trim().to_string(),
        reference: reference.map(str::to_string),
        created_at: Utc::now(),
    }
}

async fn insert_movement(
    conn: &mut SqliteConnection,
    movement: &StockMovement,
) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id, product_id, quantity, kind, reason, reference, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.product_id)
    .bind(movement.quantity)
    .bind(movement.kind)
    .bind(&movement.reason)
    .bind(&movement.reference)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::pool::{Database, DbConfig};
    use stockpile_core::NewProduct;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_product(db: &Database) -> String {
        db.products()
            .create(NewProduct {
                sku: "WIDGET-01".to_string(),
                name: "Blue Widget".to_string(),
                cost_price_cents: Some(1000),
                selling_price_cents: Some(2500),
                category_id: None,
                supplier_id: None,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_addition_then_removal() {
        let db = test_db().await;
        let product_id = seed_product(&db).await;
        let ledger = db.ledger();

        ledger
            .record_addition(&product_id, 100, "purchase", Some("PO-1"))
            .await
            .unwrap();
        assert_eq!(ledger.current_stock(&product_id).await.unwrap(), 100);

        ledger
            .record_removal(&product_id, 5, "shrinkage", None)
            .await
            .unwrap();
        assert_eq!(ledger.current_stock(&product_id).await.unwrap(), 95);

        let history = ledger.history(&product_id, None).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].quantity, 100);
        assert_eq!(history[0].kind, MovementKind::In);
        assert_eq!(history[1].quantity, -5);
        assert_eq!(history[1].kind, MovementKind::Out);
    }

    #[tokio::test]
    async fn test_history_with_date_range() {
        let db = test_db().await;
        let product_id = seed_product(&db).await;
        let ledger = db.ledger();

        // The service always stamps "now", so backdate one movement directly
        let old_date = Utc::now() - chrono::Duration::days(10);
        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, product_id, quantity, kind, reason, reference, created_at
            ) VALUES (?1, ?2, 40, 'in', 'purchase', NULL, ?3)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&product_id)
        .bind(old_date)
        .execute(db.pool())
        .await
        .unwrap();

        ledger
            .record_addition(&product_id, 60, "purchase", None)
            .await
            .unwrap();

        // No range: both, oldest first
        let all = ledger.history(&product_id, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].quantity, 40);
        assert_eq!(all[1].quantity, 60);

        // Recent window excludes the backdated movement
        let recent = ledger
            .history(&product_id, Some(ReportRange::last_days(1)))
            .await
            .unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].quantity, 60);

        // A window around the backdated movement excludes today's
        let older = ledger
            .history(
                &product_id,
                Some(ReportRange::new(
                    Utc::now() - chrono::Duration::days(20),
                    Utc::now() - chrono::Duration::days(5),
                )),
            )
            .await
            .unwrap();
        assert_eq!(older.len(), 1);
        assert_eq!(older[0].quantity, 40);
    }

    #[tokio::test]
    async fn test_oversell_rejected_and_ledger_untouched() {
        let db = test_db().await;
        let product_id = seed_product(&db).await;
        let ledger = db.ledger();

        ledger
            .record_addition(&product_id, 100, "purchase", None)
            .await
            .unwrap();
        ledger
            .record_removal(&product_id, 5, "shrinkage", None)
            .await
            .unwrap();

        // 150 > 95 on hand
        let err = ledger
            .record_removal(&product_id, 150, "oversell attempt", None)
            .await
            .unwrap_err();
        match err {
            StoreError::Core(CoreError::InsufficientStock {
                sku,
                available,
                requested,
            }) => {
                assert_eq!(sku, "WIDGET-01");
                assert_eq!(available, 95);
                assert_eq!(requested, 150);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // Nothing was appended
        assert_eq!(ledger.current_stock(&product_id).await.unwrap(), 95);
        assert_eq!(ledger.history(&product_id, None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_non_positive_quantities_rejected() {
        let db = test_db().await;
        let product_id = seed_product(&db).await;
        let ledger = db.ledger();

        for qty in [0, -5] {
            let err = ledger
                .record_addition(&product_id, qty, "purchase", None)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                StoreError::Core(CoreError::InvalidQuantity { .. })
            ));

            let err = ledger
                .record_removal(&product_id, qty, "shrinkage", None)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                StoreError::Core(CoreError::InvalidQuantity { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let db = test_db().await;
        let ledger = db.ledger();

        let err = ledger
            .record_addition("no-such-id", 10, "purchase", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Core(CoreError::ProductNotFound(_))
        ));

        // Reads stay total: unknown product just sums to zero
        assert_eq!(ledger.current_stock("no-such-id").await.unwrap(), 0);
        assert!(ledger
            .history("no-such-id", None)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_empty_reason_rejected() {
        let db = test_db().await;
        let product_id = seed_product(&db).await;

        let err = db
            .ledger()
            .record_addition(&product_id, 10, "   ", None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_stock_status_counts() {
        let db = test_db().await;
        let products = db.products();
        let ledger = db.ledger();

        let mut ids = Vec::new();
        for (i, stock) in [15i64, 5, 0].iter().enumerate() {
            let id = products
                .create(NewProduct {
                    sku: format!("SKU-{i}"),
                    name: format!("Product {i}"),
                    cost_price_cents: Some(100),
                    selling_price_cents: Some(200),
                    category_id: None,
                    supplier_id: None,
                })
                .await
                .unwrap()
                .id;
            if *stock > 0 {
                ledger
                    .record_addition(&id, *stock, "purchase", None)
                    .await
                    .unwrap();
            }
            ids.push(id);
        }

        let status = ledger.stock_status().await.unwrap();
        assert_eq!(status.in_stock, 1);
        assert_eq!(status.low_stock, 1);
        assert_eq!(status.out_of_stock, 1);
    }
}
