//! # Sale Transaction Coordinator
//!
//! Turns a proposed sale into a consistent Sale + set of StockMovements,
//! and manages status transitions without ever letting recorded stock
//! diverge from recorded sales.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │          create_sale(initial: PENDING)                                 │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │               ┌─────────┐  update_status(PAID)   ┌────────┐            │
//! │               │ PENDING │ ──────────────────────►│  PAID  │            │
//! │               └─────────┘   one removal per item └────────┘            │
//! │                    │        "Sale: <reference>"      │                 │
//! │                    │                                 │ one addition    │
//! │                    │ no ledger                       │ per item        │
//! │                    │ action                          │ "Sale           │
//! │                    ▼                                 ▼  cancelled: .." │
//! │               ┌────────────────────────────────────────┐               │
//! │               │             CANCELLED (terminal)       │               │
//! │               └────────────────────────────────────────┘               │
//! │                                                                         │
//! │  create_sale(initial: PAID) is the point-of-sale fast path: the        │
//! │  removals happen inside the same transaction as the insert.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Atomicity
//! Every write path runs under one `BEGIN IMMEDIATE` transaction. A
//! multi-item sale where the third item lacks stock rolls back the first
//! two removals along with the sale itself; no partial state survives.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::repository::ledger::{record_addition_in_tx, record_removal_in_tx};
use crate::repository::ImmediateTx;
use stockpile_core::report::ReportRange;
use stockpile_core::types::line_subtotal;
use stockpile_core::validation::validate_sale_reference;
use stockpile_core::{CoreError, Money, NewSale, Sale, SaleItem, SaleStatus};

/// Filter for listing sales. Empty filter = all sales, newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaleFilter {
    pub client_id: Option<String>,
    pub status: Option<SaleStatus>,
    pub range: Option<ReportRange>,
}

/// Sale lifecycle service.
#[derive(Debug, Clone)]
pub struct SaleCoordinator {
    pool: SqlitePool,
}

impl SaleCoordinator {
    /// Creates a new SaleCoordinator.
    pub fn new(pool: SqlitePool) -> Self {
        SaleCoordinator { pool }
    }

    /// Creates a sale from a proposal.
    ///
    /// ## What This Does
    /// 1. Validates the proposal (at least one item, positive quantities,
    ///    non-negative discounts within each line's gross)
    /// 2. Resolves or generates a unique reference
    /// 3. Resolves each product; omitted unit prices default to the
    ///    product's current selling price
    /// 4. Computes line subtotals and the sale total
    /// 5. If the initial status is PAID, records one ledger removal per
    ///    item ("Sale: <reference>")
    /// 6. Persists the sale and its items
    ///
    /// All of it in one transaction: an `InsufficientStock` on the last
    /// item leaves no trace of the sale or the earlier removals.
    pub async fn create_sale(&self, new: NewSale) -> StoreResult<Sale> {
        if new.items.is_empty() {
            return Err(stockpile_core::ValidationError::Required {
                field: "items".to_string(),
            }
            .into());
        }
        for item in &new.items {
            if item.quantity <= 0 {
                return Err(CoreError::InvalidQuantity {
                    quantity: item.quantity,
                }
                .into());
            }
            // A negative discount would inflate the line past its gross
            if item.discount_cents < 0 {
                return Err(stockpile_core::ValidationError::InvalidFormat {
                    field: "discount_cents".to_string(),
                    reason: "must not be negative".to_string(),
                }
                .into());
            }
        }
        // A sale born cancelled makes no sense; reject before touching storage
        if new.initial_status == SaleStatus::Cancelled {
            return Err(CoreError::InvalidTransition {
                from: "new".to_string(),
                to: SaleStatus::Cancelled.to_string(),
            }
            .into());
        }

        let mut tx = ImmediateTx::begin(&self.pool).await?;
        let result = create_sale_in_tx(tx.conn(), new).await;
        match result {
            Ok(sale) => {
                tx.commit().await?;
                Ok(sale)
            }
            Err(err) => {
                tx.rollback().await;
                Err(err)
            }
        }
    }

    /// Transitions a sale to a new status, driving the ledger side effects.
    ///
    /// - PENDING → PAID: one removal per item
    /// - PAID → CANCELLED: one compensating addition per item
    /// - PENDING → CANCELLED: no ledger action
    ///
    /// Anything else fails with `InvalidTransition` (a cancelled sale
    /// cannot be resurrected or re-cancelled).
    pub async fn update_status(&self, sale_id: &str, new_status: SaleStatus) -> StoreResult<Sale> {
        let mut tx = ImmediateTx::begin(&self.pool).await?;
        let result = update_status_in_tx(tx.conn(), sale_id, new_status).await;
        match result {
            Ok(sale) => {
                tx.commit().await?;
                Ok(sale)
            }
            Err(err) => {
                tx.rollback().await;
                Err(err)
            }
        }
    }

    /// Deletes a sale record entirely.
    ///
    /// Equivalent to cancelling first: a PAID sale has its stock restored
    /// before the record (and its items, by cascade) disappears.
    pub async fn delete_sale(&self, sale_id: &str) -> StoreResult<()> {
        let mut tx = ImmediateTx::begin(&self.pool).await?;
        let result = delete_sale_in_tx(tx.conn(), sale_id).await;
        match result {
            Ok(()) => {
                tx.commit().await?;
                Ok(())
            }
            Err(err) => {
                tx.rollback().await;
                Err(err)
            }
        }
    }

    /// Gets a sale with its items, failing with `SaleNotFound`.
    pub async fn get(&self, sale_id: &str) -> StoreResult<(Sale, Vec<SaleItem>)> {
        let sale = self
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;
        let items = self.get_items(sale_id).await?;
        Ok((sale, items))
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, client_id, reference, status, payment_method,
                   total_cents, notes, sale_date, created_at, updated_at
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets a sale by its business reference.
    pub async fn get_by_reference(&self, reference: &str) -> StoreResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, client_id, reference, status, payment_method,
                   total_cents, notes, sale_date, created_at, updated_at
            FROM sales
            WHERE reference = ?1
            "#,
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets all items for a sale, in insertion order.
    pub async fn get_items(&self, sale_id: &str) -> StoreResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, quantity,
                   unit_price_cents, discount_cents, subtotal_cents, created_at
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists sales matching the filter, newest first.
    pub async fn list(&self, filter: SaleFilter) -> StoreResult<Vec<Sale>> {
        let status = filter.status.map(|s| s.as_str());
        let (start, end) = match filter.range {
            Some(r) => (Some(r.start), Some(r.end)),
            None => (None, None),
        };

        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, client_id, reference, status, payment_method,
                   total_cents, notes, sale_date, created_at, updated_at
            FROM sales
            WHERE (?1 IS NULL OR client_id = ?1)
              AND (?2 IS NULL OR status = ?2)
              AND (?3 IS NULL OR sale_date >= ?3)
              AND (?4 IS NULL OR sale_date <= ?4)
            ORDER BY sale_date DESC, created_at DESC
            "#,
        )
        .bind(filter.client_id)
        .bind(status)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }
}

// =============================================================================
// In-Transaction Operations
// =============================================================================

async fn create_sale_in_tx(conn: &mut SqliteConnection, new: NewSale) -> StoreResult<Sale> {
    // Buyer is optional, but a supplied id must resolve
    if let Some(client_id) = &new.client_id {
        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM clients WHERE id = ?1")
            .bind(client_id)
            .fetch_optional(&mut *conn)
            .await?;
        if exists.is_none() {
            return Err(CoreError::ClientNotFound(client_id.clone()).into());
        }
    }

    let reference = resolve_reference(conn, new.reference.as_deref()).await?;
    let now = Utc::now();
    let sale_id = Uuid::new_v4().to_string();

    debug!(id = %sale_id, reference = %reference, status = %new.initial_status, "Creating sale");

    // Resolve products, freeze prices, compute subtotals
    let mut items: Vec<SaleItem> = Vec::with_capacity(new.items.len());
    let mut total = Money::zero();
    for line in &new.items {
        let selling_price: Option<Option<i64>> =
            sqlx::query_scalar("SELECT selling_price_cents FROM products WHERE id = ?1")
                .bind(&line.product_id)
                .fetch_optional(&mut *conn)
                .await?;
        let selling_price = match selling_price {
            Some(price) => price,
            None => return Err(CoreError::ProductNotFound(line.product_id.clone()).into()),
        };

        // No explicit price and no catalog price leaves nothing to charge
        let unit_price_cents = match line.unit_price_cents.or(selling_price) {
            Some(cents) => cents,
            None => {
                return Err(stockpile_core::ValidationError::Required {
                    field: "unit_price".to_string(),
                }
                .into())
            }
        };
        let unit_price = Money::from_cents(unit_price_cents);
        let discount = Money::from_cents(line.discount_cents);
        // A discount beyond the line gross would make the subtotal negative
        if discount > unit_price.multiply_quantity(line.quantity) {
            return Err(stockpile_core::ValidationError::InvalidFormat {
                field: "discount_cents".to_string(),
                reason: "exceeds the line total".to_string(),
            }
            .into());
        }
        let subtotal = line_subtotal(line.quantity, unit_price, discount);
        total += subtotal;

        items.push(SaleItem {
            id: Uuid::new_v4().to_string(),
            sale_id: sale_id.clone(),
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            unit_price_cents: unit_price.cents(),
            discount_cents: discount.cents(),
            subtotal_cents: subtotal.cents(),
            created_at: now,
        });
    }

    // PAID consumes stock now, inside this same transaction
    if new.initial_status == SaleStatus::Paid {
        remove_stock_for_items(conn, &items, &reference).await?;
    }

    let sale = Sale {
        id: sale_id,
        client_id: new.client_id,
        reference,
        status: new.initial_status,
        payment_method: new.payment_method,
        total_cents: total.cents(),
        notes: new.notes,
        sale_date: now,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, client_id, reference, status, payment_method,
            total_cents, notes, sale_date, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.client_id)
    .bind(&sale.reference)
    .bind(sale.status)
    .bind(sale.payment_method)
    .bind(sale.total_cents)
    .bind(&sale.notes)
    .bind(sale.sale_date)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .execute(&mut *conn)
    .await?;

    for item in &items {
        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, product_id, quantity,
                unit_price_cents, discount_cents, subtotal_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.discount_cents)
        .bind(item.subtotal_cents)
        .bind(item.created_at)
        .execute(&mut *conn)
        .await?;
    }

    Ok(sale)
}

async fn update_status_in_tx(
    conn: &mut SqliteConnection,
    sale_id: &str,
    new_status: SaleStatus,
) -> StoreResult<Sale> {
    let mut sale = fetch_sale(conn, sale_id).await?;

    if !sale.status.can_transition_to(new_status) {
        return Err(CoreError::InvalidTransition {
            from: sale.status.to_string(),
            to: new_status.to_string(),
        }
        .into());
    }

    debug!(id = %sale_id, from = %sale.status, to = %new_status, "Transitioning sale");

    let items = fetch_items(conn, sale_id).await?;
    match (sale.status, new_status) {
        (SaleStatus::Pending, SaleStatus::Paid) => {
            remove_stock_for_items(conn, &items, &sale.reference).await?;
        }
        (SaleStatus::Paid, SaleStatus::Cancelled) => {
            restore_stock_for_items(conn, &items, &sale.reference).await?;
        }
        // PENDING → CANCELLED: nothing was consumed, nothing to restore
        _ => {}
    }

    let now = Utc::now();
    sqlx::query("UPDATE sales SET status = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(sale_id)
        .bind(new_status)
        .bind(now)
        .execute(&mut *conn)
        .await?;

    sale.status = new_status;
    sale.updated_at = now;
    Ok(sale)
}

async fn delete_sale_in_tx(conn: &mut SqliteConnection, sale_id: &str) -> StoreResult<()> {
    let sale = fetch_sale(conn, sale_id).await?;

    // Deleting a paid sale must not leak its consumed stock
    if sale.status == SaleStatus::Paid {
        let items = fetch_items(conn, sale_id).await?;
        restore_stock_for_items(conn, &items, &sale.reference).await?;
    }

    debug!(id = %sale_id, reference = %sale.reference, "Deleting sale");

    // Items go with it (ON DELETE CASCADE)
    sqlx::query("DELETE FROM sales WHERE id = ?1")
        .bind(sale_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

async fn fetch_sale(conn: &mut SqliteConnection, sale_id: &str) -> StoreResult<Sale> {
    let sale = sqlx::query_as::<_, Sale>(
        r#"
        SELECT id, client_id, reference, status, payment_method,
               total_cents, notes, sale_date, created_at, updated_at
        FROM sales
        WHERE id = ?1
        "#,
    )
    .bind(sale_id)
    .fetch_optional(&mut *conn)
    .await?;

    sale.ok_or_else(|| StoreError::Core(CoreError::SaleNotFound(sale_id.to_string())))
}

async fn fetch_items(conn: &mut SqliteConnection, sale_id: &str) -> StoreResult<Vec<SaleItem>> {
    let items = sqlx::query_as::<_, SaleItem>(
        r#"
        SELECT id, sale_id, product_id, quantity,
               unit_price_cents, discount_cents, subtotal_cents, created_at
        FROM sale_items
        WHERE sale_id = ?1
        ORDER BY created_at, id
        "#,
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

/// One ledger removal per item, reason "Sale: <reference>".
async fn remove_stock_for_items(
    conn: &mut SqliteConnection,
    items: &[SaleItem],
    reference: &str,
) -> StoreResult<()> {
    let reason = format!("Sale: {reference}");
    for item in items {
        record_removal_in_tx(
            conn,
            &item.product_id,
            item.quantity,
            &reason,
            Some(reference),
        )
        .await?;
    }
    Ok(())
}

/// One compensating ledger addition per item, reason
/// "Sale cancelled: <reference>".
async fn restore_stock_for_items(
    conn: &mut SqliteConnection,
    items: &[SaleItem],
    reference: &str,
) -> StoreResult<()> {
    let reason = format!("Sale cancelled: {reference}");
    for item in items {
        record_addition_in_tx(
            conn,
            &item.product_id,
            item.quantity,
            &reason,
            Some(reference),
        )
        .await?;
    }
    Ok(())
}

// =============================================================================
// Reference Generation
// =============================================================================

/// Resolves the sale reference: validates and uniqueness-checks a supplied
/// one, or generates the next `SALE-YYYYMMDD-NNNN` for today.
async fn resolve_reference(
    conn: &mut SqliteConnection,
    supplied: Option<&str>,
) -> StoreResult<String> {
    if let Some(reference) = supplied {
        validate_sale_reference(reference)?;
        let reference = reference.trim();
        if reference_exists(conn, reference).await? {
            return Err(CoreError::DuplicateReference(reference.to_string()).into());
        }
        return Ok(reference.to_string());
    }

    let date_part = Utc::now().format("%Y%m%d").to_string();
    let prefix = format!("SALE-{date_part}-");

    // Start after today's highest sequence; the collision loop covers gaps
    // left by deleted sales and supplied references
    let pattern = format!("{prefix}%");
    let existing: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE reference LIKE ?1")
            .bind(&pattern)
            .fetch_one(&mut *conn)
            .await?;

    let mut seq = existing + 1;
    loop {
        let candidate = format!("{prefix}{seq:04}");
        if !reference_exists(conn, &candidate).await? {
            return Ok(candidate);
        }
        seq += 1;
    }
}

async fn reference_exists(conn: &mut SqliteConnection, reference: &str) -> StoreResult<bool> {
    let found: Option<String> = sqlx::query_scalar("SELECT id FROM sales WHERE reference = ?1")
        .bind(reference)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(found.is_some())
}

// =============================================================================
// Unit Tests
// =============================================================================
