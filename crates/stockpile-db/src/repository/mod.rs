//! # Repository Module
//!
//! Database service implementations for Stockpile.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Services                                        │
//! │                                                                         │
//! │  Caller                                                                 │
//! │    │  db.ledger().record_removal(product_id, 5, "Sale: SALE-...", ..)  │
//! │    ▼                                                                    │
//! │  StockLedger ──────────┐                                               │
//! │  SaleCoordinator ──────┼──► ImmediateTx (BEGIN IMMEDIATE)              │
//! │  ReportAggregator ─────┘         │                                     │
//! │  ProductRepository               ▼                                     │
//! │  DirectoryRepository        SQLite Database                            │
//! │                                                                         │
//! │  The coordinator drives the ledger's in-transaction functions so one   │
//! │  sale's stock checks and movements commit or roll back together.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Services
//!
//! - [`ledger::StockLedger`] - Append-only stock movements, derived stock
//! - [`sale::SaleCoordinator`] - Sale lifecycle and its ledger side effects
//! - [`report::ReportAggregator`] - Reports over paid sales and the ledger
//! - [`product::ProductRepository`] - Product catalog CRUD
//! - [`directory::DirectoryRepository`] - Categories, suppliers, clients

pub mod directory;
pub mod ledger;
pub mod product;
pub mod report;
pub mod sale;

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

use crate::error::StoreResult;

// =============================================================================
// Write Transaction
// =============================================================================

/// A `BEGIN IMMEDIATE` transaction.
///
/// SQLite's default deferred transactions only take the write lock on the
/// first write. A stock check like "read current stock, then append a
/// removal" done under a deferred transaction can interleave with a
/// concurrent writer and oversell. `BEGIN IMMEDIATE` takes the write lock
/// up front, so the read and the append are a single atomic unit.
///
/// Built on sqlx's `Transaction` guard: dropping an ImmediateTx that was
/// never committed rolls the transaction back, so a cancelled future or a
/// failed commit cannot return a connection to the pool with a transaction
/// still open on it.
///
/// ```rust,ignore
/// let mut tx = ImmediateTx::begin(&pool).await?;
/// let result = do_work(tx.conn()).await;
/// match result {
///     Ok(v) => {
///         tx.commit().await?;
///         Ok(v)
///     }
///     Err(e) => {
///         tx.rollback().await;
///         Err(e)
///     }
/// }
/// ```
pub(crate) struct ImmediateTx {
    tx: Transaction<'static, Sqlite>,
}

impl ImmediateTx {
    /// Acquires a connection and opens an immediate transaction on it.
    pub(crate) async fn begin(pool: &SqlitePool) -> StoreResult<Self> {
        let tx = pool.begin_with("BEGIN IMMEDIATE").await?;
        Ok(ImmediateTx { tx })
    }

    /// The underlying connection, for running statements inside the
    /// transaction.
    pub(crate) fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    /// Commits the transaction.
    pub(crate) async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    /// Rolls the transaction back. Errors are swallowed: the caller is
    /// already on an error path and the original error matters more.
    pub(crate) async fn rollback(self) {
        let _ = self.tx.rollback().await;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
