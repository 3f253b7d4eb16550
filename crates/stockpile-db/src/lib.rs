//! # stockpile-db: Database Layer for Stockpile
//!
//! This crate provides database access for the Stockpile inventory core.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Stockpile Data Flow                               │
//! │                                                                         │
//! │  Caller (app / API / CLI)                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockpile-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │   Services    │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (repository/) │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │    │ StockLedger   │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │◄───│ SaleCoord.    │    │ ...          │  │   │
//! │  │   │ Management    │    │ ReportAggr.   │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (./stockpile.db)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and service error types
//! - [`repository`] - Service implementations (ledger, sale, report, ...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockpile_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./stockpile.db")).await?;
//!
//! db.ledger().record_addition(&product_id, 100, "purchase", Some("PO-1")).await?;
//! let sale = db.sales().create_sale(new_sale).await?;
//! let summary = db.reports().summary(None).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, StoreError, StoreResult};
pub use pool::{Database, DbConfig};

// Service re-exports for convenience
pub use repository::directory::DirectoryRepository;
pub use repository::ledger::StockLedger;
pub use repository::product::ProductRepository;
pub use repository::report::ReportAggregator;
pub use repository::sale::{SaleCoordinator, SaleFilter};
