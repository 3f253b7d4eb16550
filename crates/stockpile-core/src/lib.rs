//! # stockpile-core: Pure Business Logic for Stockpile
//!
//! This crate is the **heart** of Stockpile, an inventory tracking core for
//! small businesses. It contains all business logic as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │                       Stockpile Architecture                          │
//! │                                                                       │
//! │  ┌─────────────────────────────────────────────────────────────────┐ │
//! │  │                 Caller (app / API / CLI)                        │ │
//! │  └─────────────────────────────┬───────────────────────────────────┘ │
//! │                                │                                      │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐ │
//! │  │              ★ stockpile-core (THIS CRATE) ★                    │ │
//! │  │                                                                 │ │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌────────────┐        │ │
//! │  │   │  types   │ │  money   │ │  report  │ │ validation │        │ │
//! │  │   │ Product  │ │  Money   │ │ Summary  │ │   rules    │        │ │
//! │  │   │   Sale   │ │ratio_pct │ │  Trend   │ │   checks   │        │ │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └────────────┘        │ │
//! │  │                                                                 │ │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │ │
//! │  └─────────────────────────────┬───────────────────────────────────┘ │
//! │                                │                                      │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐ │
//! │  │                 stockpile-db (Database Layer)                   │ │
//! │  │    SQLite ledger, sale coordinator, report row fetching        │ │
//! │  └─────────────────────────────────────────────────────────────────┘ │
//! └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, StockMovement, Sale, etc.)
//! - [`money`] - Money type with integer cent arithmetic (no floating point!)
//! - [`report`] - Pure report aggregation (summary, trend, recommendations)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Derived Stock**: Current stock is always the sum of ledger movements
//! 5. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use stockpile_core::money::Money;
//! use stockpile_core::types::line_subtotal;
//!
//! // Create money from cents (never from floats!)
//! let unit_price = Money::from_cents(2500); // $25.00
//!
//! // Line subtotal: 5 units, no discount
//! let subtotal = line_subtotal(5, unit_price, Money::zero());
//! assert_eq!(subtotal.cents(), 12500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use stockpile_core::Money` instead of
// `use stockpile_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use report::LOW_STOCK_THRESHOLD;
pub use types::*;
