//! # Domain Types
//!
//! Core domain types for the stock ledger, sales, and reporting.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Product ────────┐                                                  │
//! │    id (UUID)     │ referenced by                                    │
//! │    sku (business)├──────────► StockMovement (append-only ledger)    │
//! │    prices        │              signed quantity, kind, reason       │
//! │                  └──────────► SaleItem (price snapshot)             │
//! │                                   │ owned by (cascade)              │
//! │  Sale ◄───────────────────────────┘                                 │
//! │    reference (business key)                                         │
//! │    status: pending → paid → cancelled                               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business key where one exists: `sku` for products, `reference` for sales
//!
//! ## Derived Stock
//! A product's current stock is NOT a field on `Product`. It is always the
//! sum of its stock movements, so the ledger stays the single source of
//! truth and a cached counter can never drift from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product known to the inventory.
///
/// Prices are nullable until first stocked/priced. Current stock is derived
/// from the movement ledger, never stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier, unique.
    pub sku: String,

    /// Display name.
    pub name: String,

    /// Cost price in cents (what the business pays).
    pub cost_price_cents: Option<i64>,

    /// Selling price in cents (what the client pays).
    pub selling_price_cents: Option<i64>,

    /// Optional category reference.
    pub category_id: Option<String>,

    /// Optional supplier reference.
    pub supplier_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the cost price as Money, if set.
    #[inline]
    pub fn cost_price(&self) -> Option<Money> {
        self.cost_price_cents.map(Money::from_cents)
    }

    /// Returns the selling price as Money, if set.
    #[inline]
    pub fn selling_price(&self) -> Option<Money> {
        self.selling_price_cents.map(Money::from_cents)
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// Direction of a stock movement.
///
/// Redundant with the sign of `quantity`; kept for explicit intent and
/// audit readability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Stock addition (purchase, restitution from a cancelled sale).
    In,
    /// Stock removal (sale, shrinkage).
    Out,
}

/// One entry in the append-only stock ledger.
///
/// Immutable once created; never updated, never deleted. The ordered
/// sequence of movements for a product is its full history, and
/// `current_stock = Σ quantity` over that sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,

    pub product_id: String,

    /// Signed quantity delta: positive for additions, negative for removals.
    pub quantity: i64,

    pub kind: MovementKind,

    /// Free-text reason, e.g. "purchase" or "Sale: SALE-20260823-0001".
    pub reason: String,

    /// Free-text external reference (sale reference, purchase order id).
    pub reference: Option<String>,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale Status
// =============================================================================

/// Sale lifecycle states. Only PAID consumes stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    /// Sale persisted, no stock consumed.
    Pending,
    /// Every line item has consumed stock exactly once.
    Paid,
    /// Terminal. A previously paid sale has had its stock restored.
    Cancelled,
}

impl SaleStatus {
    /// Whether the transition `self -> to` is legal.
    ///
    /// Allowed: pending -> paid, pending -> cancelled, paid -> cancelled.
    /// Everything else (including re-cancelling and resurrecting a
    /// cancelled sale) is rejected.
    pub fn can_transition_to(self, to: SaleStatus) -> bool {
        matches!(
            (self, to),
            (SaleStatus::Pending, SaleStatus::Paid)
                | (SaleStatus::Pending, SaleStatus::Cancelled)
                | (SaleStatus::Paid, SaleStatus::Cancelled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Paid => "paid",
            SaleStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Pending
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
}

// =============================================================================
// Sale
// =============================================================================

/// A sale transaction header. Items are stored separately and exclusively
/// owned by the sale (cascade delete).
///
/// Invariant: `total_cents = Σ item.subtotal_cents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    /// Optional buyer reference.
    pub client_id: Option<String>,
    /// Unique business reference, e.g. SALE-20260823-0001.
    pub reference: String,
    pub status: SaleStatus,
    pub payment_method: PaymentMethod,
    pub total_cents: i64,
    pub notes: Option<String>,
    pub sale_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
///
/// `unit_price_cents` is captured at time of sale (decoupled from the
/// product's current selling price so historical sales stay accurate).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Discount applied to this line.
    pub discount_cents: i64,
    /// `quantity * unit_price - discount`, computed from its inputs.
    pub subtotal_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// Line subtotal: `quantity * unit_price - discount`.
///
/// The single place this formula lives; `subtotal_cents` is never stored
/// independently of its inputs.
#[inline]
pub fn line_subtotal(quantity: i64, unit_price: Money, discount: Money) -> Money {
    unit_price.multiply_quantity(quantity) - discount
}

// =============================================================================
// Product Creation Input
// =============================================================================

/// A proposed product, as supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub cost_price_cents: Option<i64>,
    pub selling_price_cents: Option<i64>,
    pub category_id: Option<String>,
    pub supplier_id: Option<String>,
}

// =============================================================================
// Sale Creation Input
// =============================================================================

/// Input for one proposed sale line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSaleItem {
    pub product_id: String,
    pub quantity: i64,
    /// Omitted = default to the product's current selling price.
    pub unit_price_cents: Option<i64>,
    /// Per-item discount, defaults to zero. Must be non-negative and at
    /// most the line gross (`quantity * unit_price`).
    #[serde(default)]
    pub discount_cents: i64,
}

/// A proposed sale, as supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSale {
    pub client_id: Option<String>,
    /// Omitted = generated (monotonic, collision-checked).
    pub reference: Option<String>,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub items: Vec<NewSaleItem>,
    /// Pending, or Paid for the point-of-sale fast path.
    pub initial_status: SaleStatus,
}

// =============================================================================
// Directory Records
// =============================================================================
// Supplied by the out-of-scope CRUD directories; consumed here only for
// classification and performance-grouping labels.

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Client {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_status_transitions() {
        assert!(SaleStatus::Pending.can_transition_to(SaleStatus::Paid));
        assert!(SaleStatus::Pending.can_transition_to(SaleStatus::Cancelled));
        assert!(SaleStatus::Paid.can_transition_to(SaleStatus::Cancelled));

        // Terminal and backward transitions are rejected
        assert!(!SaleStatus::Cancelled.can_transition_to(SaleStatus::Paid));
        assert!(!SaleStatus::Cancelled.can_transition_to(SaleStatus::Pending));
        assert!(!SaleStatus::Cancelled.can_transition_to(SaleStatus::Cancelled));
        assert!(!SaleStatus::Paid.can_transition_to(SaleStatus::Pending));
        assert!(!SaleStatus::Paid.can_transition_to(SaleStatus::Paid));
        assert!(!SaleStatus::Pending.can_transition_to(SaleStatus::Pending));
    }

    #[test]
    fn test_line_subtotal() {
        let subtotal = line_subtotal(5, Money::from_cents(2500), Money::zero());
        assert_eq!(subtotal.cents(), 12500);

        let discounted = line_subtotal(2, Money::from_cents(1000), Money::from_cents(300));
        assert_eq!(discounted.cents(), 1700);
    }

    #[test]
    fn test_sale_status_default() {
        assert_eq!(SaleStatus::default(), SaleStatus::Pending);
    }

    #[test]
    fn test_enum_json_representation() {
        // Wire format matches what the database stores
        assert_eq!(
            serde_json::to_string(&SaleStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::BankTransfer).unwrap(),
            "\"bank_transfer\""
        );
        assert_eq!(serde_json::to_string(&MovementKind::Out).unwrap(), "\"out\"");

        let status: SaleStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status, SaleStatus::Cancelled);
    }
}
