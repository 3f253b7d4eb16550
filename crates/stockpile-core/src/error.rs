//! # Error Types
//!
//! Domain-specific error types for stockpile-core.
//!
//! ## Error Hierarchy
//! ```text
//! stockpile-core errors (this file)
//! ├── CoreError        - business rule rejections
//! └── ValidationError  - input validation failures
//!
//! stockpile-db errors (separate crate)
//! ├── DbError          - storage faults (connection, constraints)
//! └── StoreError       - CoreError | DbError, what services return
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impls)
//! 2. Include context in error messages (SKU, available quantity, ...)
//! 3. Errors are enum variants, never bare strings
//! 4. Every rejection names the precondition that failed, so the caller
//!    can decide to reduce quantity, restock, or abandon the operation

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule rejections.
///
/// All of these are recoverable, caller-facing failures: the offending
/// operation is fully rolled back and no partial ledger/sale state remains.
/// None of them is retryable inside this core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Sale cannot be found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Client cannot be found (sales may reference an optional buyer).
    #[error("Client not found: {0}")]
    ClientNotFound(String),

    /// A quantity argument was zero or negative.
    ///
    /// Ledger movements always carry the magnitude; direction comes from
    /// the operation (addition vs removal), never from a signed argument.
    #[error("Invalid quantity {quantity}: must be positive")]
    InvalidQuantity { quantity: i64 },

    /// Removal exceeds the derived current stock.
    ///
    /// ## When This Occurs
    /// - Selling more than the ledger sum for a product
    /// - A direct `record_removal` larger than what is on hand
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Sale reference collision.
    #[error("Duplicate sale reference: '{0}' already exists")]
    DuplicateReference(String),

    /// Illegal sale status change (e.g. resurrecting a cancelled sale).
    #[error("Invalid sale transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input does not meet requirements, before any
/// business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. bad SKU characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            sku: "WIDGET-01".to_string(),
            available: 3,
            requested: 10,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for WIDGET-01: available 3, requested 10"
        );

        let err = CoreError::InvalidTransition {
            from: "cancelled".to_string(),
            to: "paid".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid sale transition: cancelled -> paid");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "sku".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
