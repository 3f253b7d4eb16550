//! # Validation Module
//!
//! Input validation for caller-supplied strings, run before business
//! logic. Quantity/stock preconditions live with the operations that own
//! them (`CoreError::InvalidQuantity`, `CoreError::InsufficientStock`);
//! this module only rejects malformed input.
//!
//! ## Usage
//! ```rust
//! use stockpile_core::validation::{validate_sku, validate_reason};
//!
//! validate_sku("WIDGET-01").unwrap();
//! validate_reason("purchase").unwrap();
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a movement reason.
///
/// Reasons are free text ("purchase", "Sale: SALE-...") but must exist:
/// an audit log entry without a reason is useless.
pub fn validate_reason(reason: &str) -> ValidationResult<()> {
    let reason = reason.trim();

    if reason.is_empty() {
        return Err(ValidationError::Required {
            field: "reason".to_string(),
        });
    }

    if reason.len() > 500 {
        return Err(ValidationError::TooLong {
            field: "reason".to_string(),
            max: 500,
        });
    }

    Ok(())
}

/// Validates a caller-supplied sale reference.
pub fn validate_sale_reference(reference: &str) -> ValidationResult<()> {
    let reference = reference.trim();

    if reference.is_empty() {
        return Err(ValidationError::Required {
            field: "reference".to_string(),
        });
    }

    if reference.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "reference".to_string(),
            max: 100,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("WIDGET-01").is_ok());
        assert!(validate_sku("abc_123").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
        assert!(validate_sku("BAD SKU!").is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Blue Widget 330ml").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_reason() {
        assert!(validate_reason("purchase").is_ok());
        assert!(validate_reason("").is_err());
    }

    #[test]
    fn test_validate_sale_reference() {
        assert!(validate_sale_reference("SALE-20260823-0001").is_ok());
        assert!(validate_sale_reference("  ").is_err());
        assert!(validate_sale_reference(&"R".repeat(101)).is_err());
    }
}
