//! # Validation Module
//!
//! Field rules for ledger entries and sale records.
//!
//! ## Where Validation Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Provisioning (seed binary)                                   │
//! │  └── THIS MODULE: every field of every new LedgerEntry                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Load / Read                                                  │
//! │  ├── Ledger rows      → validate_ledger_counts                         │
//! │  └── Sale batch files → SaleBatch::validate (uses this module)         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (sold_quantity <= initial_quantity)                         │
//! │  └── PRIMARY KEY (product, size)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockbook_core::validation::{validate_sku, validate_quantity};
//!
//! validate_sku("SH-M").unwrap();
//! validate_quantity(5).unwrap();
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted SKU.
pub const MAX_SKU_LEN: usize = 50;

/// Longest accepted product name.
pub const MAX_PRODUCT_LEN: usize = 100;

/// Longest accepted size label.
pub const MAX_SIZE_LEN: usize = 10;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use stockbook_core::validation::validate_sku;
///
/// assert!(validate_sku("TS-BLK-XL").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > MAX_SKU_LEN {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: MAX_SKU_LEN,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "only letters, digits, '-' and '_' are allowed".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name: non-empty, at most 100 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "product".to_string(),
        });
    }

    if name.chars().count() > MAX_PRODUCT_LEN {
        return Err(ValidationError::TooLong {
            field: "product".to_string(),
            max: MAX_PRODUCT_LEN,
        });
    }

    Ok(())
}

/// Validates a size label.
///
/// Any short label is accepted; sizes outside the shop list
/// (`XS` .. `5XL`) are legal and sort last.
pub fn validate_size(size: &str) -> ValidationResult<()> {
    let size = size.trim();

    if size.is_empty() {
        return Err(ValidationError::Required {
            field: "size".to_string(),
        });
    }

    if size.chars().count() > MAX_SIZE_LEN {
        return Err(ValidationError::TooLong {
            field: "size".to_string(),
            max: MAX_SIZE_LEN,
        });
    }

    if size.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "size".to_string(),
            reason: "must not contain whitespace".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale quantity (must be at least one unit).
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::InvalidFormat {
            field: "quantity".to_string(),
            reason: format!("must be at least 1, got {}", qty),
        });
    }
    Ok(())
}

/// Validates a unit cost in cents (zero is allowed for giveaways).
pub fn validate_unit_cost_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: "unit_cost".to_string(),
            value: cents,
        });
    }
    Ok(())
}

/// Validates the two stored counters of a ledger entry.
///
/// ## Rules
/// ```text
///   initial ≥ 0
///   sold    ≥ 0
///   sold    ≤ initial      (remaining never goes negative)
/// ```
pub fn validate_ledger_counts(initial: i64, sold: i64) -> ValidationResult<()> {
    if initial < 0 {
        return Err(ValidationError::Negative {
            field: "initial_quantity".to_string(),
            value: initial,
        });
    }
    if sold < 0 {
        return Err(ValidationError::Negative {
            field: "sold_quantity".to_string(),
            value: sold,
        });
    }
    if sold > initial {
        return Err(ValidationError::Inconsistent {
            field: "sold_quantity".to_string(),
            reason: format!("sold {} exceeds initial {}", sold, initial),
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
        assert!(validate_sku("SH-M").is_ok());
        assert!(validate_sku("TS_001").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku(&"A".repeat(51)).is_err());
        assert!(validate_sku("SH M").is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Camiseta Negra").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_size() {
        assert!(validate_size("M").is_ok());
        assert!(validate_size("2XL").is_ok());
        assert!(validate_size("38").is_ok());
        assert!(validate_size("").is_err());
        assert!(validate_size("X L").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-2).is_err());
    }

    #[test]
    fn test_validate_unit_cost() {
        assert!(validate_unit_cost_cents(0).is_ok());
        assert!(validate_unit_cost_cents(1250).is_ok());
        assert!(matches!(
            validate_unit_cost_cents(-1),
            Err(ValidationError::Negative { .. })
        ));
    }

    #[test]
    fn test_validate_ledger_counts() {
        assert!(validate_ledger_counts(10, 0).is_ok());
        assert!(validate_ledger_counts(10, 10).is_ok());
        assert!(validate_ledger_counts(0, 0).is_ok());
        assert!(matches!(
            validate_ledger_counts(10, 11),
            Err(ValidationError::Inconsistent { .. })
        ));
        assert!(validate_ledger_counts(-1, 0).is_err());
        assert!(validate_ledger_counts(5, -1).is_err());
    }
}
