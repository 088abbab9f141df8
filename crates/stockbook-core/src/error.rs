//! # Error Types
//!
//! Domain-specific error types for stockbook-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockbook-core errors (this file)                                     │
//! │  ├── CoreError        - Cart and navigation rule violations            │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockbook-store errors (separate crate)                               │
//! │  ├── StoreError       - Ledger database and sale file failures         │
//! │  └── CommitError      - Outcome of a failed cart commit                │
//! │                                                                         │
//! │  Console errors (in app)                                               │
//! │  └── ConsoleError     - What the operator sees (coded)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product, size, index)
//! 3. Errors are enum variants, never String
//! 4. Every variant is recoverable: the operator fixes the input and retries

use thiserror::Error;

use crate::navigation::Screen;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Requested quantity exceeds what the ledger snapshot has left.
    ///
    /// ## User Workflow
    /// ```text
    /// Confirm line (Shirt M, qty: 9)
    ///      │
    ///      ▼
    /// Snapshot: remaining=8
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Shirt", size: "M", available: 8, requested: 9 }
    ///      │
    ///      ▼
    /// Operator lowers the quantity
    /// ```
    #[error("Insufficient stock for {product} ({size}): available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        size: String,
        available: i64,
        requested: i64,
    },

    /// The (product, size) pair is not in the ledger.
    #[error("No ledger entry for {product} ({size})")]
    UnknownItem { product: String, size: String },

    /// Checkout or commit attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart edit referenced a line that does not exist.
    #[error("Cart line {index} out of range (cart has {len} lines)")]
    IndexOutOfRange { index: usize, len: usize },

    /// Quantity must be a positive number of units.
    #[error("Quantity must be positive, got {0}")]
    InvalidQuantity(i64),

    /// Cart has reached the maximum number of lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Every size of the chosen product is sold out.
    #[error("{product} has no size in stock")]
    NoStockAvailable { product: String },

    /// The requested action is not legal from the current screen.
    #[error("Cannot {action} from the {from} screen")]
    InvalidTransition { from: Screen, action: &'static str },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised when provisioning data or persisted rows break a field rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must not be negative.
    #[error("{field} must not be negative, got {value}")]
    Negative { field: String, value: i64 },

    /// Two related fields disagree.
    #[error("{field} is inconsistent: {reason}")]
    Inconsistent { field: String, reason: String },

    /// Invalid format (e.g., unparseable decimal amount).
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
            product: "Shirt".to_string(),
            size: "M".to_string(),
            available: 8,
            requested: 9,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Shirt (M): available 8, requested 9"
        );

        let err = CoreError::IndexOutOfRange { index: 4, len: 2 };
        assert_eq!(err.to_string(), "Cart line 4 out of range (cart has 2 lines)");
    }

    #[test]
    fn test_transition_error_names_screen() {
        let err = CoreError::InvalidTransition {
            from: Screen::Start,
            action: "checkout",
        };
        assert_eq!(err.to_string(), "Cannot checkout from the start screen");
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
