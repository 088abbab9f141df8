//! # Console Error Type
//!
//! One error shape for everything the operator can see go wrong.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Register                           │
//! │                                                                         │
//! │  Operator types "qty 9"                                                 │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Console::execute                                                │  │
//! │  │  Result<Reply, ConsoleError>                                     │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  CoreError?   ── InsufficientStock ────────┐                     │  │
//! │  │  StoreError?  ── QueryFailed ──────────────┼──► ConsoleError     │  │
//! │  │  CommitError? ── PartialCommit ────────────┘   { code, message } │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  error: [INSUFFICIENT_STOCK] Insufficient stock for Shirt (M): ...      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use serde::Serialize;
use stockbook_core::CoreError;
use stockbook_store::{CommitError, StoreError};
use thiserror::Error;

/// Error shown to the operator.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock: Shirt (M): requested 9, available 8"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("[{code}] {message}")]
pub struct ConsoleError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for console replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Ledger file or (product, size) missing
    NotFound,

    /// Command or input rejected
    ValidationError,

    /// Not enough stock for the cart or line
    InsufficientStock,

    /// Cart operation failed
    CartError,

    /// Action not allowed on the current screen
    NavigationError,

    /// Ledger database or sales directory failed
    StorageError,

    /// Sale file written, ledger not updated
    PartialCommit,

    /// Internal error
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::InsufficientStock => "INSUFFICIENT_STOCK",
            ErrorCode::CartError => "CART_ERROR",
            ErrorCode::NavigationError => "NAVIGATION_ERROR",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::PartialCommit => "PARTIAL_COMMIT",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConsoleError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ConsoleError {
            code,
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ConsoleError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ConsoleError::new(ErrorCode::Internal, message)
    }
}

/// Converts domain errors to console errors.
impl From<CoreError> for ConsoleError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::InsufficientStock { .. } | CoreError::NoStockAvailable { .. } => {
                ErrorCode::InsufficientStock
            }
            CoreError::UnknownItem { .. } => ErrorCode::NotFound,
            CoreError::EmptyCart
            | CoreError::IndexOutOfRange { .. }
            | CoreError::CartTooLarge { .. } => ErrorCode::CartError,
            CoreError::InvalidQuantity(_) | CoreError::Validation(_) => ErrorCode::ValidationError,
            CoreError::InvalidTransition { .. } => ErrorCode::NavigationError,
        };
        ConsoleError::new(code, err.to_string())
    }
}

/// Converts storage errors to console errors.
impl From<StoreError> for ConsoleError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::LedgerNotFound { .. } => {
                ConsoleError::new(ErrorCode::NotFound, err.to_string())
            }
            StoreError::Conflict { .. } => {
                ConsoleError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            StoreError::Validation(_)
            | StoreError::InvalidConfig(_)
            | StoreError::ConfigLoadFailed(_)
            | StoreError::InvalidBatch { .. }
            | StoreError::DuplicateEntry { .. } => ConsoleError::validation(err.to_string()),
            StoreError::Internal(_) => {
                tracing::error!(error = %err, "Internal store error");
                ConsoleError::internal(err.to_string())
            }
            _ => {
                tracing::error!(error = %err, "Storage operation failed");
                ConsoleError::new(ErrorCode::StorageError, err.to_string())
            }
        }
    }
}

/// Converts commit errors to console errors.
impl From<CommitError> for ConsoleError {
    fn from(err: CommitError) -> Self {
        match err {
            CommitError::EmptyCart => ConsoleError::new(ErrorCode::CartError, "Cart is empty"),
            CommitError::InsufficientStock(_) => {
                ConsoleError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            CommitError::NotFound(_) => ConsoleError::new(ErrorCode::NotFound, err.to_string()),
            CommitError::Store(e) => e.into(),
            CommitError::PartialCommit { .. } => ConsoleError::new(
                ErrorCode::PartialCommit,
                format!(
                    "{}. Type `commit` to retry this sale, or run `reconcile`.",
                    err
                ),
            ),
            CommitError::UnreconciledBatch { .. } => {
                ConsoleError::new(ErrorCode::PartialCommit, err.to_string())
            }
            CommitError::Navigation(e) => e.into(),
        }
    }
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;

#[cfg(test)]
mod tests {
    use super::*;
    use stockbook_core::{Screen, SaleBatchId};

    #[test]
    fn test_serializes_code_and_message() {
        let err = ConsoleError::validation("Unknown command: fly");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["message"], "Unknown command: fly");
        assert_eq!(err.to_string(), "[VALIDATION_ERROR] Unknown command: fly");
    }

    #[test]
    fn test_core_error_codes() {
        let err: ConsoleError = CoreError::InvalidTransition {
            from: Screen::Start,
            action: "checkout",
        }
        .into();
        assert_eq!(err.code, ErrorCode::NavigationError);

        let err: ConsoleError = CoreError::IndexOutOfRange { index: 4, len: 2 }.into();
        assert_eq!(err.code, ErrorCode::CartError);

        let err: ConsoleError = CoreError::UnknownItem {
            product: "Shirt".into(),
            size: "XXL".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_partial_commit_tells_operator_to_reconcile() {
        let err: ConsoleError = CommitError::PartialCommit {
            batch_id: SaleBatchId::new(),
            batch_name: "2026-10-16.json".into(),
            source: StoreError::QueryFailed("disk I/O error".into()),
        }
        .into();
        assert_eq!(err.code, ErrorCode::PartialCommit);
        assert!(err.message.contains("2026-10-16.json"));
        assert!(err.message.contains("reconcile"));
    }

    #[test]
    fn test_unreconciled_batch_is_partial_commit() {
        let err: ConsoleError = CommitError::UnreconciledBatch {
            batch_id: SaleBatchId::new(),
            batch_name: "2026-10-16_1.json".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::PartialCommit);
        assert!(err.message.contains("2026-10-16_1.json"));
    }

    #[test]
    fn test_commit_store_error_unwraps() {
        let err: ConsoleError = CommitError::Store(StoreError::PoolExhausted).into();
        assert_eq!(err.code, ErrorCode::StorageError);

        let err: ConsoleError = CommitError::NotFound("/srv/ledger.db".into()).into();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
