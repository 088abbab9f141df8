//! # Store Error Types
//!
//! Error types for ledger, sale batch and configuration operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error / std::io::Error / serde_json::Error                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← Adds path, key and categorization          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CommitError (commit.rs) ← Says how far a commit got                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ConsoleError (register app) ← Coded message for the operator          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};

use stockbook_core::{Shortfall, ValidationError};
use thiserror::Error;

fn describe_shortfalls(shortfalls: &[Shortfall]) -> String {
    shortfalls
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The ledger database file does not exist.
    ///
    /// ## When This Occurs
    /// - Wrong `ledger_path` in config
    /// - Ledger never provisioned (run the `seed` binary)
    #[error("Ledger not found at {}", .path.display())]
    LedgerNotFound { path: PathBuf },

    /// The ledger cannot absorb a batch: a key is missing or would oversell.
    ///
    /// Raised inside the apply transaction, so nothing was written.
    #[error("Ledger conflict: {}", describe_shortfalls(.shortfalls))]
    Conflict { shortfalls: Vec<Shortfall> },

    /// A persisted ledger row breaks an invariant.
    #[error("Corrupt ledger entry {product} ({size}): {reason}")]
    CorruptLedger {
        product: String,
        size: String,
        reason: String,
    },

    /// Provisioning hit an existing (product, size).
    #[error("Ledger already has an entry for {product} ({size})")]
    DuplicateEntry { product: String, size: String },

    /// File system failure on a specific path.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON encoding failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// A sale batch file is unreadable or breaks the schema.
    #[error("Invalid sale batch {}: {reason}", .path.display())]
    InvalidBatch { path: PathBuf, reason: String },

    /// Input rejected before reaching the database.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Configuration values are out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read or parsed.
    #[error("Failed to load configuration: {0}")]
    ConfigLoadFailed(String),

    /// Internal error.
    #[error("Internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn invalid_batch(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        StoreError::InvalidBatch {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Convert sqlx errors to StoreError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database       → QueryFailed (constraint name kept in message)
/// sqlx::Error::PoolTimedOut   → PoolExhausted
/// sqlx::Error::PoolClosed     → ConnectionFailed
/// sqlx::Error::Io             → ConnectionFailed
/// Other                       → Internal
/// ```
///
/// UNIQUE violations are turned into `DuplicateEntry` by the caller, which
/// knows the key it was inserting.
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => StoreError::QueryFailed(db_err.message().to_string()),
            sqlx::Error::PoolTimedOut => StoreError::PoolExhausted,
            sqlx::Error::PoolClosed => StoreError::ConnectionFailed("Pool is closed".to_string()),
            sqlx::Error::Io(io_err) => StoreError::ConnectionFailed(io_err.to_string()),
            _ => StoreError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for StoreError {
    fn from(err: toml::de::Error) -> Self {
        StoreError::ConfigLoadFailed(err.to_string())
    }
}

/// True when a sqlx error is a UNIQUE / PRIMARY KEY violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = db_err.message();
            msg.contains("UNIQUE constraint failed") || msg.contains("PRIMARY KEY")
        }
        _ => false,
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_message_lists_shortfalls() {
        let err = StoreError::Conflict {
            shortfalls: vec![Shortfall {
                product: "Shirt".to_string(),
                size: "M".to_string(),
                sku: "SH-M".to_string(),
                available: 5,
                requested: 6,
                lines: vec![0, 1],
            }],
        };
        assert_eq!(
            err.to_string(),
            "Ledger conflict: Shirt (M): requested 6, available 5 (cart lines 1, 2)"
        );
    }

    #[test]
    fn test_not_found_names_path() {
        let err = StoreError::LedgerNotFound {
            path: PathBuf::from("/data/ledger.db"),
        };
        assert_eq!(err.to_string(), "Ledger not found at /data/ledger.db");
    }

    #[test]
    fn test_pool_errors_map() {
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::PoolExhausted
        ));
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolClosed),
            StoreError::ConnectionFailed(_)
        ));
    }
}
