//! # stockbook-store: Storage Layer for Stockbook
//!
//! Owns every durable write: the SQLite master ledger and the append-only
//! sale batch files. The commit coordinator ties the two together.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockbook Data Flow                              │
//! │                                                                         │
//! │  Register console (checkout)                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  stockbook-store (THIS CRATE)                   │   │
//! │  │                                                                 │   │
//! │  │              ┌──────────────────────────┐                       │   │
//! │  │              │    CommitCoordinator     │                       │   │
//! │  │              │      (commit.rs)         │                       │   │
//! │  │              └─────┬──────────────┬─────┘                       │   │
//! │  │                    │              │                             │   │
//! │  │   ┌────────────────▼──┐      ┌────▼──────────────┐             │   │
//! │  │   │ LedgerRepository  │      │ SaleBatchWriter   │             │   │
//! │  │   │ Database (pool)   │      │ (sale_batch.rs)   │             │   │
//! │  │   │ Migrations        │      │                   │             │   │
//! │  │   └────────┬──────────┘      └────────┬──────────┘             │   │
//! │  └────────────┼──────────────────────────┼────────────────────────┘   │
//! │               ▼                          ▼                             │
//! │        ledger.db (SQLite)        sales/YYYY-MM-DD[_N].json             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Paths and thresholds from TOML and environment
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`repository`] - Ledger reads and guarded updates
//! - [`sale_batch`] - Write-once sale batch files
//! - [`commit`] - The cart-to-ledger commit protocol
//! - [`error`] - Storage error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockbook_store::{CommitCoordinator, StoreConfig};
//!
//! let config = StoreConfig::load(None)?;
//! let coordinator = CommitCoordinator::open(&config).await?;
//!
//! let snapshot = coordinator.snapshot().await?;
//! cart.add(&snapshot, "Shirt", "M", 2)?;
//! let receipt = coordinator.commit(&mut cart).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod commit;
pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod sale_batch;

// =============================================================================
// Re-exports
// =============================================================================

pub use commit::{
    CommitCoordinator, CommitError, CommitReceipt, CommitResult, FailedBatch, ReconcileReport,
};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use pool::{Database, DbConfig};
pub use sale_batch::{BatchScan, QuarantinedBatch, SaleBatchHandle, SaleBatchWriter, StoredBatch};

pub use repository::ledger::{ApplyOutcome, LedgerRepository, ProcessedBatch};
