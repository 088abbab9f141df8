//! # stockbook-core: Pure Business Logic for Stockbook
//!
//! This crate contains the inventory rules of Stockbook as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockbook Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Register Console                             │   │
//! │  │  Products ──► Sizes ──► Confirm ──► Cart ──► Checkout           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockbook-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │  ledger  │ │   cart   │ │navigation│ │      report      │  │   │
//! │  │   │ Snapshot │ │   Cart   │ │ Session  │ │  SalesSummary    │  │   │
//! │  │   │ Deltas   │ │ CartLine │ │  Screen  │ │  top_sellers     │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO FILES • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 stockbook-store (Storage Layer)                 │   │
//! │  │      SQLite ledger, sale batch files, commit coordinator        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (LedgerEntry, SaleRecord, SaleBatch, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`ledger`] - Ledger snapshots and aggregated quantity deltas
//! - [`cart`] - The operator's staging cart
//! - [`navigation`] - Screen state machine for one operator session
//! - [`report`] - Read-only sales aggregation
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use stockbook_core::{Cart, LedgerEntry, LedgerSnapshot, Money};
//!
//! let ledger = LedgerSnapshot::from_entries(vec![
//!     LedgerEntry::new("Shirt", "M", "SH-M", Money::from_cents(1250), 10, 2),
//! ]);
//!
//! let mut cart = Cart::new();
//! cart.add(&ledger, "Shirt", "M", 3).unwrap();
//!
//! assert_eq!(cart.total(), Money::from_cents(3750));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod ledger;
pub mod money;
pub mod navigation;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine, CartTotals};
pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{LedgerDeltas, LedgerSnapshot, Shortfall, SizeAvailability};
pub use money::Money;
pub use navigation::{Screen, Session};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and keeps each sale batch file small.
pub const MAX_CART_LINES: usize = 100;

/// Remaining quantity at or below which a size is reported as low stock.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

/// Shop ordering for sizes. Sizes outside this list sort after these,
/// in the order they were first seen.
pub const SIZE_ORDER: &[&str] = &["XS", "S", "M", "L", "XL", "2XL", "3XL", "4XL", "5XL"];
