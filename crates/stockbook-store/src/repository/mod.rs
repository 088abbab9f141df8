//! # Repository Module
//!
//! Database repositories for Stockbook.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CommitCoordinator / seed                                              │
//! │       │                                                                 │
//! │       │  db.ledger().apply_deltas(batch_id, &deltas)                   │
//! │       ▼                                                                 │
//! │  LedgerRepository                                                      │
//! │  ├── load / snapshot / get / count                                     │
//! │  ├── provision(entries)                                                │
//! │  ├── apply_deltas(batch_id, deltas)   ← one transaction                │
//! │  └── is_batch_applied / processed_batches                              │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite ledger file                                                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod ledger;
