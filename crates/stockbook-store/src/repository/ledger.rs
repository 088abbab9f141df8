//! # Ledger Repository
//!
//! Reads and guarded updates of the master inventory ledger.
//!
//! ## apply_deltas Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ├── batch_id in processed_batches? ──yes──► ROLLBACK, AlreadyApplied │
//! │    │                                                                    │
//! │    ├── re-read every affected row                                       │
//! │    │     missing key or sold + delta > initial ──► ROLLBACK, Conflict   │
//! │    │                                                                    │
//! │    ├── UPDATE ... WHERE sold + delta <= initial   (one per key)         │
//! │    │     rewrites sold, remaining, accrued profit                       │
//! │    │                                                                    │
//! │    ├── INSERT processed_batches(batch_id, ...)                          │
//! │    │                                                                    │
//! │  COMMIT ──► Applied                                                     │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction: nothing is written.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info, warn};

use stockbook_core::{LedgerDeltas, LedgerEntry, LedgerSnapshot, Money, SaleBatchId, Shortfall};

use crate::error::{is_unique_violation, StoreError, StoreResult};

// =============================================================================
// Rows
// =============================================================================

/// Raw `ledger_entries` row.
#[derive(Debug, Clone, FromRow)]
struct LedgerRow {
    product: String,
    size: String,
    sku: String,
    unit_cost_cents: i64,
    initial_quantity: i64,
    sold_quantity: i64,
    remaining_quantity: i64,
    accrued_profit_cents: i64,
}

impl LedgerRow {
    /// Validates the stored counters and rebuilds derived values.
    ///
    /// Stored `remaining_quantity` / `accrued_profit_cents` are ignored;
    /// a mismatch is only logged.
    fn into_entry(self) -> StoreResult<LedgerEntry> {
        let entry = LedgerEntry::new(
            self.product,
            self.size,
            self.sku,
            Money::from_cents(self.unit_cost_cents),
            self.initial_quantity,
            self.sold_quantity,
        );

        if let Err(e) = entry.validate() {
            return Err(StoreError::CorruptLedger {
                product: entry.product,
                size: entry.size,
                reason: e.to_string(),
            });
        }

        if self.remaining_quantity != entry.remaining()
            || self.accrued_profit_cents != entry.accrued_profit().cents()
        {
            warn!(
                product = %entry.product,
                size = %entry.size,
                stored_remaining = self.remaining_quantity,
                stored_profit_cents = self.accrued_profit_cents,
                "Derived ledger columns drifted; recomputed from counters"
            );
        }

        Ok(entry)
    }
}

/// Marker row for a batch whose deltas reached the ledger.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ProcessedBatch {
    pub batch_id: String,
    pub item_count: i64,
    pub units: i64,
    pub applied_at: DateTime<Utc>,
}

/// Result of a successful `apply_deltas` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The deltas were written and the batch marked processed.
    Applied { items: usize, units: i64 },
    /// The batch id was already marked; the ledger is untouched.
    AlreadyApplied,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the `ledger_entries` and `processed_batches` tables.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Loads every entry in provisioning order.
    ///
    /// Fails with `CorruptLedger` on the first row that breaks an invariant.
    pub async fn load(&self) -> StoreResult<Vec<LedgerEntry>> {
        let rows: Vec<LedgerRow> = sqlx::query_as(
            r#"
            SELECT
                product,
                size,
                sku,
                unit_cost_cents,
                initial_quantity,
                sold_quantity,
                remaining_quantity,
                accrued_profit_cents
            FROM ledger_entries
            ORDER BY rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(rows = rows.len(), "Loaded ledger rows");

        rows.into_iter().map(LedgerRow::into_entry).collect()
    }

    /// Loads a snapshot for cart checks and navigation.
    pub async fn snapshot(&self) -> StoreResult<LedgerSnapshot> {
        Ok(LedgerSnapshot::from_entries(self.load().await?))
    }

    /// Gets one entry by key.
    pub async fn get(&self, product: &str, size: &str) -> StoreResult<Option<LedgerEntry>> {
        let row: Option<LedgerRow> = sqlx::query_as(
            r#"
            SELECT
                product,
                size,
                sku,
                unit_cost_cents,
                initial_quantity,
                sold_quantity,
                remaining_quantity,
                accrued_profit_cents
            FROM ledger_entries
            WHERE product = ?1 AND size = ?2
            "#,
        )
        .bind(product)
        .bind(size)
        .fetch_optional(&self.pool)
        .await?;

        row.map(LedgerRow::into_entry).transpose()
    }

    /// Number of ledger entries.
    pub async fn count(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ledger_entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Inserts new entries in one transaction.
    ///
    /// Every entry is validated first. An existing key fails the whole call
    /// with `DuplicateEntry`.
    pub async fn provision(&self, entries: &[LedgerEntry]) -> StoreResult<usize> {
        for entry in entries {
            entry.validate()?;
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        for entry in entries {
            let result = sqlx::query(
                r#"
                INSERT INTO ledger_entries (
                    product, size, sku, unit_cost_cents,
                    initial_quantity, sold_quantity,
                    remaining_quantity, accrued_profit_cents,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(&entry.product)
            .bind(&entry.size)
            .bind(&entry.sku)
            .bind(entry.unit_cost.cents())
            .bind(entry.initial_quantity)
            .bind(entry.sold_quantity)
            .bind(entry.remaining())
            .bind(entry.accrued_profit().cents())
            .bind(now)
            .execute(&mut *tx)
            .await;

            match result {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    return Err(StoreError::DuplicateEntry {
                        product: entry.product.clone(),
                        size: entry.size.clone(),
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }

        tx.commit().await?;

        info!(entries = entries.len(), "Provisioned ledger entries");
        Ok(entries.len())
    }

    /// Applies one sale's deltas atomically, at most once per batch id.
    pub async fn apply_deltas(
        &self,
        batch_id: SaleBatchId,
        deltas: &LedgerDeltas,
    ) -> StoreResult<ApplyOutcome> {
        if deltas.is_empty() {
            return Err(StoreError::Internal(format!(
                "batch {} has no deltas to apply",
                batch_id
            )));
        }

        let batch_key = batch_id.to_string();
        let mut tx = self.pool.begin().await?;

        let marker: Option<String> =
            sqlx::query_scalar("SELECT batch_id FROM processed_batches WHERE batch_id = ?1")
                .bind(&batch_key)
                .fetch_optional(&mut *tx)
                .await?;

        if marker.is_some() {
            tx.rollback().await?;
            info!(batch_id = %batch_id, "Batch already applied; ledger unchanged");
            return Ok(ApplyOutcome::AlreadyApplied);
        }

        // Oversell re-check against the rows as this transaction sees them.
        let mut shortfalls = Vec::new();
        for delta in deltas {
            let counts: Option<(i64, i64)> = sqlx::query_as(
                "SELECT initial_quantity, sold_quantity FROM ledger_entries WHERE product = ?1 AND size = ?2",
            )
            .bind(&delta.key.product)
            .bind(&delta.key.size)
            .fetch_optional(&mut *tx)
            .await?;

            let available = match counts {
                Some((initial, sold)) => initial - sold,
                None => 0,
            };
            if counts.is_none() || delta.quantity > available {
                shortfalls.push(Shortfall {
                    product: delta.key.product.clone(),
                    size: delta.key.size.clone(),
                    sku: delta.sku.clone(),
                    available,
                    requested: delta.quantity,
                    lines: delta.lines.clone(),
                });
            }
        }

        if !shortfalls.is_empty() {
            tx.rollback().await?;
            warn!(
                batch_id = %batch_id,
                conflicts = shortfalls.len(),
                "Ledger rejected batch deltas"
            );
            return Err(StoreError::Conflict { shortfalls });
        }

        let now = Utc::now();
        for delta in deltas {
            let result = sqlx::query(
                r#"
                UPDATE ledger_entries SET
                    sold_quantity = sold_quantity + ?3,
                    remaining_quantity = initial_quantity - (sold_quantity + ?3),
                    accrued_profit_cents = unit_cost_cents * (sold_quantity + ?3),
                    updated_at = ?4
                WHERE product = ?1
                  AND size = ?2
                  AND sold_quantity + ?3 <= initial_quantity
                "#,
            )
            .bind(&delta.key.product)
            .bind(&delta.key.size)
            .bind(delta.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() != 1 {
                return Err(StoreError::Internal(format!(
                    "guarded update for {} matched {} rows",
                    delta.key,
                    result.rows_affected()
                )));
            }

            debug!(
                batch_id = %batch_id,
                product = %delta.key.product,
                size = %delta.key.size,
                quantity = delta.quantity,
                "Ledger entry updated"
            );
        }

        let units = deltas.total_units();
        sqlx::query(
            "INSERT INTO processed_batches (batch_id, item_count, units, applied_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&batch_key)
        .bind(deltas.len() as i64)
        .bind(units)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(batch_id = %batch_id, items = deltas.len(), units, "Batch applied to ledger");
        Ok(ApplyOutcome::Applied {
            items: deltas.len(),
            units,
        })
    }

    /// True when the batch's deltas already reached the ledger.
    pub async fn is_batch_applied(&self, batch_id: SaleBatchId) -> StoreResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM processed_batches WHERE batch_id = ?1")
                .bind(batch_id.to_string())
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }

    /// All processed markers, oldest first.
    pub async fn processed_batches(&self) -> StoreResult<Vec<ProcessedBatch>> {
        let batches: Vec<ProcessedBatch> = sqlx::query_as(
            r#"
            SELECT batch_id, item_count, units, applied_at
            FROM processed_batches
            ORDER BY applied_at, batch_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(batches)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
