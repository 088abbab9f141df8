//! # Commit Coordinator
//!
//! Turns a cart into one durable sale: a write-once batch file plus the
//! matching ledger update.
//!
//! ## Commit Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         commit(&mut cart)                               │
//! │                                                                         │
//! │  1. cart empty?                      ──yes──► EmptyCart                 │
//! │  2. lock writer mutex, fresh snapshot ─err──► NotFound / Store          │
//! │  3. sum lines per key, check stock   ──short─► InsufficientStock        │
//! │        (nothing written so far)                                         │
//! │  4. append SaleBatch file            ──err──► Store                     │
//! │        (ledger untouched)                                               │
//! │  5. apply_deltas(batch_id)           ──err──► PartialCommit             │
//! │        (file exists, ledger untouched, cart kept)                       │
//! │  6. clear cart, return receipt                                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Recovery
//! A `PartialCommit` leaves a batch file whose deltas never reached the
//! ledger. The coordinator holds that batch as pending:
//!
//! ```text
//!   commit(same cart)   ──► re-run step 5 for the pending batch id
//!   commit(other cart)  ──► UnreconciledBatch, nothing written
//!   reconcile / apply_batch marks it processed ──► pending cleared
//! ```
//!
//! `apply_batch` re-runs step 5 for one batch and `reconcile` does it for
//! every unmarked batch in the sales directory. Both are no-ops for batches
//! already marked processed.
//!
//! ## Concurrency
//! Steps 2 to 5 run under a `tokio::sync::Mutex` that also guards the
//! pending batch, so sessions sharing one coordinator (behind an `Arc`)
//! commit one at a time. `snapshot()` does not take the lock.

use std::path::PathBuf;

use chrono::{Local, NaiveDate, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use stockbook_core::{
    Cart, CoreError, LedgerDeltas, LedgerSnapshot, Money, SaleBatch, SaleBatchId, Screen, Session,
    Shortfall,
};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::pool::Database;
use crate::repository::ledger::ApplyOutcome;
use crate::sale_batch::{QuarantinedBatch, SaleBatchHandle, SaleBatchWriter};

// =============================================================================
// Errors
// =============================================================================

fn describe(shortfalls: &[Shortfall]) -> String {
    shortfalls
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Why a commit did not complete.
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("Cart is empty")]
    EmptyCart,

    /// The summed cart exceeds the fresh ledger. Nothing was written.
    #[error("Insufficient stock: {}", describe(.0))]
    InsufficientStock(Vec<Shortfall>),

    #[error("Ledger not found at {}", .0.display())]
    NotFound(PathBuf),

    /// Storage failed before anything durable happened.
    #[error(transparent)]
    Store(StoreError),

    /// The batch file is on disk but the ledger was not updated.
    ///
    /// Run `reconcile` (or `apply_batch`) once the cause is fixed.
    #[error("Sale {batch_id} saved as {batch_name} but the ledger was not updated: {source}")]
    PartialCommit {
        batch_id: SaleBatchId,
        batch_name: String,
        #[source]
        source: StoreError,
    },

    /// An earlier sale is saved but not yet in the ledger, and this cart is
    /// not that sale. Nothing was written.
    #[error(
        "Sale {batch_name} ({batch_id}) is saved but not in the ledger; \
         commit the same cart again or reconcile first"
    )]
    UnreconciledBatch {
        batch_id: SaleBatchId,
        batch_name: String,
    },

    /// The session was not on the checkout screen.
    #[error(transparent)]
    Navigation(CoreError),
}

impl From<StoreError> for CommitError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::LedgerNotFound { path } => CommitError::NotFound(path),
            other => CommitError::Store(other),
        }
    }
}

pub type CommitResult<T> = Result<T, CommitError>;

// =============================================================================
// Results
// =============================================================================

/// What a successful commit produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    pub batch_id: SaleBatchId,
    pub batch_name: String,
    pub path: PathBuf,
    pub sale_date: NaiveDate,
    /// Sum of line profits.
    pub total: Money,
    pub units: i64,
    pub lines: usize,
}

/// A stored batch that could not be applied during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedBatch {
    pub batch_id: SaleBatchId,
    pub batch_name: String,
    pub reason: String,
}

/// Outcome of a `reconcile` pass over the sales directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Batch file names whose deltas were applied by this pass.
    pub applied: Vec<String>,
    pub already_applied: usize,
    pub failed: Vec<FailedBatch>,
    pub quarantined: Vec<QuarantinedBatch>,
}

impl ReconcileReport {
    /// True when every readable batch is reflected in the ledger.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.quarantined.is_empty()
    }
}

// =============================================================================
// Coordinator
// =============================================================================

/// A batch on disk whose ledger update failed.
#[derive(Debug, Clone)]
struct PendingCommit {
    batch: SaleBatch,
    handle: SaleBatchHandle,
    deltas: LedgerDeltas,
}

/// Single-writer owner of the ledger database and the sales directory.
#[derive(Debug)]
pub struct CommitCoordinator {
    db: Database,
    writer: SaleBatchWriter,
    pending: Mutex<Option<PendingCommit>>,
    low_stock_threshold: i64,
}

impl CommitCoordinator {
    pub fn new(db: Database, writer: SaleBatchWriter, low_stock_threshold: i64) -> Self {
        CommitCoordinator {
            db,
            writer,
            pending: Mutex::new(None),
            low_stock_threshold,
        }
    }

    /// Opens the configured ledger. A missing ledger file is `NotFound`.
    pub async fn open(config: &StoreConfig) -> CommitResult<Self> {
        let db = Database::open(config.db_config()).await?;
        Ok(Self::new(
            db,
            config.sale_writer(),
            config.stock.low_stock_threshold,
        ))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn writer(&self) -> &SaleBatchWriter {
        &self.writer
    }

    pub fn low_stock_threshold(&self) -> i64 {
        self.low_stock_threshold
    }

    /// Current ledger contents. Does not wait for an in-flight commit.
    pub async fn snapshot(&self) -> StoreResult<LedgerSnapshot> {
        Ok(self
            .db
            .ledger()
            .snapshot()
            .await?
            .with_low_stock_threshold(self.low_stock_threshold))
    }

    /// Commits the cart as one sale dated today (local time).
    pub async fn commit(&self, cart: &mut Cart) -> CommitResult<CommitReceipt> {
        self.commit_on(cart, Local::now().date_naive()).await
    }

    async fn commit_on(
        &self,
        cart: &mut Cart,
        sale_date: NaiveDate,
    ) -> CommitResult<CommitReceipt> {
        if cart.is_empty() {
            return Err(CommitError::EmptyCart);
        }

        let mut pending = self.pending.lock().await;
        let deltas = cart.deltas();

        if let Some(held) = pending.take() {
            if held.deltas != deltas {
                let batch_id = held.batch.batch_id;
                let batch_name = held.handle.name.clone();
                *pending = Some(held);
                warn!(
                    batch_id = %batch_id,
                    batch_name = %batch_name,
                    "Commit refused: earlier sale not in the ledger"
                );
                return Err(CommitError::UnreconciledBatch { batch_id, batch_name });
            }

            // Same cart: the batch file already exists, only step 5 is retried.
            debug!(
                batch_id = %held.batch.batch_id,
                file = %held.handle.name,
                "Retrying ledger update"
            );
            return self.apply_written(cart, held.batch, held.handle, deltas, &mut *pending).await;
        }

        let snapshot = self.snapshot().await?;

        if let Err(shortfalls) = deltas.check_against(&snapshot) {
            warn!(
                shortfalls = shortfalls.len(),
                detail = %describe(&shortfalls),
                "Commit rejected: insufficient stock"
            );
            return Err(CommitError::InsufficientStock(shortfalls));
        }

        let batch = SaleBatch::from_lines(SaleBatchId::new(), sale_date, Utc::now(), cart.lines());
        debug!(batch_id = %batch.batch_id, lines = batch.records.len(), "Writing sale batch");

        let handle = self.write_batch(batch.clone()).await?;
        self.apply_written(cart, batch, handle, deltas, &mut *pending).await
    }

    /// Steps 5 and 6 for a batch already on disk. A failure parks the batch
    /// in `pending`.
    async fn apply_written(
        &self,
        cart: &mut Cart,
        batch: SaleBatch,
        handle: SaleBatchHandle,
        deltas: LedgerDeltas,
        pending: &mut Option<PendingCommit>,
    ) -> CommitResult<CommitReceipt> {
        let batch_id = batch.batch_id;

        if let Err(source) = self.db.ledger().apply_deltas(batch_id, &deltas).await {
            error!(
                batch_id = %batch_id,
                batch_name = %handle.name,
                error = %source,
                "Sale batch written but ledger update failed; run reconcile"
            );
            let batch_name = handle.name.clone();
            *pending = Some(PendingCommit {
                batch,
                handle,
                deltas,
            });
            return Err(CommitError::PartialCommit {
                batch_id,
                batch_name,
                source,
            });
        }

        let receipt = CommitReceipt {
            batch_id,
            batch_name: handle.name,
            path: handle.path,
            sale_date: batch.sale_date,
            total: batch.total_profit(),
            units: batch.units(),
            lines: batch.records.len(),
        };
        cart.clear();

        info!(
            batch_id = %receipt.batch_id,
            file = %receipt.batch_name,
            units = receipt.units,
            total = %receipt.total,
            "Sale committed"
        );
        Ok(receipt)
    }

    /// Checkout screen action: commits the session cart and, on success,
    /// returns the session to `Start`.
    pub async fn commit_session(&self, session: &mut Session) -> CommitResult<CommitReceipt> {
        if session.screen() != Screen::Checkout {
            return Err(CommitError::Navigation(CoreError::InvalidTransition {
                from: session.screen(),
                action: "commit",
            }));
        }

        let receipt = self.commit(session.cart_mut()).await?;
        session.finish_checkout().map_err(CommitError::Navigation)?;
        Ok(receipt)
    }

    /// Applies a persisted batch to the ledger. Re-applying is a no-op.
    pub async fn apply_batch(&self, batch: &SaleBatch) -> StoreResult<ApplyOutcome> {
        batch.validate()?;
        let deltas = LedgerDeltas::from_records(&batch.records);

        let mut pending = self.pending.lock().await;
        let outcome = self.db.ledger().apply_deltas(batch.batch_id, &deltas).await?;
        if pending.as_ref().map(|p| p.batch.batch_id) == Some(batch.batch_id) {
            *pending = None;
        }
        Ok(outcome)
    }

    /// Applies every stored batch the ledger has not seen, oldest name first.
    pub async fn reconcile(&self) -> StoreResult<ReconcileReport> {
        let mut pending = self.pending.lock().await;

        let scan = self.writer.scan()?;
        let ledger = self.db.ledger();
        let mut report = ReconcileReport {
            quarantined: scan.quarantined,
            ..ReconcileReport::default()
        };

        for stored in scan.batches {
            let batch_id = stored.batch.batch_id;
            if ledger.is_batch_applied(batch_id).await? {
                report.already_applied += 1;
                continue;
            }

            let deltas = LedgerDeltas::from_records(&stored.batch.records);
            match ledger.apply_deltas(batch_id, &deltas).await {
                Ok(ApplyOutcome::Applied { units, .. }) => {
                    info!(
                        batch_id = %batch_id,
                        file = %stored.handle.name,
                        units,
                        "Reconciled sale batch"
                    );
                    report.applied.push(stored.handle.name);
                }
                Ok(ApplyOutcome::AlreadyApplied) => report.already_applied += 1,
                Err(e) => {
                    warn!(
                        batch_id = %batch_id,
                        file = %stored.handle.name,
                        error = %e,
                        "Could not reconcile sale batch"
                    );
                    report.failed.push(FailedBatch {
                        batch_id,
                        batch_name: stored.handle.name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if let Some(held) = pending.as_ref() {
            if ledger.is_batch_applied(held.batch.batch_id).await? {
                *pending = None;
            }
        }

        info!(
            applied = report.applied.len(),
            already_applied = report.already_applied,
            failed = report.failed.len(),
            quarantined = report.quarantined.len(),
            "Reconcile finished"
        );
        Ok(report)
    }

    async fn write_batch(&self, batch: SaleBatch) -> StoreResult<SaleBatchHandle> {
        let writer = self.writer.clone();
        tokio::task::spawn_blocking(move || writer.append(&batch))
            .await
            .map_err(|e| StoreError::Internal(format!("batch writer task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use crate::sale_batch::batch_file_name;
    use stockbook_core::LedgerEntry;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, CommitCoordinator) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(DbConfig::new(dir.path().join("ledger.db")).create_if_missing(true))
            .await
            .unwrap();
        db.ledger()
            .provision(&[
                LedgerEntry::new("Shirt", "M", "SH-M", Money::from_cents(1250), 10, 2),
                LedgerEntry::new("Shirt", "L", "SH-L", Money::from_cents(1250), 5, 0),
                LedgerEntry::new("Hat", "OS", "HAT-OS", Money::from_cents(800), 3, 0),
            ])
            .await
            .unwrap();
        let writer = SaleBatchWriter::new(dir.path().join("sales"));
        (dir, CommitCoordinator::new(db, writer, 5))
    }

    async fn cart_of(coordinator: &CommitCoordinator, lines: &[(&str, &str, i64)]) -> Cart {
        let snapshot = coordinator.snapshot().await.unwrap();
        let mut cart = Cart::new();
        for (product, size, qty) in lines {
            cart.add(&snapshot, product, size, *qty).unwrap();
        }
        cart
    }

    fn assert_formulas(snapshot: &LedgerSnapshot) {
        for entry in snapshot.entries() {
            assert!(entry.remaining() >= 0);
            assert_eq!(entry.remaining(), entry.initial_quantity - entry.sold_quantity);
            assert_eq!(
                entry.accrued_profit(),
                entry.unit_cost.multiply_quantity(entry.sold_quantity)
            );
        }
    }

    #[tokio::test]
    async fn test_commit_updates_ledger_and_clears_cart() {
        let (_dir, coordinator) = setup().await;
        let mut cart = cart_of(&coordinator, &[("Shirt", "M", 3)]).await;

        let receipt = coordinator.commit(&mut cart).await.unwrap();

        assert!(cart.is_empty());
        assert_eq!(receipt.units, 3);
        assert_eq!(receipt.total, Money::from_cents(3750));
        assert_eq!(receipt.lines, 1);

        let entry = coordinator.snapshot().await.unwrap().get("Shirt", "M").cloned().unwrap();
        assert_eq!(entry.sold_quantity, 5);
        assert_eq!(entry.remaining(), 5);

        let batch = SaleBatchWriter::read(&receipt.path).unwrap();
        assert_eq!(batch.batch_id, receipt.batch_id);
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].quantity_sold, 3);
        assert!(coordinator.database().ledger().is_batch_applied(receipt.batch_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_oversell_against_fresh_ledger_is_rejected() {
        let (_dir, coordinator) = setup().await;
        let mut cart = cart_of(&coordinator, &[("Shirt", "M", 8)]).await;

        // Another sale drains stock after the cart was built.
        let mut other = cart_of(&coordinator, &[("Shirt", "M", 3)]).await;
        coordinator.commit(&mut other).await.unwrap();

        match coordinator.commit(&mut cart).await {
            Err(CommitError::InsufficientStock(shortfalls)) => {
                assert_eq!(shortfalls.len(), 1);
                assert_eq!(shortfalls[0].available, 5);
                assert_eq!(shortfalls[0].requested, 8);
            }
            other => panic!("expected InsufficientStock, got {:?}", other),
        }

        let entry = coordinator.snapshot().await.unwrap().get("Shirt", "M").cloned().unwrap();
        assert_eq!(entry.sold_quantity, 5);
        assert_eq!(cart.len(), 1);
    }

    #[tokio::test]
    async fn test_summed_lines_rejected_and_nothing_written() {
        let (dir, coordinator) = setup().await;
        let mut cart = cart_of(&coordinator, &[("Shirt", "L", 3), ("Shirt", "L", 3)]).await;
        let before = coordinator.snapshot().await.unwrap().entries().to_vec();

        match coordinator.commit(&mut cart).await {
            Err(CommitError::InsufficientStock(shortfalls)) => {
                assert_eq!(shortfalls.len(), 1);
                assert_eq!(shortfalls[0].requested, 6);
                assert_eq!(shortfalls[0].available, 5);
                assert_eq!(shortfalls[0].lines, vec![0, 1]);
            }
            other => panic!("expected InsufficientStock, got {:?}", other),
        }

        assert_eq!(coordinator.snapshot().await.unwrap().entries(), &before[..]);
        assert_eq!(cart.len(), 2);
        assert!(!dir.path().join("sales").exists());
        assert!(coordinator.database().ledger().processed_batches().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_requesting_more_than_remaining_keeps_sold() {
        let (_dir, coordinator) = setup().await;
        let snapshot = coordinator.snapshot().await.unwrap();

        // Cart::add already refuses 9 of 8, so stage it in two lines.
        let mut cart = Cart::new();
        cart.add(&snapshot, "Shirt", "M", 5).unwrap();
        cart.add(&snapshot, "Shirt", "M", 4).unwrap();

        assert!(matches!(
            coordinator.commit(&mut cart).await,
            Err(CommitError::InsufficientStock(_))
        ));
        let entry = coordinator.snapshot().await.unwrap().get("Shirt", "M").cloned().unwrap();
        assert_eq!(entry.sold_quantity, 2);
    }

    #[tokio::test]
    async fn test_empty_cart() {
        let (_dir, coordinator) = setup().await;
        let mut cart = Cart::new();
        assert!(matches!(
            coordinator.commit(&mut cart).await,
            Err(CommitError::EmptyCart)
        ));
    }

    #[tokio::test]
    async fn test_formulas_hold_after_many_commits() {
        let (_dir, coordinator) = setup().await;

        let sales: [Vec<(&str, &str, i64)>; 3] = [
            vec![("Shirt", "M", 2), ("Hat", "OS", 1)],
            vec![("Shirt", "L", 4)],
            vec![("Shirt", "M", 1), ("Shirt", "M", 1), ("Hat", "OS", 2)],
        ];
        for lines in sales {
            let mut cart = cart_of(&coordinator, &lines).await;
            coordinator.commit(&mut cart).await.unwrap();
        }

        let snapshot = coordinator.snapshot().await.unwrap();
        assert_formulas(&snapshot);
        assert_eq!(snapshot.remaining("Shirt", "M"), Some(4));
        assert_eq!(snapshot.remaining("Shirt", "L"), Some(1));
        assert_eq!(snapshot.remaining("Hat", "OS"), Some(0));
    }

    #[tokio::test]
    async fn test_same_day_commits_get_distinct_files() {
        let (_dir, coordinator) = setup().await;
        let day = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();

        let mut first = cart_of(&coordinator, &[("Shirt", "M", 1)]).await;
        let a = coordinator.commit_on(&mut first, day).await.unwrap();
        let mut second = cart_of(&coordinator, &[("Hat", "OS", 1)]).await;
        let b = coordinator.commit_on(&mut second, day).await.unwrap();

        assert_eq!(a.batch_name, batch_file_name(day, 0));
        assert_eq!(b.batch_name, batch_file_name(day, 1));

        let scan = coordinator.writer().scan().unwrap();
        assert_eq!(scan.batches.len(), 2);
        assert!(scan.quarantined.is_empty());
    }

    #[tokio::test]
    async fn test_apply_batch_twice_is_idempotent() {
        let (_dir, coordinator) = setup().await;
        let mut cart = cart_of(&coordinator, &[("Shirt", "L", 2)]).await;
        let receipt = coordinator.commit(&mut cart).await.unwrap();
        let after_commit = coordinator.snapshot().await.unwrap().entries().to_vec();

        let batch = SaleBatchWriter::read(&receipt.path).unwrap();
        assert_eq!(coordinator.apply_batch(&batch).await.unwrap(), ApplyOutcome::AlreadyApplied);
        assert_eq!(coordinator.apply_batch(&batch).await.unwrap(), ApplyOutcome::AlreadyApplied);

        assert_eq!(coordinator.snapshot().await.unwrap().entries(), &after_commit[..]);
    }

    #[tokio::test]
    async fn test_partial_commit_keeps_cart_and_reconcile_recovers() {
        let (_dir, coordinator) = setup().await;
        let pool = coordinator.database().pool().clone();
        block_updates(&pool).await;

        let mut cart = cart_of(&coordinator, &[("Hat", "OS", 2)]).await;
        let (batch_id, batch_name) = match coordinator.commit(&mut cart).await {
            Err(CommitError::PartialCommit { batch_id, batch_name, .. }) => (batch_id, batch_name),
            other => panic!("expected PartialCommit, got {:?}", other),
        };

        assert_eq!(cart.len(), 1);
        assert_eq!(coordinator.snapshot().await.unwrap().remaining("Hat", "OS"), Some(3));
        assert!(coordinator.writer().find(batch_id).unwrap().is_some());

        // Still blocked: reconcile reports the failure and changes nothing.
        let report = coordinator.reconcile().await.unwrap();
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].batch_name, batch_name);
        assert!(!report.is_clean());

        sqlx::query("DROP TRIGGER block_updates").execute(&pool).await.unwrap();

        let report = coordinator.reconcile().await.unwrap();
        assert_eq!(report.applied, vec![batch_name]);
        assert!(report.is_clean());
        assert_eq!(coordinator.snapshot().await.unwrap().remaining("Hat", "OS"), Some(1));

        let report = coordinator.reconcile().await.unwrap();
        assert!(report.applied.is_empty());
        assert_eq!(report.already_applied, 1);
    }

    async fn block_updates(pool: &sqlx::SqlitePool) {
        sqlx::query(
            "CREATE TRIGGER block_updates BEFORE UPDATE ON ledger_entries \
             BEGIN SELECT RAISE(ABORT, 'ledger is read-only'); END",
        )
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_retry_after_partial_commit_records_sale_once() {
        let (_dir, coordinator) = setup().await;
        let pool = coordinator.database().pool().clone();
        block_updates(&pool).await;

        let mut cart = cart_of(&coordinator, &[("Shirt", "M", 3)]).await;
        let (batch_id, batch_name) = match coordinator.commit(&mut cart).await {
            Err(CommitError::PartialCommit { batch_id, batch_name, .. }) => (batch_id, batch_name),
            other => panic!("expected PartialCommit, got {:?}", other),
        };

        // Still blocked: the retry fails again under the same batch id.
        match coordinator.commit(&mut cart).await {
            Err(CommitError::PartialCommit { batch_id: again, .. }) => assert_eq!(again, batch_id),
            other => panic!("expected PartialCommit, got {:?}", other),
        }

        sqlx::query("DROP TRIGGER block_updates").execute(&pool).await.unwrap();

        let receipt = coordinator.commit(&mut cart).await.unwrap();
        assert_eq!(receipt.batch_id, batch_id);
        assert_eq!(receipt.batch_name, batch_name);
        assert!(cart.is_empty());

        let report = coordinator.reconcile().await.unwrap();
        assert!(report.applied.is_empty());
        assert_eq!(report.already_applied, 1);

        let entry = coordinator.snapshot().await.unwrap().get("Shirt", "M").cloned().unwrap();
        assert_eq!(entry.sold_quantity, 5);
        assert_eq!(coordinator.writer().scan().unwrap().batches.len(), 1);
    }

    #[tokio::test]
    async fn test_other_cart_refused_until_pending_sale_reconciled() {
        let (_dir, coordinator) = setup().await;
        let pool = coordinator.database().pool().clone();
        block_updates(&pool).await;

        let mut cart = cart_of(&coordinator, &[("Hat", "OS", 1)]).await;
        let batch_id = match coordinator.commit(&mut cart).await {
            Err(CommitError::PartialCommit { batch_id, .. }) => batch_id,
            other => panic!("expected PartialCommit, got {:?}", other),
        };
        sqlx::query("DROP TRIGGER block_updates").execute(&pool).await.unwrap();

        let mut other = cart_of(&coordinator, &[("Shirt", "L", 2)]).await;
        match coordinator.commit(&mut other).await {
            Err(CommitError::UnreconciledBatch { batch_id: held, .. }) => {
                assert_eq!(held, batch_id)
            }
            other => panic!("expected UnreconciledBatch, got {:?}", other),
        }
        assert_eq!(other.len(), 1);
        assert_eq!(coordinator.writer().scan().unwrap().batches.len(), 1);

        let report = coordinator.reconcile().await.unwrap();
        assert_eq!(report.applied.len(), 1);

        coordinator.commit(&mut other).await.unwrap();
        let snapshot = coordinator.snapshot().await.unwrap();
        assert_eq!(snapshot.remaining("Hat", "OS"), Some(2));
        assert_eq!(snapshot.remaining("Shirt", "L"), Some(3));
    }

    #[tokio::test]
    async fn test_reconcile_reports_quarantined_files() {
        let (dir, coordinator) = setup().await;
        let sales = dir.path().join("sales");
        std::fs::create_dir_all(&sales).unwrap();
        std::fs::write(sales.join("2026-10-16.json"), "{ not json").unwrap();

        let report = coordinator.reconcile().await.unwrap();
        assert_eq!(report.quarantined.len(), 1);
        assert!(report.applied.is_empty());
    }

    #[tokio::test]
    async fn test_commit_session() {
        let (_dir, coordinator) = setup().await;
        let snapshot = coordinator.snapshot().await.unwrap();

        let mut session = Session::new();
        session.begin().unwrap();
        session.choose_product(&snapshot, "Shirt").unwrap();
        session.choose_size(&snapshot, "M").unwrap();
        session.confirm_line(&snapshot, 3).unwrap();

        assert!(matches!(
            coordinator.commit_session(&mut session).await,
            Err(CommitError::Navigation(CoreError::InvalidTransition { .. }))
        ));

        session.checkout().unwrap();
        let receipt = coordinator.commit_session(&mut session).await.unwrap();

        assert_eq!(receipt.units, 3);
        assert_eq!(session.screen(), Screen::Start);
        assert!(session.cart().is_empty());
    }

    #[tokio::test]
    async fn test_open_missing_ledger_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StoreConfig::default();
        config.ledger.path = dir.path().join("missing.db");
        config.sales.dir = dir.path().join("sales");

        match CommitCoordinator::open(&config).await {
            Err(CommitError::NotFound(path)) => assert_eq!(path, config.ledger.path),
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
    }
}
