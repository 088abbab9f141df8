//! # Domain Types
//!
//! Core domain types used throughout Stockbook.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  LedgerEntry    │   │   SaleBatch     │   │   SaleRecord    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  product, size  │   │  batch_id(UUID) │   │  batch_id (FK)  │       │
//! │  │  sku            │   │  sale_date      │   │  product, size  │       │
//! │  │  unit_cost      │   │  created_at     │   │  quantity_sold  │       │
//! │  │  initial, sold  │   │  records ───────┼──►│  line_profit    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    ItemKey      │   │   StockLevel    │   │   SaleBatchId   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  (product,size) │   │  SoldOut        │   │  Uuid v4        │       │
//! │  │  unique per     │   │  Low(n)         │   │  idempotence    │       │
//! │  │  ledger         │   │  Available(n)   │   │  key            │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Derived, Never Stored
//! `remaining()` and `accrued_profit()` are methods on `LedgerEntry`, not
//! fields. The only stored counters are `initial_quantity` and
//! `sold_quantity`, so the two formulas hold for every value of the type.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::CartLine;
use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{
    validate_ledger_counts, validate_product_name, validate_quantity, validate_size,
    validate_sku, validate_unit_cost_cents, ValidationResult,
};

// =============================================================================
// Item Key
// =============================================================================

/// The identity of a ledger entry: one row per (product, size).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    pub product: String,
    pub size: String,
}

impl ItemKey {
    pub fn new(product: impl Into<String>, size: impl Into<String>) -> Self {
        ItemKey {
            product: product.into(),
            size: size.into(),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.product, self.size)
    }
}

// =============================================================================
// Stock Level
// =============================================================================

/// Classification of a remaining quantity for display and alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "level", content = "remaining", rename_all = "snake_case")]
pub enum StockLevel {
    /// Nothing left.
    SoldOut,
    /// At or below the low-stock threshold.
    Low(i64),
    /// Comfortably in stock.
    Available(i64),
}

impl StockLevel {
    /// Classifies a remaining quantity against a threshold.
    ///
    /// ```rust
    /// use stockbook_core::StockLevel;
    ///
    /// assert_eq!(StockLevel::classify(0, 5), StockLevel::SoldOut);
    /// assert_eq!(StockLevel::classify(5, 5), StockLevel::Low(5));
    /// assert_eq!(StockLevel::classify(6, 5), StockLevel::Available(6));
    /// ```
    pub fn classify(remaining: i64, threshold: i64) -> Self {
        if remaining <= 0 {
            StockLevel::SoldOut
        } else if remaining <= threshold {
            StockLevel::Low(remaining)
        } else {
            StockLevel::Available(remaining)
        }
    }

    pub fn remaining(&self) -> i64 {
        match self {
            StockLevel::SoldOut => 0,
            StockLevel::Low(n) | StockLevel::Available(n) => *n,
        }
    }

    pub fn is_sold_out(&self) -> bool {
        matches!(self, StockLevel::SoldOut)
    }
}

impl fmt::Display for StockLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockLevel::SoldOut => write!(f, "sold out"),
            StockLevel::Low(n) => write!(f, "{} left (low)", n),
            StockLevel::Available(n) => write!(f, "{} left", n),
        }
    }
}

// =============================================================================
// Ledger Entry
// =============================================================================

/// One row of the master inventory ledger.
///
/// ## Invariants
/// - `initial_quantity ≥ 0`, fixed after provisioning
/// - `0 ≤ sold_quantity ≤ initial_quantity`, never decreases
/// - `unit_cost ≥ 0`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub product: String,
    pub size: String,
    pub sku: String,
    pub unit_cost: Money,
    pub initial_quantity: i64,
    pub sold_quantity: i64,
}

impl LedgerEntry {
    pub fn new(
        product: impl Into<String>,
        size: impl Into<String>,
        sku: impl Into<String>,
        unit_cost: Money,
        initial_quantity: i64,
        sold_quantity: i64,
    ) -> Self {
        LedgerEntry {
            product: product.into(),
            size: size.into(),
            sku: sku.into(),
            unit_cost,
            initial_quantity,
            sold_quantity,
        }
    }

    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.product.clone(), self.size.clone())
    }

    /// `initial_quantity − sold_quantity`.
    #[inline]
    pub fn remaining(&self) -> i64 {
        self.initial_quantity - self.sold_quantity
    }

    /// `sold_quantity × unit_cost`.
    #[inline]
    pub fn accrued_profit(&self) -> Money {
        self.unit_cost.multiply_quantity(self.sold_quantity)
    }

    pub fn stock_level(&self, threshold: i64) -> StockLevel {
        StockLevel::classify(self.remaining(), threshold)
    }

    /// Checks every field rule and the counter relationship.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_product_name(&self.product)?;
        validate_size(&self.size)?;
        validate_sku(&self.sku)?;
        validate_unit_cost_cents(self.unit_cost.cents())?;
        validate_ledger_counts(self.initial_quantity, self.sold_quantity)
    }
}

// =============================================================================
// Sale Batch ID
// =============================================================================

/// Identifier of one committed cart. Doubles as the idempotence key when
/// the ledger applies a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaleBatchId(Uuid);

impl SaleBatchId {
    /// Generates a fresh random (v4) id.
    pub fn new() -> Self {
        SaleBatchId(Uuid::new_v4())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        SaleBatchId(uuid)
    }

    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SaleBatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SaleBatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for SaleBatchId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(SaleBatchId)
    }
}

// =============================================================================
// Sale Record
// =============================================================================

/// One sold cart line, as persisted inside a sale batch file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaleRecord {
    pub batch_id: SaleBatchId,
    pub product: String,
    pub sku: String,
    pub size: String,
    pub quantity_sold: i64,
    #[serde(rename = "unit_cost_cents")]
    pub unit_cost: Money,
    #[serde(rename = "line_profit_cents")]
    pub line_profit: Money,
    pub sale_date: NaiveDate,
}

impl SaleRecord {
    pub fn from_line(line: &CartLine, batch_id: SaleBatchId, sale_date: NaiveDate) -> Self {
        SaleRecord {
            batch_id,
            product: line.product.clone(),
            sku: line.sku.clone(),
            size: line.size.clone(),
            quantity_sold: line.quantity,
            unit_cost: line.unit_cost,
            line_profit: line.line_profit(),
            sale_date,
        }
    }

    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.product.clone(), self.size.clone())
    }
}

// =============================================================================
// Sale Batch
// =============================================================================

/// All records produced by one committed cart. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaleBatch {
    pub batch_id: SaleBatchId,
    pub sale_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub records: Vec<SaleRecord>,
}

impl SaleBatch {
    /// Builds a batch with one record per cart line, in cart order.
    pub fn from_lines(
        batch_id: SaleBatchId,
        sale_date: NaiveDate,
        created_at: DateTime<Utc>,
        lines: &[CartLine],
    ) -> Self {
        SaleBatch {
            batch_id,
            sale_date,
            created_at,
            records: lines
                .iter()
                .map(|line| SaleRecord::from_line(line, batch_id, sale_date))
                .collect(),
        }
    }

    /// Total units across all records.
    pub fn units(&self) -> i64 {
        self.records.iter().map(|r| r.quantity_sold).sum()
    }

    /// Sum of line profits.
    pub fn total_profit(&self) -> Money {
        self.records.iter().map(|r| r.line_profit).sum()
    }

    /// Schema rules a batch must satisfy before it may touch the ledger.
    ///
    /// ## Rules
    /// - at least one record
    /// - every record carries the header's batch id and sale date
    /// - `quantity_sold ≥ 1`, `unit_cost ≥ 0`
    /// - `line_profit == quantity_sold × unit_cost`
    pub fn validate(&self) -> ValidationResult<()> {
        if self.records.is_empty() {
            return Err(ValidationError::Required {
                field: "records".to_string(),
            });
        }

        for (index, record) in self.records.iter().enumerate() {
            let field = |name: &str| format!("records[{}].{}", index, name);

            if record.batch_id != self.batch_id {
                return Err(ValidationError::Inconsistent {
                    field: field("batch_id"),
                    reason: format!("{} does not match batch {}", record.batch_id, self.batch_id),
                });
            }
            if record.sale_date != self.sale_date {
                return Err(ValidationError::Inconsistent {
                    field: field("sale_date"),
                    reason: format!(
                        "{} does not match batch date {}",
                        record.sale_date, self.sale_date
                    ),
                });
            }

            validate_product_name(&record.product)?;
            validate_size(&record.size)?;
            validate_sku(&record.sku)?;
            validate_quantity(record.quantity_sold)?;
            validate_unit_cost_cents(record.unit_cost.cents())?;

            let expected = record.unit_cost.multiply_quantity(record.quantity_sold);
            if record.line_profit != expected {
                return Err(ValidationError::Inconsistent {
                    field: field("line_profit_cents"),
                    reason: format!("expected {}, found {}", expected, record.line_profit),
                });
            }
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
