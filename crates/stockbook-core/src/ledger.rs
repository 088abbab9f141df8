//! # Ledger Snapshot and Deltas
//!
//! In-memory view of the master ledger plus the per-item quantity changes a
//! sale will apply to it.
//!
//! ## Commit-Time Check
//! ```text
//! Cart lines                     LedgerDeltas (summed per key)
//! ──────────                     ─────────────────────────────
//! [0] Shirt M ×3   ─┐
//! [1] Shirt M ×3   ─┴──────────► Shirt (M)  +6   lines [0, 1]
//! [2] Cap   L ×1   ────────────► Cap (L)    +1   lines [2]
//!                                     │
//!                                     ▼  check_against(snapshot)
//!                            Shirt (M): remaining 5 < 6
//!                                     │
//!                                     ▼
//!                 Err([Shortfall { Shirt, M, available 5, requested 6, lines [0,1] }])
//! ```
//!
//! A cart line is only checked against the snapshot on its own at add
//! time. Duplicate lines for the same key are legal and are summed here.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cart::CartLine;
use crate::types::{ItemKey, LedgerEntry, SaleRecord, StockLevel};
use crate::{LOW_STOCK_THRESHOLD, SIZE_ORDER};

// =============================================================================
// Size Ordering
// =============================================================================

fn size_rank(size: &str) -> usize {
    SIZE_ORDER
        .iter()
        .position(|known| known.eq_ignore_ascii_case(size))
        .unwrap_or(SIZE_ORDER.len())
}

/// Orders sizes the way the shop lists them: `XS, S, M, L, XL, 2XL .. 5XL`
/// first, then any other labels in the order they were given.
///
/// ```rust
/// use stockbook_core::ledger::order_sizes;
///
/// let sorted = order_sizes(["XL", "38", "S", "M", "36"]);
/// assert_eq!(sorted, vec!["S", "M", "XL", "38", "36"]);
/// ```
pub fn order_sizes<'a, I>(sizes: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut sizes: Vec<String> = sizes.into_iter().map(str::to_string).collect();
    // Stable sort keeps first-seen order among unknown labels.
    sizes.sort_by_key(|s| size_rank(s));
    sizes
}

// =============================================================================
// Ledger Snapshot
// =============================================================================

/// A size of one product with its remaining stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeAvailability {
    pub size: String,
    pub sku: String,
    pub remaining: i64,
    pub level: StockLevel,
}

/// Point-in-time copy of every ledger entry.
///
/// Entries keep the order they were loaded in; product listings follow
/// that order.
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    entries: Vec<LedgerEntry>,
    index: HashMap<ItemKey, usize>,
    low_stock_threshold: i64,
}

impl LedgerSnapshot {
    /// Builds a snapshot. A repeated key replaces the earlier entry in place.
    pub fn from_entries(entries: Vec<LedgerEntry>) -> Self {
        let mut snapshot = LedgerSnapshot {
            entries: Vec::with_capacity(entries.len()),
            index: HashMap::with_capacity(entries.len()),
            low_stock_threshold: LOW_STOCK_THRESHOLD,
        };

        for entry in entries {
            let key = entry.key();
            match snapshot.index.get(&key) {
                Some(&pos) => snapshot.entries[pos] = entry,
                None => {
                    snapshot.index.insert(key, snapshot.entries.len());
                    snapshot.entries.push(entry);
                }
            }
        }

        snapshot
    }

    /// Sets the threshold used when classifying sizes for display.
    pub fn with_low_stock_threshold(mut self, threshold: i64) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    pub fn low_stock_threshold(&self) -> i64 {
        self.low_stock_threshold
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, product: &str, size: &str) -> Option<&LedgerEntry> {
        self.get_key(&ItemKey::new(product, size))
    }

    pub fn get_key(&self, key: &ItemKey) -> Option<&LedgerEntry> {
        self.index.get(key).map(|&pos| &self.entries[pos])
    }

    /// Remaining quantity, or `None` for an unknown key.
    pub fn remaining(&self, product: &str, size: &str) -> Option<i64> {
        self.get(product, size).map(LedgerEntry::remaining)
    }

    /// Distinct product names, first-seen order.
    pub fn products(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&entry.product.as_str()) {
                seen.push(entry.product.as_str());
            }
        }
        seen
    }

    /// Products that still have at least one size in stock.
    pub fn products_in_stock(&self) -> Vec<&str> {
        self.products()
            .into_iter()
            .filter(|p| self.has_stock(p))
            .collect()
    }

    /// True when some size of `product` has remaining > 0.
    pub fn has_stock(&self, product: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.product == product && e.remaining() > 0)
    }

    /// Every size of `product` in shop order, sold-out sizes included.
    pub fn available_sizes(&self, product: &str) -> Vec<SizeAvailability> {
        let mut sizes: Vec<SizeAvailability> = self
            .entries
            .iter()
            .filter(|e| e.product == product)
            .map(|e| SizeAvailability {
                size: e.size.clone(),
                sku: e.sku.clone(),
                remaining: e.remaining(),
                level: e.stock_level(self.low_stock_threshold),
            })
            .collect();
        sizes.sort_by_key(|s| size_rank(&s.size));
        sizes
    }

    /// Entries with remaining ≤ `threshold`, lowest stock first.
    pub fn low_stock(&self, threshold: i64) -> Vec<&LedgerEntry> {
        let mut low: Vec<&LedgerEntry> = self
            .entries
            .iter()
            .filter(|e| e.remaining() <= threshold)
            .collect();
        low.sort_by(|a, b| {
            a.remaining()
                .cmp(&b.remaining())
                .then_with(|| a.product.cmp(&b.product))
                .then_with(|| size_rank(&a.size).cmp(&size_rank(&b.size)))
        });
        low
    }
}

// =============================================================================
// Deltas
// =============================================================================

/// Units to add to one entry's sold counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerDelta {
    pub key: ItemKey,
    pub sku: String,
    pub quantity: i64,
    /// Indices of the cart lines (or batch records) that contributed.
    pub lines: Vec<usize>,
}

/// Quantity changes for one sale, summed per `(product, size)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerDeltas {
    deltas: BTreeMap<ItemKey, LedgerDelta>,
}

impl LedgerDeltas {
    pub fn from_lines(lines: &[CartLine]) -> Self {
        let mut deltas = LedgerDeltas::default();
        for (index, line) in lines.iter().enumerate() {
            deltas.push(line.key(), &line.sku, line.quantity, index);
        }
        deltas
    }

    pub fn from_records(records: &[SaleRecord]) -> Self {
        let mut deltas = LedgerDeltas::default();
        for (index, record) in records.iter().enumerate() {
            deltas.push(record.key(), &record.sku, record.quantity_sold, index);
        }
        deltas
    }

    fn push(&mut self, key: ItemKey, sku: &str, quantity: i64, index: usize) {
        let delta = self
            .deltas
            .entry(key.clone())
            .or_insert_with(|| LedgerDelta {
                key,
                sku: sku.to_string(),
                quantity: 0,
                lines: Vec::new(),
            });
        delta.quantity += quantity;
        delta.lines.push(index);
    }

    /// Deltas in key order.
    pub fn iter(&self) -> impl Iterator<Item = &LedgerDelta> {
        self.deltas.values()
    }

    pub fn get(&self, key: &ItemKey) -> Option<&LedgerDelta> {
        self.deltas.get(key)
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    pub fn total_units(&self) -> i64 {
        self.deltas.values().map(|d| d.quantity).sum()
    }

    /// Checks every summed delta against the snapshot.
    ///
    /// Collects all shortfalls rather than stopping at the first one. A key
    /// missing from the snapshot is a shortfall with `available = 0`.
    pub fn check_against(&self, snapshot: &LedgerSnapshot) -> Result<(), Vec<Shortfall>> {
        let shortfalls: Vec<Shortfall> = self
            .deltas
            .values()
            .filter_map(|delta| {
                let available = snapshot
                    .get_key(&delta.key)
                    .map(LedgerEntry::remaining)
                    .unwrap_or(0);
                (delta.quantity > available).then(|| Shortfall {
                    product: delta.key.product.clone(),
                    size: delta.key.size.clone(),
                    sku: delta.sku.clone(),
                    available,
                    requested: delta.quantity,
                    lines: delta.lines.clone(),
                })
            })
            .collect();

        if shortfalls.is_empty() {
            Ok(())
        } else {
            Err(shortfalls)
        }
    }
}

impl<'a> IntoIterator for &'a LedgerDeltas {
    type Item = &'a LedgerDelta;
    type IntoIter = std::collections::btree_map::Values<'a, ItemKey, LedgerDelta>;

    fn into_iter(self) -> Self::IntoIter {
        self.deltas.values()
    }
}

// =============================================================================
// Shortfall
// =============================================================================

/// One key whose summed request exceeds what the ledger has left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortfall {
    pub product: String,
    pub size: String,
    pub sku: String,
    pub available: i64,
    pub requested: i64,
    pub lines: Vec<usize>,
}

impl fmt::Display for Shortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): requested {}, available {}",
            self.product, self.size, self.requested, self.available
        )?;
        if !self.lines.is_empty() {
            let lines: Vec<String> = self.lines.iter().map(|i| (i + 1).to_string()).collect();
            write!(f, " (cart lines {})", lines.join(", "))?;
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
