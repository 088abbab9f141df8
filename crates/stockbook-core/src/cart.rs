//! # Cart
//!
//! The operator's staging area for one sale.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Operator Action          Session Call            Cart Change           │
//! │  ───────────────          ────────────            ───────────           │
//! │                                                                         │
//! │  Confirm line ───────────► confirm_line() ──────► lines.push(line)     │
//! │                                                                         │
//! │  Remove line ────────────► remove_line(i) ──────► lines.remove(i)      │
//! │                                                                         │
//! │  Clear ──────────────────► clear_cart() ────────► lines.clear()        │
//! │                                                                         │
//! │  Commit ─────────────────► CommitCoordinator ───► cleared on success   │
//! │                                                                         │
//! │  NOTE: The cart never touches the ledger. It only reads a snapshot.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::ledger::{LedgerDeltas, LedgerSnapshot};
use crate::money::Money;
use crate::types::ItemKey;
use crate::MAX_CART_LINES;

/// One staged line.
///
/// ## Cost Freezing
/// `sku` and `unit_cost` are copied from the ledger entry when the line is
/// added, so the line keeps its profit even if the snapshot is refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: String,
    pub sku: String,
    pub size: String,
    pub quantity: i64,
    pub unit_cost: Money,
}

impl CartLine {
    /// `quantity × unit_cost`.
    pub fn line_profit(&self) -> Money {
        self.unit_cost.multiply_quantity(self.quantity)
    }

    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.product.clone(), self.size.clone())
    }
}

/// Ordered cart lines. Lines for the same item are not merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Stages a line after checking it against the snapshot.
    ///
    /// ## Errors
    /// - `InvalidQuantity` when `quantity ≤ 0`
    /// - `UnknownItem` when the ledger has no such (product, size)
    /// - `InsufficientStock` when this line alone exceeds the remaining stock
    /// - `CartTooLarge` when the cart already holds `MAX_CART_LINES` lines
    pub fn add(
        &mut self,
        ledger: &LedgerSnapshot,
        product: &str,
        size: &str,
        quantity: i64,
    ) -> CoreResult<&CartLine> {
        if quantity <= 0 {
            return Err(CoreError::InvalidQuantity(quantity));
        }

        let entry = ledger
            .get(product, size)
            .ok_or_else(|| CoreError::UnknownItem {
                product: product.to_string(),
                size: size.to_string(),
            })?;

        let available = entry.remaining();
        if quantity > available {
            return Err(CoreError::InsufficientStock {
                product: product.to_string(),
                size: size.to_string(),
                available,
                requested: quantity,
            });
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        self.lines.push(CartLine {
            product: entry.product.clone(),
            sku: entry.sku.clone(),
            size: entry.size.clone(),
            quantity,
            unit_cost: entry.unit_cost,
        });

        let last = self.lines.len() - 1;
        Ok(&self.lines[last])
    }

    /// Removes and returns the line at `index`.
    pub fn remove_at(&mut self, index: usize) -> CoreResult<CartLine> {
        if index >= self.lines.len() {
            return Err(CoreError::IndexOutOfRange {
                index,
                len: self.lines.len(),
            });
        }
        Ok(self.lines.remove(index))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of line profits.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_profit).sum()
    }

    /// Per-item sums used by the commit check.
    pub fn deltas(&self) -> LedgerDeltas {
        LedgerDeltas::from_lines(&self.lines)
    }
}

/// Cart summary for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub line_count: usize,
    pub total_quantity: i64,
    pub total: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            line_count: cart.len(),
            total_quantity: cart.total_quantity(),
            total: cart.total(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LedgerEntry;

    fn ledger() -> LedgerSnapshot {
        LedgerSnapshot::from_entries(vec![
            LedgerEntry::new("Shirt", "M", "SH-M", Money::from_cents(1250), 10, 2),
            LedgerEntry::new("Cap", "L", "CA-L", Money::from_cents(500), 5, 0),
        ])
    }

    #[test]
    fn test_cart_add_line() {
        let mut cart = Cart::new();
        let line = cart.add(&ledger(), "Shirt", "M", 3).unwrap();

        assert_eq!(line.sku, "SH-M");
        assert_eq!(line.line_profit(), Money::from_cents(3750));
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total(), Money::from_cents(3750));
    }

    #[test]
    fn test_cart_keeps_duplicate_lines() {
        let ledger = ledger();
        let mut cart = Cart::new();

        cart.add(&ledger, "Cap", "L", 3).unwrap();
        cart.add(&ledger, "Cap", "L", 3).unwrap();

        // Each line fits on its own; the aggregate is the commit's problem.
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.total_quantity(), 6);
        assert_eq!(cart.deltas().total_units(), 6);
    }

    #[test]
    fn test_cart_add_rejections() {
        let ledger = ledger();
        let mut cart = Cart::new();

        assert_eq!(
            cart.add(&ledger, "Shirt", "M", 0).unwrap_err(),
            CoreError::InvalidQuantity(0)
        );
        assert!(matches!(
            cart.add(&ledger, "Shirt", "XL", 1).unwrap_err(),
            CoreError::UnknownItem { .. }
        ));
        assert_eq!(
            cart.add(&ledger, "Shirt", "M", 9).unwrap_err(),
            CoreError::InsufficientStock {
                product: "Shirt".to_string(),
                size: "M".to_string(),
                available: 8,
                requested: 9,
            }
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_line_limit() {
        let ledger = LedgerSnapshot::from_entries(vec![LedgerEntry::new(
            "Sock",
            "M",
            "SO-M",
            Money::from_cents(100),
            1_000,
            0,
        )]);
        let mut cart = Cart::new();
        for _ in 0..MAX_CART_LINES {
            cart.add(&ledger, "Sock", "M", 1).unwrap();
        }
        assert_eq!(
            cart.add(&ledger, "Sock", "M", 1).unwrap_err(),
            CoreError::CartTooLarge {
                max: MAX_CART_LINES
            }
        );
    }

    #[test]
    fn test_cart_remove_at() {
        let ledger = ledger();
        let mut cart = Cart::new();
        cart.add(&ledger, "Shirt", "M", 1).unwrap();
        cart.add(&ledger, "Cap", "L", 2).unwrap();

        let removed = cart.remove_at(0).unwrap();
        assert_eq!(removed.product, "Shirt");
        assert_eq!(cart.lines()[0].product, "Cap");

        assert_eq!(
            cart.remove_at(5).unwrap_err(),
            CoreError::IndexOutOfRange { index: 5, len: 1 }
        );
    }

    #[test]
    fn test_cart_clear_and_totals() {
        let ledger = ledger();
        let mut cart = Cart::new();
        cart.add(&ledger, "Shirt", "M", 2).unwrap();
        cart.add(&ledger, "Cap", "L", 1).unwrap();

        let totals = CartTotals::from(&cart);
        assert_eq!(totals.line_count, 2);
        assert_eq!(totals.total_quantity, 3);
        assert_eq!(totals.total, Money::from_cents(3000));

        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.total().is_zero());
    }
}
