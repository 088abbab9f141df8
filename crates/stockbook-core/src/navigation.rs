//! # Navigation
//!
//! Screen state machine for one operator session.
//!
//! ## Screens
//! ```text
//!  ┌───────┐ begin ┌─────────┐ choose_product ┌──────┐ choose_size ┌─────────┐
//!  │ Start │──────►│ Product │───────────────►│ Size │────────────►│ Confirm │
//!  └───────┘       └─────────┘                └──────┘             └────┬────┘
//!      ▲                ▲  ▲   back_to_products  │                      │
//!      │                │  └─────────────────────┘                      │
//!      │                │        back_to_products / clear_cart          │ confirm_line
//!      │                └──────────────────────────────┐                ▼
//!      │                                          ┌──────────┐     ┌────────┐
//!      └──────────── commit (finish_checkout) ────│ Checkout │◄───►│  Cart  │
//!                                                 └──────────┘     └────────┘
//!                                         checkout / return_to_cart
//! ```
//!
//! `reset` goes back to `Start` from anywhere and discards the cart.
//! `view_cart` jumps to `Cart` from anywhere when the cart has lines.
//!
//! No transition reads or writes the ledger store; guards look at the
//! snapshot the caller passes in.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartLine};
use crate::error::{CoreError, CoreResult};
use crate::ledger::{LedgerSnapshot, SizeAvailability};

/// Where the operator currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Start,
    SelectProduct,
    SelectSize,
    ConfirmLine,
    Cart,
    Checkout,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Screen::Start => "start",
            Screen::SelectProduct => "product",
            Screen::SelectSize => "size",
            Screen::ConfirmLine => "confirm",
            Screen::Cart => "cart",
            Screen::Checkout => "checkout",
        };
        f.write_str(name)
    }
}

/// One operator's session: current screen, selections and cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    screen: Screen,
    product: Option<String>,
    size: Option<String>,
    cart: Cart,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Session {
            screen: Screen::Start,
            product: None,
            size: None,
            cart: Cart::new(),
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn selected_product(&self) -> Option<&str> {
        self.product.as_deref()
    }

    pub fn selected_size(&self) -> Option<&str> {
        self.size.as_deref()
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Mutable cart access for the commit step.
    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    fn require(&self, allowed: &[Screen], action: &'static str) -> CoreResult<()> {
        if allowed.contains(&self.screen) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                from: self.screen,
                action,
            })
        }
    }

    fn require_cart_lines(&self) -> CoreResult<()> {
        if self.cart.is_empty() {
            Err(CoreError::EmptyCart)
        } else {
            Ok(())
        }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    pub fn begin(&mut self) -> CoreResult<()> {
        self.require(&[Screen::Start], "begin")?;
        self.screen = Screen::SelectProduct;
        Ok(())
    }

    /// Selects a product that still has at least one size in stock.
    pub fn choose_product(&mut self, ledger: &LedgerSnapshot, product: &str) -> CoreResult<()> {
        self.require(&[Screen::SelectProduct], "choose a product")?;
        if !ledger.has_stock(product) {
            return Err(CoreError::NoStockAvailable {
                product: product.to_string(),
            });
        }
        self.product = Some(product.to_string());
        self.size = None;
        self.screen = Screen::SelectSize;
        Ok(())
    }

    /// Selects a size of the chosen product with remaining > 0.
    pub fn choose_size(&mut self, ledger: &LedgerSnapshot, size: &str) -> CoreResult<()> {
        self.require(&[Screen::SelectSize], "choose a size")?;
        let product = self.product.clone().unwrap_or_default();

        let remaining = ledger
            .remaining(&product, size)
            .ok_or_else(|| CoreError::UnknownItem {
                product: product.clone(),
                size: size.to_string(),
            })?;
        if remaining <= 0 {
            return Err(CoreError::InsufficientStock {
                product,
                size: size.to_string(),
                available: remaining,
                requested: 1,
            });
        }

        self.size = Some(size.to_string());
        self.screen = Screen::ConfirmLine;
        Ok(())
    }

    /// Adds the selected item to the cart and shows the cart.
    ///
    /// On a rejected quantity the session stays on `ConfirmLine` so the
    /// operator can enter another amount.
    pub fn confirm_line(
        &mut self,
        ledger: &LedgerSnapshot,
        quantity: i64,
    ) -> CoreResult<&CartLine> {
        self.require(&[Screen::ConfirmLine], "confirm a line")?;
        let product = self.product.clone().unwrap_or_default();
        let size = self.size.clone().unwrap_or_default();

        self.cart.add(ledger, &product, &size, quantity)?;

        self.product = None;
        self.size = None;
        self.screen = Screen::Cart;

        let last = self.cart.len() - 1;
        Ok(&self.cart.lines()[last])
    }

    pub fn back_to_products(&mut self) -> CoreResult<()> {
        self.require(
            &[Screen::SelectSize, Screen::ConfirmLine, Screen::Cart],
            "go back to products",
        )?;
        self.product = None;
        self.size = None;
        self.screen = Screen::SelectProduct;
        Ok(())
    }

    pub fn view_cart(&mut self) -> CoreResult<()> {
        self.require_cart_lines()?;
        self.product = None;
        self.size = None;
        self.screen = Screen::Cart;
        Ok(())
    }

    pub fn checkout(&mut self) -> CoreResult<()> {
        self.require(&[Screen::Cart], "checkout")?;
        self.require_cart_lines()?;
        self.screen = Screen::Checkout;
        Ok(())
    }

    pub fn return_to_cart(&mut self) -> CoreResult<()> {
        self.require(&[Screen::Checkout], "return to the cart")?;
        self.screen = Screen::Cart;
        Ok(())
    }

    pub fn remove_line(&mut self, index: usize) -> CoreResult<CartLine> {
        self.require(&[Screen::Cart], "remove a line")?;
        self.cart.remove_at(index)
    }

    /// Empties the cart and returns to product selection.
    pub fn clear_cart(&mut self) -> CoreResult<()> {
        self.require(&[Screen::Cart], "clear the cart")?;
        self.cart.clear();
        self.screen = Screen::SelectProduct;
        Ok(())
    }

    /// Marks a successful commit: back to `Start` with a fresh cart.
    pub fn finish_checkout(&mut self) -> CoreResult<()> {
        self.require(&[Screen::Checkout], "finish checkout")?;
        self.reset();
        Ok(())
    }

    /// Discards everything and returns to `Start`.
    pub fn reset(&mut self) {
        *self = Session::new();
    }

    /// Sizes of the selected product, shop-ordered, with stock levels.
    pub fn available_sizes(&self, ledger: &LedgerSnapshot) -> CoreResult<Vec<SizeAvailability>> {
        match self.product.as_deref() {
            Some(product) => Ok(ledger.available_sizes(product)),
            None => Err(CoreError::InvalidTransition {
                from: self.screen,
                action: "list sizes",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::LedgerEntry;

    fn ledger() -> LedgerSnapshot {
        LedgerSnapshot::from_entries(vec![
            LedgerEntry::new("Shirt", "L", "SH-L", Money::from_cents(1250), 4, 0),
            LedgerEntry::new("Shirt", "M", "SH-M", Money::from_cents(1250), 10, 2),
            LedgerEntry::new("Shirt", "S", "SH-S", Money::from_cents(1250), 3, 3),
            LedgerEntry::new("Hoodie", "M", "HO-M", Money::from_cents(3000), 2, 2),
        ])
    }

    fn at_cart(ledger: &LedgerSnapshot) -> Session {
        let mut session = Session::new();
        session.begin().unwrap();
        session.choose_product(ledger, "Shirt").unwrap();
        session.choose_size(ledger, "M").unwrap();
        session.confirm_line(ledger, 2).unwrap();
        session
    }

    #[test]
    fn test_happy_path_to_checkout() {
        let ledger = ledger();
        let mut session = Session::new();
        assert_eq!(session.screen(), Screen::Start);

        session.begin().unwrap();
        assert_eq!(session.screen(), Screen::SelectProduct);

        session.choose_product(&ledger, "Shirt").unwrap();
        assert_eq!(session.screen(), Screen::SelectSize);
        assert_eq!(session.selected_product(), Some("Shirt"));

        session.choose_size(&ledger, "M").unwrap();
        assert_eq!(session.screen(), Screen::ConfirmLine);

        let line = session.confirm_line(&ledger, 3).unwrap();
        assert_eq!(line.quantity, 3);
        assert_eq!(session.screen(), Screen::Cart);
        assert_eq!(session.cart().len(), 1);

        session.checkout().unwrap();
        assert_eq!(session.screen(), Screen::Checkout);

        session.finish_checkout().unwrap();
        assert_eq!(session.screen(), Screen::Start);
        assert!(session.cart().is_empty());
    }

    #[test]
    fn test_sold_out_product_is_rejected() {
        let ledger = ledger();
        let mut session = Session::new();
        session.begin().unwrap();

        assert_eq!(
            session.choose_product(&ledger, "Hoodie").unwrap_err(),
            CoreError::NoStockAvailable {
                product: "Hoodie".to_string()
            }
        );
        assert!(session.choose_product(&ledger, "Ghost").is_err());
        assert_eq!(session.screen(), Screen::SelectProduct);
    }

    #[test]
    fn test_sold_out_size_is_rejected() {
        let ledger = ledger();
        let mut session = Session::new();
        session.begin().unwrap();
        session.choose_product(&ledger, "Shirt").unwrap();

        assert!(matches!(
            session.choose_size(&ledger, "S").unwrap_err(),
            CoreError::InsufficientStock { available: 0, .. }
        ));
        assert!(matches!(
            session.choose_size(&ledger, "XL").unwrap_err(),
            CoreError::UnknownItem { .. }
        ));
        assert_eq!(session.screen(), Screen::SelectSize);
    }

    #[test]
    fn test_rejected_quantity_stays_on_confirm() {
        let ledger = ledger();
        let mut session = Session::new();
        session.begin().unwrap();
        session.choose_product(&ledger, "Shirt").unwrap();
        session.choose_size(&ledger, "L").unwrap();

        assert!(session.confirm_line(&ledger, 5).is_err());
        assert_eq!(session.screen(), Screen::ConfirmLine);
        assert!(session.confirm_line(&ledger, 4).is_ok());
    }

    #[test]
    fn test_illegal_transitions() {
        let ledger = ledger();
        let mut session = Session::new();

        assert_eq!(
            session.checkout().unwrap_err(),
            CoreError::InvalidTransition {
                from: Screen::Start,
                action: "checkout"
            }
        );
        assert!(session.choose_product(&ledger, "Shirt").is_err());
        assert!(session.back_to_products().is_err());
        assert!(session.return_to_cart().is_err());
        assert_eq!(session.view_cart().unwrap_err(), CoreError::EmptyCart);
    }

    #[test]
    fn test_cart_screen_edits() {
        let ledger = ledger();
        let mut session = at_cart(&ledger);

        assert!(session.remove_line(3).is_err());
        let removed = session.remove_line(0).unwrap();
        assert_eq!(removed.size, "M");
        assert!(session.checkout().is_err());

        session.back_to_products().unwrap();
        session.choose_product(&ledger, "Shirt").unwrap();
        session.choose_size(&ledger, "L").unwrap();
        session.confirm_line(&ledger, 1).unwrap();
        session.clear_cart().unwrap();
        assert!(session.cart().is_empty());
        assert_eq!(session.screen(), Screen::SelectProduct);
    }

    #[test]
    fn test_view_cart_from_anywhere_and_return() {
        let ledger = ledger();
        let mut session = at_cart(&ledger);
        session.back_to_products().unwrap();
        session.choose_product(&ledger, "Shirt").unwrap();

        session.view_cart().unwrap();
        assert_eq!(session.screen(), Screen::Cart);
        assert_eq!(session.selected_product(), None);

        session.checkout().unwrap();
        session.return_to_cart().unwrap();
        assert_eq!(session.screen(), Screen::Cart);
    }

    #[test]
    fn test_reset_discards_cart() {
        let ledger = ledger();
        let mut session = at_cart(&ledger);
        session.reset();
        assert_eq!(session, Session::new());
    }

    #[test]
    fn test_available_sizes_for_selection() {
        let ledger = ledger();
        let mut session = Session::new();
        assert!(session.available_sizes(&ledger).is_err());

        session.begin().unwrap();
        session.choose_product(&ledger, "Shirt").unwrap();
        let sizes: Vec<String> = session
            .available_sizes(&ledger)
            .unwrap()
            .into_iter()
            .map(|s| s.size)
            .collect();
        assert_eq!(sizes, vec!["S", "M", "L"]);
    }
}
