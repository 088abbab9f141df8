//! # Console Commands
//!
//! Parses operator input and drives the session and the commit coordinator.
//!
//! ## Command Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Input              Screen(s)              Effect                       │
//! │  ─────              ─────────              ──────                       │
//! │  begin              start                  → product                    │
//! │  product <name>     product                → size                       │
//! │  size <size>        size                   → confirm                    │
//! │  qty <n>            confirm                add line, → cart             │
//! │  back               size, confirm, cart    → product                    │
//! │  cart               any (cart non-empty)   → cart                       │
//! │  remove <n>         cart                   drop line n (1-based)        │
//! │  clear              cart                   empty cart, → product        │
//! │  checkout           cart                   → checkout                   │
//! │  return             checkout               → cart                       │
//! │  commit             checkout               save sale, → start           │
//! │  reset              any                    discard session              │
//! │                                                                         │
//! │  products, sizes, stock, report, reconcile, help, quit: no transition   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt::Write as _;
use std::sync::Arc;

use stockbook_core::{report, Cart, LedgerSnapshot, Session, SizeAvailability};
use stockbook_store::{CommitCoordinator, CommitReceipt, ReconcileReport};
use tracing::{debug, info};

use crate::error::{ConsoleError, ConsoleResult};

/// How many rows the sales report lists per section.
const REPORT_TOP_N: usize = 5;

// =============================================================================
// Parsing
// =============================================================================

/// One operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Begin,
    Products,
    Product(String),
    Sizes,
    Size(String),
    Quantity(i64),
    Back,
    Cart,
    /// Cart line number as shown to the operator (1-based).
    Remove(usize),
    Clear,
    Checkout,
    ReturnToCart,
    Commit,
    Reset,
    Stock,
    Report,
    Reconcile,
}

impl Command {
    /// Parses one input line. Keywords are case-insensitive.
    pub fn parse(line: &str) -> ConsoleResult<Command> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "begin" | "start" => Command::Begin,
            "products" => Command::Products,
            "product" | "p" => Command::Product(required(rest, "product name")?.to_string()),
            "sizes" => Command::Sizes,
            "size" | "s" => Command::Size(required(rest, "size")?.to_string()),
            "qty" | "q" | "add" => Command::Quantity(parse_number(rest, "quantity")?),
            "back" => Command::Back,
            "cart" => Command::Cart,
            "remove" | "rm" => {
                let n: i64 = parse_number(rest, "line number")?;
                if n < 1 {
                    return Err(ConsoleError::validation(format!(
                        "Line numbers start at 1, got {}",
                        n
                    )));
                }
                Command::Remove(n as usize)
            }
            "clear" => Command::Clear,
            "checkout" => Command::Checkout,
            "return" => Command::ReturnToCart,
            "commit" | "confirm" => Command::Commit,
            "reset" | "cancel" => Command::Reset,
            "stock" | "low" => Command::Stock,
            "report" => Command::Report,
            "reconcile" => Command::Reconcile,
            "" => return Err(ConsoleError::validation("Empty command")),
            other => {
                return Err(ConsoleError::validation(format!(
                    "Unknown command: {} (type `help`)",
                    other
                )))
            }
        };
        Ok(command)
    }
}

fn required<'a>(value: &'a str, what: &str) -> ConsoleResult<&'a str> {
    if value.is_empty() {
        Err(ConsoleError::validation(format!("Missing {}", what)))
    } else {
        Ok(value)
    }
}

fn parse_number(value: &str, what: &str) -> ConsoleResult<i64> {
    required(value, what)?
        .parse()
        .map_err(|_| {
            ConsoleError::validation(format!("{} must be a whole number, got '{}'", what, value))
        })
}

// =============================================================================
// Console
// =============================================================================

/// Result of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Quit,
}

/// One operator session bound to a shared coordinator.
pub struct Console {
    coordinator: Arc<CommitCoordinator>,
    session: Session,
}

impl Console {
    pub fn new(coordinator: Arc<CommitCoordinator>) -> Self {
        Console {
            coordinator,
            session: Session::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Prompt showing the current screen and cart size.
    pub fn prompt(&self) -> String {
        let cart = self.session.cart();
        if cart.is_empty() {
            format!("[{}]> ", self.session.screen())
        } else {
            format!("[{} | {} in cart]> ", self.session.screen(), cart.total_quantity())
        }
    }

    pub async fn execute_line(&mut self, line: &str) -> ConsoleResult<Reply> {
        let command = Command::parse(line)?;
        self.execute(command).await
    }

    pub async fn execute(&mut self, command: Command) -> ConsoleResult<Reply> {
        debug!(?command, screen = %self.session.screen(), "execute command");

        let text = match command {
            Command::Quit => return Ok(Reply::Quit),
            Command::Help => HELP.to_string(),
            Command::Begin => {
                self.session.begin()?;
                let ledger = self.snapshot().await?;
                render_products(&ledger)
            }
            Command::Products => render_products(&self.snapshot().await?),
            Command::Product(name) => {
                let ledger = self.snapshot().await?;
                let product = resolve(ledger.products(), &name);
                self.session.choose_product(&ledger, &product)?;
                let sizes = self.session.available_sizes(&ledger)?;
                render_sizes(&product, &sizes)
            }
            Command::Sizes => {
                let ledger = self.snapshot().await?;
                let sizes = self.session.available_sizes(&ledger)?;
                let product = self.session.selected_product().unwrap_or_default();
                render_sizes(product, &sizes)
            }
            Command::Size(size) => {
                let ledger = self.snapshot().await?;
                let sizes = self.session.available_sizes(&ledger)?;
                let size = resolve(sizes.iter().map(|s| s.size.as_str()), &size);
                self.session.choose_size(&ledger, &size)?;
                let product = self.session.selected_product().unwrap_or_default();
                match ledger.get(product, &size) {
                    Some(entry) => format!(
                        "{} ({}) SKU {}: {} at {}.\nEnter a quantity with `qty <n>`.",
                        entry.product,
                        entry.size,
                        entry.sku,
                        entry.stock_level(ledger.low_stock_threshold()),
                        entry.unit_cost
                    ),
                    None => format!("Selected {} ({}).", product, size),
                }
            }
            Command::Quantity(quantity) => {
                let ledger = self.snapshot().await?;
                let line = self.session.confirm_line(&ledger, quantity)?;
                let added = format!(
                    "Added {} x {} ({}) = {}",
                    line.quantity,
                    line.product,
                    line.size,
                    line.line_profit()
                );
                format!("{}\n\n{}", added, render_cart(self.session.cart()))
            }
            Command::Back => {
                self.session.back_to_products()?;
                render_products(&self.snapshot().await?)
            }
            Command::Cart => {
                self.session.view_cart()?;
                render_cart(self.session.cart())
            }
            Command::Remove(number) => {
                let line = self.session.remove_line(number - 1)?;
                format!(
                    "Removed {} x {} ({})\n\n{}",
                    line.quantity,
                    line.product,
                    line.size,
                    render_cart(self.session.cart())
                )
            }
            Command::Clear => {
                self.session.clear_cart()?;
                "Cart cleared.".to_string()
            }
            Command::Checkout => {
                self.session.checkout()?;
                format!(
                    "{}\n\nType `commit` to record the sale or `return` to edit the cart.",
                    render_cart(self.session.cart())
                )
            }
            Command::ReturnToCart => {
                self.session.return_to_cart()?;
                render_cart(self.session.cart())
            }
            Command::Commit => {
                let receipt = self.coordinator.commit_session(&mut self.session).await?;
                render_receipt(&receipt)
            }
            Command::Reset => {
                self.session.reset();
                "Session reset.".to_string()
            }
            Command::Stock => {
                let ledger = self.snapshot().await?;
                render_low_stock(&ledger, self.coordinator.low_stock_threshold())
            }
            Command::Report => self.report()?,
            Command::Reconcile => render_reconcile(&self.coordinator.reconcile().await?),
        };

        Ok(Reply::Text(text))
    }

    async fn snapshot(&self) -> ConsoleResult<LedgerSnapshot> {
        Ok(self.coordinator.snapshot().await?)
    }

    fn report(&self) -> ConsoleResult<String> {
        let scan = self.coordinator.writer().scan()?;
        let batches = scan.sale_batches();
        info!(batches = batches.len(), "Building sales report");

        let summary = report::summarize(&batches);
        let mut out = String::new();
        let _ = writeln!(out, "Sales report");
        let _ = writeln!(out, "  Sales:          {}", summary.batch_count);
        let _ = writeln!(out, "  Units sold:     {}", summary.units_sold);
        let _ = writeln!(out, "  Total profit:   {}", summary.total_profit);
        let _ = writeln!(out, "  Avg per sale:   {}", summary.average_per_batch);

        let top = report::top_sellers(&batches, REPORT_TOP_N);
        if !top.is_empty() {
            let _ = writeln!(out, "\nTop sellers");
            for item in &top {
                let _ = writeln!(
                    out,
                    "  {:<20} {:<5} {:>4} units  {}",
                    item.product, item.size, item.units, item.profit
                );
            }
        }

        let by_product = report::profit_by_product(&batches);
        if !by_product.is_empty() {
            let _ = writeln!(out, "\nBy product");
            for p in by_product.iter().take(REPORT_TOP_N) {
                let _ = writeln!(
                    out,
                    "  {:<20} {:>4} units  {}  ({} per unit)",
                    p.product, p.units, p.profit, p.profit_per_unit
                );
            }
        }

        let daily = report::daily_totals(&batches);
        if !daily.is_empty() {
            let _ = writeln!(out, "\nBy day");
            for day in &daily {
                let _ = writeln!(
                    out,
                    "  {}  {:>3} sales  {:>4} units  {}",
                    day.date, day.batch_count, day.units, day.profit
                );
            }
        }

        if !scan.quarantined.is_empty() {
            let _ = writeln!(
                out,
                "\n{} unreadable sale file(s) skipped; see the log.",
                scan.quarantined.len()
            );
        }

        Ok(out.trim_end().to_string())
    }
}

/// Picks the candidate equal to `input` ignoring case, else `input` as typed.
fn resolve<'a, I>(candidates: I, input: &str) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .find(|c| c.eq_ignore_ascii_case(input))
        .unwrap_or(input)
        .to_string()
}

// =============================================================================
// Rendering
// =============================================================================

fn render_products(ledger: &LedgerSnapshot) -> String {
    if ledger.is_empty() {
        return "The ledger has no products. Run the `seed` binary to provision one.".to_string();
    }

    let mut out = String::from("Products:\n");
    for product in ledger.products() {
        let sizes = ledger.available_sizes(product);
        let remaining: i64 = sizes.iter().map(|s| s.remaining).sum();
        let status = if remaining == 0 {
            "sold out".to_string()
        } else {
            let in_stock = sizes.iter().filter(|s| s.remaining > 0).count();
            format!("{} left in {} size(s)", remaining, in_stock)
        };
        let _ = writeln!(out, "  {:<20} {}", product, status);
    }
    out.push_str("Choose one with `product <name>`.");
    out
}

fn render_sizes(product: &str, sizes: &[SizeAvailability]) -> String {
    let mut out = format!("{} sizes:\n", product);
    for size in sizes {
        let _ = writeln!(out, "  {:<5} {:<12} {}", size.size, size.sku, size.level);
    }
    out.push_str("Choose one with `size <size>`.");
    out
}

fn render_cart(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Cart is empty.".to_string();
    }

    let mut out = String::from("Cart:\n");
    for (i, line) in cart.lines().iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:>2}. {:<20} {:<5} {:>3} x {:>8} = {}",
            i + 1,
            line.product,
            line.size,
            line.quantity,
            line.unit_cost.to_string(),
            line.line_profit()
        );
    }
    let _ = write!(out, "  {} units, total {}", cart.total_quantity(), cart.total());
    out
}

fn render_receipt(receipt: &CommitReceipt) -> String {
    format!(
        "Sale committed: {} line(s), {} units, total {}.\nSaved as {} (batch {}).",
        receipt.lines, receipt.units, receipt.total, receipt.batch_name, receipt.batch_id
    )
}

fn render_low_stock(ledger: &LedgerSnapshot, threshold: i64) -> String {
    let low = ledger.low_stock(threshold);
    if low.is_empty() {
        return format!("No sizes at or below {} left.", threshold);
    }

    let mut out = format!("Low stock (at or below {}):\n", threshold);
    for entry in &low {
        let _ = writeln!(
            out,
            "  {:<20} {:<5} {:<12} {}",
            entry.product,
            entry.size,
            entry.sku,
            entry.stock_level(threshold)
        );
    }
    out.trim_end().to_string()
}

fn render_reconcile(report: &ReconcileReport) -> String {
    let mut out = format!(
        "Reconcile: {} applied, {} already in ledger, {} failed, {} unreadable.",
        report.applied.len(),
        report.already_applied,
        report.failed.len(),
        report.quarantined.len()
    );
    for name in &report.applied {
        let _ = write!(out, "\n  applied  {}", name);
    }
    for failed in &report.failed {
        let _ = write!(out, "\n  failed   {}: {}", failed.batch_name, failed.reason);
    }
    for q in &report.quarantined {
        let _ = write!(out, "\n  skipped  {}: {}", q.path.display(), q.reason);
    }
    out
}

const HELP: &str = "\
Commands:
  begin                 start a sale
  products              list products and stock
  product <name>        choose a product
  sizes                 list sizes of the chosen product
  size <size>           choose a size
  qty <n>               add n of the chosen size to the cart
  back                  back to product selection
  cart                  show the cart
  remove <n>            remove cart line n
  clear                 empty the cart
  checkout              review the cart before saving
  return                back from checkout to the cart
  commit                save the sale
  reset                 discard the current sale
  stock                 list low-stock sizes
  report                sales summary from saved sales
  reconcile             apply saved sales missing from the ledger
  quit                  leave the register";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use stockbook_core::{LedgerEntry, Money, Screen};
    use stockbook_store::{Database, DbConfig, SaleBatchWriter};
    use tempfile::TempDir;

    async fn console() -> (TempDir, Console) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(DbConfig::new(dir.path().join("ledger.db")).create_if_missing(true))
            .await
            .unwrap();
        db.ledger()
            .provision(&[
                LedgerEntry::new("Classic Tee", "M", "TEE-M", Money::from_cents(1250), 10, 2),
                LedgerEntry::new("Classic Tee", "L", "TEE-L", Money::from_cents(1250), 4, 0),
                LedgerEntry::new("Cap", "OS", "CAP-OS", Money::from_cents(900), 1, 1),
            ])
            .await
            .unwrap();
        let writer = SaleBatchWriter::new(dir.path().join("sales"));
        let coordinator = CommitCoordinator::new(db, writer, 5);
        (dir, Console::new(Arc::new(coordinator)))
    }

    async fn run(console: &mut Console, line: &str) -> String {
        match console.execute_line(line).await.unwrap() {
            Reply::Text(text) => text,
            Reply::Quit => panic!("unexpected quit for {}", line),
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("qty 3").unwrap(), Command::Quantity(3));
        assert_eq!(
            Command::parse("  Product   classic tee ").unwrap(),
            Command::Product("classic tee".to_string())
        );
        assert_eq!(Command::parse("remove 2").unwrap(), Command::Remove(2));
        assert_eq!(Command::parse("CHECKOUT").unwrap(), Command::Checkout);
        assert_eq!(Command::parse("qty -1").unwrap(), Command::Quantity(-1));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(Command::parse("fly").unwrap_err().code, ErrorCode::ValidationError);
        assert_eq!(Command::parse("qty").unwrap_err().code, ErrorCode::ValidationError);
        assert_eq!(Command::parse("qty two").unwrap_err().code, ErrorCode::ValidationError);
        assert_eq!(Command::parse("remove 0").unwrap_err().code, ErrorCode::ValidationError);
        assert_eq!(Command::parse("product").unwrap_err().code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_full_sale() {
        let (_dir, mut console) = console().await;

        let products = run(&mut console, "begin").await;
        assert!(products.contains("Classic Tee"));
        assert!(products.contains("sold out"));

        let sizes = run(&mut console, "product classic tee").await;
        assert!(sizes.contains("TEE-M"));
        assert_eq!(console.session().screen(), Screen::SelectSize);

        run(&mut console, "size m").await;
        assert_eq!(console.session().selected_size(), Some("M"));

        let added = run(&mut console, "qty 3").await;
        assert!(added.contains("Added 3 x Classic Tee (M) = $37.50"));
        assert_eq!(console.session().screen(), Screen::Cart);
        assert_eq!(console.prompt(), "[cart | 3 in cart]> ");

        run(&mut console, "checkout").await;
        let receipt = run(&mut console, "commit").await;
        assert!(receipt.contains("Sale committed: 1 line(s), 3 units, total $37.50."));
        assert_eq!(console.session().screen(), Screen::Start);
        assert!(console.session().cart().is_empty());

        let ledger = console.coordinator.snapshot().await.unwrap();
        assert_eq!(ledger.remaining("Classic Tee", "M"), Some(5));

        let report = run(&mut console, "report").await;
        assert!(report.contains("Units sold:     3"));
        assert!(report.contains("Total profit:   $37.50"));
    }

    #[tokio::test]
    async fn test_errors_keep_screen() {
        let (_dir, mut console) = console().await;

        let err = console.execute_line("checkout").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NavigationError);
        assert_eq!(console.session().screen(), Screen::Start);

        run(&mut console, "begin").await;
        let err = console.execute_line("product Cap").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(console.session().screen(), Screen::SelectProduct);

        run(&mut console, "product Classic Tee").await;
        run(&mut console, "size L").await;
        let err = console.execute_line("qty 5").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(console.session().screen(), Screen::ConfirmLine);

        let err = console.execute_line("qty 0").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_cart_editing() {
        let (_dir, mut console) = console().await;
        run(&mut console, "begin").await;
        run(&mut console, "product Classic Tee").await;
        run(&mut console, "size M").await;
        run(&mut console, "qty 2").await;
        run(&mut console, "back").await;
        run(&mut console, "product Classic Tee").await;
        run(&mut console, "size L").await;
        run(&mut console, "qty 1").await;
        assert_eq!(console.session().cart().len(), 2);

        let err = console.execute_line("remove 3").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);

        let cart = run(&mut console, "remove 1").await;
        assert!(cart.contains("Removed 2 x Classic Tee (M)"));
        assert_eq!(console.session().cart().len(), 1);

        run(&mut console, "clear").await;
        assert!(console.session().cart().is_empty());
        assert_eq!(console.session().screen(), Screen::SelectProduct);
    }

    #[tokio::test]
    async fn test_stock_and_reconcile() {
        let (_dir, mut console) = console().await;

        let stock = run(&mut console, "stock").await;
        assert!(stock.contains("CAP-OS"));
        assert!(stock.contains("sold out"));

        let reconcile = run(&mut console, "reconcile").await;
        assert!(reconcile.starts_with("Reconcile: 0 applied"));
    }

    #[tokio::test]
    async fn test_quit() {
        let (_dir, mut console) = console().await;
        assert_eq!(console.execute_line("quit").await.unwrap(), Reply::Quit);
    }
}
