//! # Demo Ledger Seeder
//!
//! Provisions a ledger file with a small apparel catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed the configured ledger (stockbook.toml / STOCKBOOK_LEDGER_PATH)
//! cargo run -p stockbook-store --bin seed
//!
//! # Seed a specific file
//! cargo run -p stockbook-store --bin seed -- --db ./data/ledger.db
//! ```
//!
//! ## Generated Entries
//! Every product gets one entry per size, with SKU `{CODE}-{SIZE}` and a
//! starting quantity that tapers toward the larger sizes. A few sizes start
//! partly sold so the low-stock report has something to show.

use std::env;
use std::path::PathBuf;

use stockbook_core::{LedgerEntry, Money};
use stockbook_store::{Database, DbConfig, StoreConfig};

/// (product, SKU code, unit cost in cents, sizes)
const CATALOG: &[(&str, &str, i64, &[&str])] = &[
    ("Classic Tee", "TEE", 1250, &["XS", "S", "M", "L", "XL", "2XL"]),
    ("Pocket Tee", "PKT", 1400, &["S", "M", "L", "XL"]),
    ("Zip Hoodie", "HOOD", 3200, &["S", "M", "L", "XL", "2XL", "3XL"]),
    ("Crew Sweatshirt", "CREW", 2600, &["M", "L", "XL"]),
    ("Snapback Cap", "CAP", 900, &["OS"]),
];

/// Starting quantity by size position: more of the common sizes.
const STARTING_STOCK: &[i64] = &[12, 18, 24, 20, 10, 6, 4, 3, 2];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockbook Demo Ledger Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>       Ledger file to create (default: configured ledger path)");
                println!("  -c, --config <PATH>   stockbook.toml to read");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    let db_path = match db_path {
        Some(path) => path,
        None => StoreConfig::load(config_path)?.ledger.path,
    };

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    println!("Stockbook Demo Ledger Seeder");
    println!("============================");
    println!("Ledger: {}", db_path.display());
    println!();

    let db = Database::open(DbConfig::new(&db_path).create_if_missing(true)).await?;

    println!("✓ Opened ledger");
    println!("✓ Migrations applied");

    let existing = db.ledger().count().await?;
    if existing > 0 {
        println!("⚠ Ledger already has {} entries", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the ledger file to regenerate.");
        return Ok(());
    }

    let entries = demo_entries();
    let inserted = db.ledger().provision(&entries).await?;

    println!();
    println!("✓ Provisioned {} entries", inserted);

    let snapshot = db.ledger().snapshot().await?;
    let threshold = snapshot.low_stock_threshold();
    let low = snapshot.low_stock(threshold);
    println!();
    println!("Low stock (≤ {}):", threshold);
    for entry in &low {
        println!(
            "  {:<18} {:<4} {}",
            entry.product,
            entry.size,
            entry.stock_level(threshold)
        );
    }

    db.close().await;

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn demo_entries() -> Vec<LedgerEntry> {
    let mut entries = Vec::new();

    for (product_idx, (product, code, cost_cents, sizes)) in CATALOG.iter().enumerate() {
        for (size_idx, size) in sizes.iter().enumerate() {
            let initial = STARTING_STOCK[size_idx % STARTING_STOCK.len()];
            // Every third entry starts partly sold.
            let sold = if (product_idx + size_idx) % 3 == 0 {
                initial / 2 + 1
            } else {
                0
            };

            entries.push(LedgerEntry::new(
                *product,
                *size,
                format!("{}-{}", code, size),
                Money::from_cents(*cost_cents),
                initial,
                sold.min(initial),
            ));
        }
    }

    entries
}
