//! # Store Configuration
//!
//! Where the ledger and the sale batches live, and the stock alert level.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKBOOK_LEDGER_PATH=/srv/shop/ledger.db                          │
//! │     STOCKBOOK_SALES_DIR=/srv/shop/sales                                │
//! │     STOCKBOOK_LOW_STOCK_THRESHOLD=3                                    │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/stockbook/stockbook.toml (Linux)                         │
//! │     ~/Library/Application Support/com.stockbook.register/... (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     <data dir>/ledger.db, <data dir>/sales, threshold 5                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # stockbook.toml
//! [ledger]
//! path = "/srv/shop/ledger.db"
//! max_connections = 4
//!
//! [sales]
//! dir = "/srv/shop/sales"
//!
//! [stock]
//! low_stock_threshold = 5
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use stockbook_core::LOW_STOCK_THRESHOLD;

use crate::error::{StoreError, StoreResult};
use crate::pool::DbConfig;
use crate::sale_batch::SaleBatchWriter;

pub const CONFIG_FILE_NAME: &str = "stockbook.toml";

pub const ENV_LEDGER_PATH: &str = "STOCKBOOK_LEDGER_PATH";
pub const ENV_SALES_DIR: &str = "STOCKBOOK_SALES_DIR";
pub const ENV_LOW_STOCK_THRESHOLD: &str = "STOCKBOOK_LOW_STOCK_THRESHOLD";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "stockbook", "register")
}

fn data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

// =============================================================================
// Sections
// =============================================================================

/// `[ledger]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    /// SQLite ledger file.
    pub path: PathBuf,

    /// Pool size. Default: 4
    pub max_connections: u32,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        LedgerSettings {
            path: data_dir().join("ledger.db"),
            max_connections: 4,
        }
    }
}

/// `[sales]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SalesSettings {
    /// Directory of `YYYY-MM-DD[_N].json` batch files.
    pub dir: PathBuf,
}

impl Default for SalesSettings {
    fn default() -> Self {
        SalesSettings {
            dir: data_dir().join("sales"),
        }
    }
}

/// `[stock]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockSettings {
    /// Remaining quantity at or below which a size is flagged low.
    pub low_stock_threshold: i64,
}

impl Default for StockSettings {
    fn default() -> Self {
        StockSettings {
            low_stock_threshold: LOW_STOCK_THRESHOLD,
        }
    }
}

// =============================================================================
// Store Config
// =============================================================================

/// Complete storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub ledger: LedgerSettings,
    pub sales: SalesSettings,
    pub stock: StockSettings,
}

impl StoreConfig {
    /// Loads configuration: defaults, then the TOML file, then environment.
    ///
    /// A missing file is not an error; a malformed one is.
    pub fn load(config_path: Option<PathBuf>) -> StoreResult<Self> {
        let mut config = match config_path.or_else(Self::default_config_path) {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "Loading store config from file");
                Self::from_file(&path)?
            }
            Some(path) => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Parses one TOML file; absent sections take their defaults.
    pub fn from_file(path: &Path) -> StoreResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            StoreError::ConfigLoadFailed(format!("{}: {}", path.display(), e))
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Applies `STOCKBOOK_*` overrides from `lookup` (normally the process
    /// environment).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_LEDGER_PATH) {
            debug!(path = %path, "Overriding ledger path from environment");
            self.ledger.path = PathBuf::from(path);
        }

        if let Some(dir) = lookup(ENV_SALES_DIR) {
            debug!(dir = %dir, "Overriding sales directory from environment");
            self.sales.dir = PathBuf::from(dir);
        }

        if let Some(threshold) = lookup(ENV_LOW_STOCK_THRESHOLD) {
            match threshold.trim().parse::<i64>() {
                Ok(t) => self.stock.low_stock_threshold = t,
                Err(_) => warn!(value = %threshold, "Ignoring non-numeric low stock threshold"),
            }
        }
    }

    /// Checks values the rest of the store relies on.
    pub fn validate(&self) -> StoreResult<()> {
        if self.ledger.path.as_os_str().is_empty() {
            return Err(StoreError::InvalidConfig("ledger.path must not be empty".into()));
        }
        if self.sales.dir.as_os_str().is_empty() {
            return Err(StoreError::InvalidConfig("sales.dir must not be empty".into()));
        }
        if self.ledger.path == self.sales.dir {
            return Err(StoreError::InvalidConfig(
                "ledger.path and sales.dir must differ".into(),
            ));
        }
        if self.ledger.max_connections == 0 {
            return Err(StoreError::InvalidConfig(
                "ledger.max_connections must be greater than 0".into(),
            ));
        }
        if self.stock.low_stock_threshold < 0 {
            return Err(StoreError::InvalidConfig(format!(
                "stock.low_stock_threshold must not be negative, got {}",
                self.stock.low_stock_threshold
            )));
        }
        Ok(())
    }

    /// Pool configuration for an existing ledger.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.ledger.path).max_connections(self.ledger.max_connections)
    }

    pub fn sale_writer(&self) -> SaleBatchWriter {
        SaleBatchWriter::new(&self.sales.dir)
    }

    /// `<config dir>/stockbook.toml`, when the platform has one.
    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}
