//! # Stockbook Register
//!
//! Line-oriented operator console over the Stockbook ledger.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Register Startup                                    │
//! │                                                                         │
//! │  1. Initialize Tracing ──────────────────────────────────────────────► │
//! │     • tracing-subscriber with env filter                                │
//! │     • Default: info,stockbook=debug,sqlx=warn; override with RUST_LOG   │
//! │                                                                         │
//! │  2. Load StoreConfig ────────────────────────────────────────────────► │
//! │     • defaults → stockbook.toml → STOCKBOOK_* environment               │
//! │                                                                         │
//! │  3. Open CommitCoordinator ──────────────────────────────────────────► │
//! │     • ledger must already exist (see the `seed` binary)                 │
//! │                                                                         │
//! │  4. Reconcile ───────────────────────────────────────────────────────► │
//! │     • apply saved sales the ledger has not seen                         │
//! │                                                                         │
//! │  5. Read commands from stdin until `quit` or EOF                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod error;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use stockbook_store::{CommitCoordinator, StoreConfig};

use commands::{Console, Reply};
use error::{ConsoleError, ConsoleResult};

/// Command-line options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pub config_path: Option<PathBuf>,
    pub help: bool,
}

impl Options {
    /// Parses `--config <PATH>` and `--help`; anything else is an error.
    pub fn parse<I>(args: I) -> ConsoleResult<Options>
    where
        I: IntoIterator<Item = String>,
    {
        let mut options = Options::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => match args.next() {
                    Some(path) => options.config_path = Some(PathBuf::from(path)),
                    None => return Err(ConsoleError::validation("--config needs a path")),
                },
                "--help" | "-h" => options.help = true,
                other => {
                    return Err(ConsoleError::validation(format!(
                        "Unknown argument: {}",
                        other
                    )))
                }
            }
        }

        Ok(options)
    }
}

pub const USAGE: &str = "\
Usage: register [OPTIONS]

Options:
  -c, --config <PATH>   stockbook.toml to read
  -h, --help            Show this help message

Environment:
  STOCKBOOK_LEDGER_PATH, STOCKBOOK_SALES_DIR, STOCKBOOK_LOW_STOCK_THRESHOLD
  RUST_LOG (default: info,stockbook=debug,sqlx=warn)";

/// Runs the register until `quit` or end of input.
pub async fn run(options: Options) -> ConsoleResult<()> {
    init_tracing();

    info!("Starting Stockbook register");

    let config = StoreConfig::load(options.config_path)?;
    info!(
        ledger = %config.ledger.path.display(),
        sales = %config.sales.dir.display(),
        "Loaded store config"
    );

    let coordinator = Arc::new(CommitCoordinator::open(&config).await?);

    let report = coordinator.reconcile().await?;
    if !report.applied.is_empty() {
        info!(applied = report.applied.len(), "Applied saved sales missing from the ledger");
    }
    if !report.is_clean() {
        warn!(
            failed = report.failed.len(),
            quarantined = report.quarantined.len(),
            "Some saved sales are not in the ledger; run `reconcile` for details"
        );
    }

    let mut console = Console::new(coordinator.clone());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Stockbook register. Type `help` for commands.");
    loop {
        print!("{}", console.prompt());
        std::io::stdout()
            .flush()
            .map_err(|e| ConsoleError::internal(format!("stdout: {}", e)))?;

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => return Err(ConsoleError::internal(format!("stdin: {}", e))),
        };
        if line.trim().is_empty() {
            continue;
        }

        match console.execute_line(&line).await {
            Ok(Reply::Text(text)) => println!("{}", text),
            Ok(Reply::Quit) => break,
            Err(e) => println!("error: {}", e),
        }
    }

    if !console.session().cart().is_empty() {
        warn!(lines = console.session().cart().len(), "Leaving with an uncommitted cart");
    }
    coordinator.database().close().await;
    info!("Register closed");
    Ok(())
}

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_LOG_FILTER: &str = "info,stockbook=debug,sqlx=warn";

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=stockbook_store=trace` - Trace the storage crate only
///
/// Logs go to stderr so they do not interleave with console replies.
fn init_tracing() {
    let filter = log_filter(std::env::var("RUST_LOG").ok().as_deref());
    let _ = subscriber(filter).try_init();
}

/// Parses `RUST_LOG`-style directives, falling back to the default.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn subscriber(filter: EnvFilter) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;
    use tracing::Level;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_options() {
        assert_eq!(Options::parse(args(&[])).unwrap(), Options::default());

        let options = Options::parse(args(&["--config", "/etc/stockbook.toml"])).unwrap();
        assert_eq!(options.config_path, Some(PathBuf::from("/etc/stockbook.toml")));

        assert!(Options::parse(args(&["-h"])).unwrap().help);
    }

    #[test]
    fn test_log_filter_honors_directives() {
        let filter = log_filter(Some("warn"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));

        tracing::subscriber::with_default(subscriber(log_filter(Some("warn"))), || {
            assert!(tracing::enabled!(Level::WARN));
            assert!(!tracing::enabled!(Level::INFO));
        });
    }

    #[test]
    fn test_log_filter_default() {
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(log_filter(Some("stockbook=loud")).max_level_hint(), Some(LevelFilter::DEBUG));

        tracing::subscriber::with_default(subscriber(log_filter(None)), || {
            assert!(tracing::enabled!(target: "sqlx::query", Level::WARN));
            assert!(!tracing::enabled!(target: "sqlx::query", Level::INFO));
        });
    }

    #[test]
    fn test_parse_options_errors() {
        assert!(Options::parse(args(&["--config"])).is_err());
        assert!(Options::parse(args(&["--verbose"])).is_err());
    }
}
