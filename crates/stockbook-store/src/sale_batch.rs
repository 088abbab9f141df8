//! # Sale Batch Files
//!
//! Append-only, write-once storage for committed sales. One JSON file per
//! committed cart, named after the sale date.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  append(batch)                                                          │
//! │     │                                                                   │
//! │     ├── 1. validate + serialize                                         │
//! │     ├── 2. write .<batch_id>.tmp, fsync                                 │
//! │     ├── 3. hard_link tmp → 2026-10-16.json                              │
//! │     │        AlreadyExists? → try 2026-10-16_1.json, _2, ...            │
//! │     ├── 4. remove tmp, fsync directory                                  │
//! │     ▼                                                                   │
//! │  SaleBatchHandle { name, path }                                         │
//! │                                                                         │
//! │  hard_link never replaces an existing file, so two batches on the same  │
//! │  day always land in two files and a reader only ever sees whole files.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Scan
//! `scan()` reads every `*.json` in the directory in (date, suffix) order.
//! Files that fail to parse or validate are quarantined and logged; they
//! are never returned as batches.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use stockbook_core::{SaleBatch, SaleBatchId};

use crate::error::{StoreError, StoreResult};

/// Upper bound on same-day suffix probing.
const MAX_SUFFIX: u32 = 10_000;

const BATCH_EXTENSION: &str = "json";

/// Where a batch was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleBatchHandle {
    /// File name, e.g. `2026-10-16_1.json`.
    pub name: String,
    pub path: PathBuf,
}

/// A batch read back from disk.
#[derive(Debug, Clone)]
pub struct StoredBatch {
    pub handle: SaleBatchHandle,
    pub batch: SaleBatch,
}

/// A file that could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuarantinedBatch {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of reading the whole sales directory.
#[derive(Debug, Clone, Default)]
pub struct BatchScan {
    pub batches: Vec<StoredBatch>,
    pub quarantined: Vec<QuarantinedBatch>,
}

impl BatchScan {
    /// Just the batches, for reporting.
    pub fn sale_batches(&self) -> Vec<SaleBatch> {
        self.batches.iter().map(|s| s.batch.clone()).collect()
    }
}

/// File name for the `n`th batch of a day (`n = 0` has no suffix).
pub fn batch_file_name(date: NaiveDate, n: u32) -> String {
    let day = date.format("%Y-%m-%d");
    if n == 0 {
        format!("{}.{}", day, BATCH_EXTENSION)
    } else {
        format!("{}_{}.{}", day, n, BATCH_EXTENSION)
    }
}

/// Sort key `(date part, suffix)` so `_10` sorts after `_2`.
fn name_order(name: &str) -> (String, u32, String) {
    let stem = name.strip_suffix(".json").unwrap_or(name);
    match stem.rsplit_once('_') {
        Some((day, n)) => match n.parse::<u32>() {
            Ok(n) => (day.to_string(), n, name.to_string()),
            Err(_) => (stem.to_string(), 0, name.to_string()),
        },
        None => (stem.to_string(), 0, name.to_string()),
    }
}

/// Writes and reads sale batch files in one directory.
#[derive(Debug, Clone)]
pub struct SaleBatchWriter {
    dir: PathBuf,
}

impl SaleBatchWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SaleBatchWriter { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persists a batch under the first free name for its sale date.
    pub fn append(&self, batch: &SaleBatch) -> StoreResult<SaleBatchHandle> {
        batch.validate()?;

        fs::create_dir_all(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;

        let body = serde_json::to_vec_pretty(batch)?;
        let temp_path = self.dir.join(format!(".{}.tmp", batch.batch_id));

        let written = write_synced(&temp_path, &body)
            .and_then(|()| self.link_free_name(&temp_path, batch.sale_date));

        if let Err(e) = fs::remove_file(&temp_path) {
            if e.kind() != ErrorKind::NotFound {
                warn!(path = %temp_path.display(), error = %e, "Could not remove temp batch file");
            }
        }

        let handle = written?;
        sync_dir(&self.dir);

        info!(
            batch_id = %batch.batch_id,
            file = %handle.name,
            records = batch.records.len(),
            "Sale batch written"
        );
        Ok(handle)
    }

    fn link_free_name(&self, temp_path: &Path, date: NaiveDate) -> StoreResult<SaleBatchHandle> {
        for n in 0..MAX_SUFFIX {
            let name = batch_file_name(date, n);
            let path = self.dir.join(&name);
            match fs::hard_link(temp_path, &path) {
                Ok(()) => return Ok(SaleBatchHandle { name, path }),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(file = %name, "Batch name taken, probing next suffix");
                }
                Err(e) => return Err(StoreError::io(&path, e)),
            }
        }
        Err(StoreError::Internal(format!(
            "no free batch file name for {} after {} attempts",
            date, MAX_SUFFIX
        )))
    }

    /// Reads and validates one batch file.
    pub fn read(path: impl AsRef<Path>) -> StoreResult<SaleBatch> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| StoreError::io(path, e))?;

        let batch: SaleBatch = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::invalid_batch(path, e.to_string()))?;
        batch
            .validate()
            .map_err(|e| StoreError::invalid_batch(path, e.to_string()))?;

        Ok(batch)
    }

    /// Reads every batch file, quarantining the ones that fail.
    ///
    /// A missing directory is an empty scan. A second file carrying an
    /// already-seen batch id is quarantined.
    pub fn scan(&self) -> StoreResult<BatchScan> {
        let mut scan = BatchScan::default();

        let dir_entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(scan),
            Err(e) => return Err(StoreError::io(&self.dir, e)),
        };

        let mut names = Vec::new();
        for dir_entry in dir_entries {
            let dir_entry = dir_entry.map_err(|e| StoreError::io(&self.dir, e))?;
            let path = dir_entry.path();
            let is_batch = path.is_file()
                && path.extension().is_some_and(|ext| ext == BATCH_EXTENSION);
            let name = dir_entry.file_name().to_string_lossy().into_owned();
            if is_batch && !name.starts_with('.') {
                names.push(name);
            }
        }
        names.sort_by_key(|name| name_order(name));

        let mut seen: HashSet<SaleBatchId> = HashSet::new();
        for name in names {
            let path = self.dir.join(&name);
            let result = Self::read(&path).and_then(|batch| {
                if seen.insert(batch.batch_id) {
                    Ok(batch)
                } else {
                    Err(StoreError::invalid_batch(
                        &path,
                        format!("duplicate batch id {}", batch.batch_id),
                    ))
                }
            });

            match result {
                Ok(batch) => scan.batches.push(StoredBatch {
                    handle: SaleBatchHandle { name, path },
                    batch,
                }),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Quarantined sale batch file");
                    scan.quarantined.push(QuarantinedBatch {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        debug!(
            batches = scan.batches.len(),
            quarantined = scan.quarantined.len(),
            "Scanned sale batches"
        );
        Ok(scan)
    }

    /// Finds a stored batch by id.
    pub fn find(&self, batch_id: SaleBatchId) -> StoreResult<Option<StoredBatch>> {
        Ok(self
            .scan()?
            .batches
            .into_iter()
            .find(|s| s.batch.batch_id == batch_id))
    }
}

fn write_synced(path: &Path, body: &[u8]) -> StoreResult<()> {
    let mut file = File::create(path).map_err(|e| StoreError::io(path, e))?;
    file.write_all(body).map_err(|e| StoreError::io(path, e))?;
    file.sync_all().map_err(|e| StoreError::io(path, e))?;
    Ok(())
}

/// Flushes the directory entry for the new link. Best effort.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(e) = File::open(dir).and_then(|d| d.sync_all()) {
        warn!(path = %dir.display(), error = %e, "Could not fsync sales directory");
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
