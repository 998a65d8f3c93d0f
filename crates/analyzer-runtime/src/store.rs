//! Pluggable backing stores for the history ledger.
//!
//! A store only persists and enumerates entries; ordering guarantees come
//! from the ledger, which assigns monotonically non-decreasing timestamps
//! and increasing ids before handing entries over. `append` takes `&mut
//! self`, so a store owner serializes writes by construction.

use std::path::{Path, PathBuf};

use analyzer_core::error::{AnalyzerError, Result};
use analyzer_core::models::HistoryEntry;
use tracing::debug;

// ── HistoryStore ──────────────────────────────────────────────────────────────

/// Persistence boundary used by the ledger.
pub trait HistoryStore: Send {
    /// Persist one entry. Never overwrites or mutates prior entries.
    fn append(&mut self, entry: HistoryEntry) -> Result<()>;

    /// The most recent `limit` entries, newest-first. Entries appended later
    /// sort before earlier ones with an identical timestamp.
    fn query(&self, limit: usize) -> Result<Vec<HistoryEntry>>;

    /// The single most recent entry, if any.
    fn latest(&self) -> Result<Option<HistoryEntry>> {
        Ok(self.query(1)?.into_iter().next())
    }
}

// Allow `&mut S` to act as a store so callers can re-wrap a store they
// still own.
impl<S: HistoryStore> HistoryStore for &mut S {
    fn append(&mut self, entry: HistoryEntry) -> Result<()> {
        (**self).append(entry)
    }

    fn query(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        (**self).query(limit)
    }
}

// ── MemoryStore ───────────────────────────────────────────────────────────────

/// Volatile in-memory store, used by tests and one-shot runs that do not
/// need history to survive the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Vec<HistoryEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl HistoryStore for MemoryStore {
    fn append(&mut self, entry: HistoryEntry) -> Result<()> {
        self.entries.push(entry);
        Ok(())
    }

    fn query(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        Ok(self.entries.iter().rev().take(limit).cloned().collect())
    }
}

// ── JsonFileStore ─────────────────────────────────────────────────────────────

/// File-backed store keeping the full history as one JSON array.
///
/// The file is rewritten atomically (temp file + rename) on every append, so
/// a crash mid-write can never leave a torn history behind. All I/O and
/// decode failures surface as [`AnalyzerError::Storage`].
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
}

impl JsonFileStore {
    /// Open (or create) the store at `path`.
    ///
    /// A missing file is an empty history; an unreadable or undecodable file
    /// is a storage failure. Entries are re-ordered by `(timestamp, id)` on
    /// load so a hand-edited file still queries newest-first.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<Vec<HistoryEntry>>(&content).map_err(|e| {
                AnalyzerError::Storage(format!(
                    "corrupt history file {}: {}",
                    path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(AnalyzerError::Storage(format!(
                    "cannot read history file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let mut store = Self { path, entries };
        store.entries.sort_by_key(|entry| (entry.timestamp, entry.id));
        debug!(
            "opened history store {} with {} entries",
            store.path.display(),
            store.entries.len()
        );
        Ok(store)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically rewrite the backing file from the in-memory entries.
    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AnalyzerError::Storage(format!("cannot create {}: {}", parent.display(), e)))?;
        }

        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| AnalyzerError::Storage(format!("cannot encode history: {}", e)))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)
            .map_err(|e| AnalyzerError::Storage(format!("cannot write {}: {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            AnalyzerError::Storage(format!("cannot replace {}: {}", self.path.display(), e))
        })?;

        Ok(())
    }
}

impl HistoryStore for JsonFileStore {
    fn append(&mut self, entry: HistoryEntry) -> Result<()> {
        self.entries.push(entry);
        match self.persist() {
            Ok(()) => Ok(()),
            Err(e) => {
                // Keep memory and disk consistent on failure.
                self.entries.pop();
                Err(e)
            }
        }
    }

    fn query(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        Ok(self.entries.iter().rev().take(limit).cloned().collect())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
