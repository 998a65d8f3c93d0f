//! The history ledger: the sole owner of persisted analysis history.
//!
//! The ledger is an explicit object with injected storage and clock rather
//! than process-wide state, so tests can drive it with a fake clock and an
//! in-memory store. It is append-only; nothing here updates or deletes.

use chrono::{DateTime, Utc};
use tracing::debug;

use analyzer_core::error::Result;
use analyzer_core::models::{HistoryDraft, HistoryEntry};

use crate::store::HistoryStore;

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Entries shown in the summary view.
pub const DEFAULT_SUMMARY_WINDOW: i64 = 5;

/// Entries included in the rendered report.
pub const DEFAULT_REPORT_WINDOW: i64 = 15;

// ── Clock ─────────────────────────────────────────────────────────────────────

/// Timestamp source injected into the ledger.
pub trait Clock: Send {
    fn now(&self) -> DateTime<Utc>;
}

/// The process clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ── HistoryLedger ─────────────────────────────────────────────────────────────

/// Append-only, time-ordered analysis history with bounded read windows.
///
/// Appended entries receive a unique increasing id and a timestamp clamped
/// to be non-decreasing, so iterating from the front always yields
/// non-increasing timestamps even if the wall clock steps backwards.
pub struct HistoryLedger<S: HistoryStore, C: Clock> {
    store: S,
    clock: C,
    next_id: u64,
    last_timestamp: Option<DateTime<Utc>>,
}

impl<S: HistoryStore, C: Clock> HistoryLedger<S, C> {
    /// Wrap `store`, seeding the id counter and timestamp floor from the
    /// most recent persisted entry so restarts never reuse an id.
    pub fn new(store: S, clock: C) -> Result<Self> {
        let latest = store.latest()?;
        Ok(Self {
            next_id: latest.as_ref().map(|entry| entry.id + 1).unwrap_or(1),
            last_timestamp: latest.map(|entry| entry.timestamp),
            store,
            clock,
        })
    }

    /// Append one analysis result. Returns the assigned entry id.
    ///
    /// Never mutates prior entries; the only failure mode is the store
    /// itself, which propagates untouched (no internal retry).
    pub fn append(&mut self, draft: HistoryDraft) -> Result<u64> {
        let now = self.clock.now();
        let timestamp = match self.last_timestamp {
            Some(last) if now < last => last,
            _ => now,
        };

        let id = self.next_id;
        self.store.append(HistoryEntry {
            id,
            source_name: draft.source_name,
            timestamp,
            total_items: draft.total_items,
            average_metric: draft.average_metric,
            critical_count: draft.critical_count,
        })?;

        self.next_id += 1;
        self.last_timestamp = Some(timestamp);
        debug!(id, "history entry appended");
        Ok(id)
    }

    /// The most recent `window` entries, newest-first (fewer if the ledger
    /// holds fewer). A window of zero or less yields an empty sequence.
    pub fn recent(&self, window: i64) -> Result<Vec<HistoryEntry>> {
        if window <= 0 {
            return Ok(Vec::new());
        }
        self.store.query(window as usize)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use std::cell::Cell;

    /// Deterministic test clock: starts at a fixed instant and advances only
    /// when told to (may also step backwards to test clamping).
    struct ManualClock {
        now: Cell<DateTime<Utc>>,
    }

    impl ManualClock {
        fn starting_at(secs: u32) -> Self {
            Self {
                now: Cell::new(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, secs).unwrap()),
            }
        }

        fn set_seconds(&self, secs: u32) {
            self.now
                .set(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, secs).unwrap());
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            self.now.get()
        }
    }

    fn draft(source: &str) -> HistoryDraft {
        HistoryDraft {
            source_name: source.to_string(),
            total_items: 5,
            average_metric: 1.5,
            critical_count: 0,
        }
    }

    fn ledger() -> HistoryLedger<MemoryStore, ManualClock> {
        HistoryLedger::new(MemoryStore::new(), ManualClock::starting_at(0)).unwrap()
    }

    // ── append ────────────────────────────────────────────────────────────────

    #[test]
    fn test_append_assigns_increasing_ids() {
        let mut ledger = ledger();
        let first = ledger.append(draft("a.csv")).unwrap();
        let second = ledger.append(draft("b.csv")).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_append_assigns_clock_timestamp() {
        let mut ledger = ledger();
        ledger.clock.set_seconds(42);
        ledger.append(draft("a.csv")).unwrap();

        let recent = ledger.recent(1).unwrap();
        assert_eq!(recent[0].timestamp.to_rfc3339(), "2024-03-01T12:00:42+00:00");
    }

    #[test]
    fn test_append_clamps_backwards_clock() {
        let mut ledger = ledger();
        ledger.clock.set_seconds(30);
        ledger.append(draft("a.csv")).unwrap();

        // Clock steps backwards; the entry must not sort before its elder.
        ledger.clock.set_seconds(10);
        ledger.append(draft("b.csv")).unwrap();

        let recent = ledger.recent(2).unwrap();
        assert_eq!(recent[0].source_name, "b.csv");
        assert!(recent[0].timestamp >= recent[1].timestamp);
    }

    // ── recent ────────────────────────────────────────────────────────────────

    #[test]
    fn test_recent_returns_min_of_window_and_len() {
        let mut ledger = ledger();
        for i in 0..3 {
            ledger.clock.set_seconds(i);
            ledger.append(draft(&format!("file{i}.csv"))).unwrap();
        }

        assert_eq!(ledger.recent(2).unwrap().len(), 2);
        assert_eq!(ledger.recent(10).unwrap().len(), 3);
    }

    #[test]
    fn test_recent_newest_first_non_increasing_timestamps() {
        let mut ledger = ledger();
        for i in [0u32, 5, 5, 9] {
            ledger.clock.set_seconds(i);
            ledger.append(draft("x.csv")).unwrap();
        }

        let entries = ledger.recent(10).unwrap();
        assert_eq!(entries.len(), 4);
        for pair in entries.windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }
    }

    #[test]
    fn test_recent_includes_just_appended_entry_first() {
        let mut ledger = ledger();
        for i in 0..7 {
            ledger.clock.set_seconds(i);
            ledger.append(draft(&format!("old{i}.csv"))).unwrap();
        }

        ledger.clock.set_seconds(30);
        let id = ledger.append(draft("newest.csv")).unwrap();

        let recent = ledger.recent(DEFAULT_SUMMARY_WINDOW).unwrap();
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].id, id);
        assert_eq!(recent[0].source_name, "newest.csv");
    }

    #[test]
    fn test_recent_identical_timestamps_latest_append_first() {
        let mut ledger = ledger();
        ledger.clock.set_seconds(5);
        ledger.append(draft("first.csv")).unwrap();
        ledger.append(draft("second.csv")).unwrap();

        let recent = ledger.recent(2).unwrap();
        assert_eq!(recent[0].source_name, "second.csv");
        assert_eq!(recent[1].source_name, "first.csv");
    }

    #[test]
    fn test_recent_zero_or_negative_window_is_empty() {
        let mut ledger = ledger();
        ledger.append(draft("a.csv")).unwrap();

        assert!(ledger.recent(0).unwrap().is_empty());
        assert!(ledger.recent(-3).unwrap().is_empty());
    }

    #[test]
    fn test_recent_empty_ledger() {
        let ledger = ledger();
        assert!(ledger.recent(5).unwrap().is_empty());
    }

    // ── restart seeding ───────────────────────────────────────────────────────

    #[test]
    fn test_new_ledger_seeds_ids_from_store() {
        let mut store = MemoryStore::new();
        {
            let mut ledger = HistoryLedger::new(&mut store, ManualClock::starting_at(0)).unwrap();
            ledger.append(draft("a.csv")).unwrap();
            ledger.append(draft("b.csv")).unwrap();
        }

        // A fresh ledger over the same store must continue the id sequence.
        let mut ledger = HistoryLedger::new(&mut store, ManualClock::starting_at(1)).unwrap();
        let id = ledger.append(draft("c.csv")).unwrap();
        assert_eq!(id, 3);
    }
}
