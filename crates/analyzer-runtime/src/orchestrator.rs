//! Async watch orchestrator.
//!
//! Re-runs the analysis of one input on a fixed interval in a tokio task,
//! appends every successful run to the history ledger, and forwards
//! [`WatchSnapshot`]s through an `mpsc` channel so the consumer needs no
//! shared mutable state. A failing run is logged and skipped; the loop ends
//! when the consumer goes away.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, warn};

use analyzer_core::thresholds::RiskThresholds;
use analyzer_data::analysis::{analyze_file, AnalysisReport};
use analyzer_data::reader::InputFormat;

use crate::ledger::{Clock, HistoryLedger};
use crate::store::HistoryStore;

// ── Public types ──────────────────────────────────────────────────────────────

/// One completed watch run forwarded to the consumer.
#[derive(Debug, Clone)]
pub struct WatchSnapshot {
    /// Full result of this analysis run.
    pub report: AnalysisReport,
    /// Ledger id assigned to this run's history entry.
    pub entry_id: u64,
}

// ── WatchOrchestrator ─────────────────────────────────────────────────────────

/// Background re-analysis coordinator.
///
/// Call [`WatchOrchestrator::start`] to spin up the watch loop in a
/// dedicated tokio task and receive a channel endpoint for snapshots.
pub struct WatchOrchestrator {
    /// How often to re-run the analysis.
    refresh_interval: Duration,
    /// The file to analyze on every run.
    input: PathBuf,
    /// Input format (usually `Auto`).
    format: InputFormat,
    /// Risk thresholds applied on every run.
    thresholds: RiskThresholds,
}

impl WatchOrchestrator {
    pub fn new(
        refresh_interval: Duration,
        input: PathBuf,
        format: InputFormat,
        thresholds: RiskThresholds,
    ) -> Self {
        Self {
            refresh_interval,
            input,
            format,
            thresholds,
        }
    }

    /// Start the watch loop.
    ///
    /// Takes ownership of the ledger; every successful run appends one
    /// entry. Returns the snapshot receiver and a [`WatchHandle`] that can
    /// abort the loop.
    pub fn start<S, C>(
        self,
        ledger: HistoryLedger<S, C>,
    ) -> (mpsc::Receiver<WatchSnapshot>, WatchHandle)
    where
        S: HistoryStore + 'static,
        C: Clock + 'static,
    {
        // Buffer a few snapshots so a briefly-slow consumer doesn't stall the loop.
        let (tx, rx) = mpsc::channel(16);

        let handle = tokio::spawn(async move {
            self.watch_loop(ledger, tx).await;
        });

        (rx, WatchHandle { handle })
    }

    // ── Private implementation ────────────────────────────────────────────

    /// Runs immediately once, then repeats on `refresh_interval` until the
    /// receiver side of the channel is closed.
    async fn watch_loop<S, C>(
        self,
        mut ledger: HistoryLedger<S, C>,
        tx: mpsc::Sender<WatchSnapshot>,
    ) where
        S: HistoryStore,
        C: Clock,
    {
        self.run_once(&mut ledger, &tx).await;

        let mut interval = time::interval(self.refresh_interval);
        // Consume the first tick which fires immediately; we already ran above.
        interval.tick().await;

        loop {
            interval.tick().await;

            if tx.is_closed() {
                debug!("watch channel closed; exiting loop");
                break;
            }

            self.run_once(&mut ledger, &tx).await;
        }
    }

    /// One analysis run: analyze, append to the ledger, send the snapshot.
    ///
    /// A failure in any step skips this run without ending the loop.
    async fn run_once<S, C>(
        &self,
        ledger: &mut HistoryLedger<S, C>,
        tx: &mpsc::Sender<WatchSnapshot>,
    ) where
        S: HistoryStore,
        C: Clock,
    {
        let report = match analyze_file(&self.input, self.format, &self.thresholds) {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, input = %self.input.display(), "analysis failed; skipping run");
                return;
            }
        };

        let entry_id = match ledger.append(report.history_draft()) {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "history append failed; skipping run");
                return;
            }
        };

        if let Err(e) = tx.send(WatchSnapshot { report, entry_id }).await {
            warn!(error = %e, "failed to send watch snapshot; receiver dropped");
        }
    }
}

// ── WatchHandle ───────────────────────────────────────────────────────────────

/// A handle to the background watch task.
///
/// Drop or call [`WatchHandle::abort`] to stop the loop.
pub struct WatchHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl WatchHandle {
    /// Immediately abort the watch loop.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::SystemClock;
    use crate::store::MemoryStore;
    use std::path::Path;

    fn write_csv(dir: &Path) -> PathBuf {
        let path = dir.join("plant.csv");
        std::fs::write(
            &path,
            "Equipment Name,Type,Flowrate,Pressure,Temperature\n\
             Main Pump,Pump,12,7.5,120\n\
             Relief Valve,Valve,3,2.0,95\n",
        )
        .unwrap();
        path
    }

    fn ledger() -> HistoryLedger<MemoryStore, SystemClock> {
        HistoryLedger::new(MemoryStore::new(), SystemClock).unwrap()
    }

    // ── orchestrator creation ─────────────────────────────────────────────

    #[test]
    fn test_orchestrator_creation() {
        let orch = WatchOrchestrator::new(
            Duration::from_secs(5),
            PathBuf::from("/tmp/plant.csv"),
            InputFormat::Auto,
            RiskThresholds::default(),
        );
        assert_eq!(orch.refresh_interval, Duration::from_secs(5));
        assert_eq!(orch.input, PathBuf::from("/tmp/plant.csv"));
        assert_eq!(orch.format, InputFormat::Auto);
    }

    // ── async: start / abort ──────────────────────────────────────────────

    #[tokio::test]
    async fn test_orchestrator_start_and_abort() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = write_csv(dir.path());

        let orch = WatchOrchestrator::new(
            Duration::from_secs(60),
            input,
            InputFormat::Auto,
            RiskThresholds::default(),
        );
        let (_rx, handle) = orch.start(ledger());

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();
    }

    // ── async: snapshots ──────────────────────────────────────────────────

    #[tokio::test]
    async fn test_orchestrator_sends_initial_snapshot() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = write_csv(dir.path());

        let orch = WatchOrchestrator::new(
            Duration::from_secs(60),
            input,
            InputFormat::Auto,
            RiskThresholds::default(),
        );
        let (mut rx, handle) = orch.start(ledger());

        let snapshot = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for snapshot")
            .expect("channel closed before receiving snapshot");

        assert_eq!(snapshot.entry_id, 1);
        assert_eq!(snapshot.report.summary.record_count, 2);
        assert_eq!(snapshot.report.high_risk_count(), 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_orchestrator_appends_each_run() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = write_csv(dir.path());

        let orch = WatchOrchestrator::new(
            Duration::from_millis(50),
            input,
            InputFormat::Auto,
            RiskThresholds::default(),
        );
        let (mut rx, handle) = orch.start(ledger());

        let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out")
            .expect("channel closed");
        let second = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out")
            .expect("channel closed");

        assert_eq!(first.entry_id, 1);
        assert_eq!(second.entry_id, 2);

        handle.abort();
    }

    #[tokio::test]
    async fn test_orchestrator_failed_analysis_sends_nothing() {
        let orch = WatchOrchestrator::new(
            Duration::from_secs(60),
            PathBuf::from("/does/not/exist.csv"),
            InputFormat::Auto,
            RiskThresholds::default(),
        );
        let (mut rx, handle) = orch.start(ledger());

        // The initial run fails; no snapshot may arrive.
        let outcome = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
        assert!(outcome.is_err(), "no snapshot expected for a failing input");

        handle.abort();
    }
}
