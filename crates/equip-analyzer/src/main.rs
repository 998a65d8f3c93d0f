mod bootstrap;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;

use analyzer_core::error::AnalyzerError;
use analyzer_core::formatting;
use analyzer_core::models::Metric;
use analyzer_core::settings::Settings;
use analyzer_core::thresholds::RiskThresholds;
use analyzer_core::time_utils::TimezoneHandler;
use analyzer_data::analysis::{analyze_file, AnalysisReport};
use analyzer_data::reader::{find_data_files, InputFormat};
use analyzer_report::layout::PageLayout;
use analyzer_report::renderer::ReportRenderer;
use analyzer_report::text::render_plain_text;
use analyzer_runtime::ledger::{HistoryLedger, SystemClock};
use analyzer_runtime::orchestrator::WatchOrchestrator;
use analyzer_runtime::store::JsonFileStore;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Equip Analyzer v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Mode: {}, Format: {}, Timezone: {}",
        settings.mode,
        settings.format,
        settings.timezone
    );

    let thresholds = settings.thresholds()?;
    let format = InputFormat::from_flag(&settings.format);
    let timezone = TimezoneHandler::new(&settings.timezone);

    let history_path = settings
        .history_file
        .clone()
        .unwrap_or_else(bootstrap::default_history_path);
    let store = JsonFileStore::open(&history_path)?;
    let mut ledger = HistoryLedger::new(store, SystemClock)?;

    match settings.mode.as_str() {
        "summary" => {
            let input = require_input(&settings)?;
            run_summary(
                &input,
                format,
                &thresholds,
                &mut ledger,
                &timezone,
                settings.history_window,
            )?;
        }

        "report" => {
            let entries = ledger.recent(settings.report_window)?;
            let renderer = ReportRenderer::new(PageLayout::with_truncate(
                settings.filename_truncate as usize,
            ));
            let document = render_plain_text(&renderer.render(&entries));

            match settings.output.as_deref() {
                Some(path) => {
                    std::fs::write(path, document)?;
                    tracing::info!("Report written to {}", path.display());
                }
                None => print!("{}", document),
            }
        }

        "watch" => {
            let input = require_input(&settings)?;
            tracing::info!(
                "Watching {} every {}s",
                input.display(),
                settings.refresh_rate
            );

            let orchestrator = WatchOrchestrator::new(
                Duration::from_secs(u64::from(settings.refresh_rate)),
                input,
                format,
                thresholds,
            );
            let (mut rx, handle) = orchestrator.start(ledger);

            // Consume snapshots until Ctrl+C. The loop also ends if the watch
            // task dies and drops the sender.
            tokio::select! {
                _ = async {
                    while let Some(snapshot) = rx.recv().await {
                        println!(
                            "{}: {} records, {} critical (entry #{})",
                            snapshot.report.metadata.source,
                            snapshot.report.summary.record_count,
                            snapshot.report.high_risk_count(),
                            snapshot.entry_id,
                        );
                    }
                } => {
                    handle.abort();
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received; shutting down watch task");
                    handle.abort();
                }
            }
        }

        unknown => {
            eprintln!("Unknown mode: {}", unknown);
        }
    }

    Ok(())
}

/// The input path, required by the summary and watch modes.
fn require_input(settings: &Settings) -> Result<PathBuf> {
    settings.input.clone().ok_or_else(|| {
        AnalyzerError::Config("an input path is required for this mode".to_string()).into()
    })
}

/// Analyze one file (or every data file under a directory), append each
/// result to the ledger, and print the summaries plus recent history.
fn run_summary(
    input: &Path,
    format: InputFormat,
    thresholds: &RiskThresholds,
    ledger: &mut HistoryLedger<JsonFileStore, SystemClock>,
    timezone: &TimezoneHandler,
    history_window: i64,
) -> Result<()> {
    if input.is_dir() {
        let files = find_data_files(input);
        if files.is_empty() {
            return Err(AnalyzerError::EmptyInput.into());
        }

        // A bad file in a batch is reported and skipped; the batch fails only
        // when nothing could be analyzed.
        let mut analyzed = 0usize;
        for path in &files {
            match analyze_file(path, format, thresholds) {
                Ok(report) => {
                    ledger.append(report.history_draft())?;
                    print_summary(&report);
                    analyzed += 1;
                }
                Err(e) => tracing::warn!(error = %e, "skipping {}", path.display()),
            }
        }
        if analyzed == 0 {
            return Err(AnalyzerError::EmptyInput.into());
        }
    } else {
        let report = analyze_file(input, format, thresholds)?;
        ledger.append(report.history_draft())?;
        print_summary(&report);
    }

    print_history(ledger, history_window, timezone)
}

fn print_summary(report: &AnalysisReport) {
    let summary = &report.summary;

    println!("\n=== {} ===", report.metadata.source);
    println!("Total equipment: {}", summary.record_count);
    for metric in Metric::ALL {
        println!(
            "Average {}: {}",
            metric.label(),
            formatting::format_number(summary.averages.get(metric), 2)
        );
    }

    println!("Type distribution:");
    for (label, count) in &summary.category_distribution {
        println!("  {}: {}", label, count);
    }

    let classification = &report.classification;
    println!(
        "High risk equipment: {} ({}% of fleet, {} at warning level)",
        classification.high_risk_count(),
        formatting::percentage(
            classification.high_risk_count() as f64,
            summary.record_count as f64,
            1
        ),
        classification.warning_count()
    );
    for record in &classification.high_risk_records {
        println!("  {} ({})", record.name, record.category);
    }
}

fn print_history(
    ledger: &HistoryLedger<JsonFileStore, SystemClock>,
    window: i64,
    timezone: &TimezoneHandler,
) -> Result<()> {
    let entries = ledger.recent(window)?;
    if entries.is_empty() {
        return Ok(());
    }

    println!("\nRecent analyses:");
    for entry in &entries {
        println!(
            "  {}  {}  items={} avg={} critical={}",
            timezone.format_standard(entry.timestamp),
            entry.source_name,
            entry.total_items,
            formatting::format_number(entry.average_metric, 2),
            entry.critical_count,
        );
    }
    Ok(())
}
