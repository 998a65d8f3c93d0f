//! Main analysis pipeline for the equipment analyzer.
//!
//! Orchestrates loading, schema normalization, aggregation and risk
//! classification, returning an [`AnalysisReport`] ready for the history
//! ledger and the presentation layer.

use std::path::Path;

use analyzer_core::error::{AnalyzerError, Result};
use analyzer_core::models::{HistoryDraft, Metric, RawRow};
use analyzer_core::thresholds::RiskThresholds;
use chrono::Utc;
use tracing::debug;

use crate::aggregator::{Aggregator, Summary};
use crate::classifier::{Classification, RiskClassifier};
use crate::reader::{load_rows, InputFormat};
use crate::schema::SchemaResolver;

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the analysis result.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AnalysisMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    /// Name of the analyzed source (file name or submission label).
    pub source: String,
    /// Number of raw rows processed.
    pub rows_processed: usize,
    /// Wall-clock seconds spent reading and parsing the input.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent normalizing, aggregating and classifying.
    pub analyze_time_seconds: f64,
}

/// The complete output of one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Aggregate statistics.
    pub summary: Summary,
    /// Risk classification of the same dataset.
    pub classification: Classification,
    /// Metadata about this run.
    pub metadata: AnalysisMetadata,
}

impl AnalysisReport {
    /// Number of records flagged critical.
    pub fn high_risk_count(&self) -> usize {
        self.classification.high_risk_count()
    }

    /// Ledger-facing payload of this run: source name, record count, mean
    /// flowrate and flagged count. The ledger assigns id and timestamp.
    pub fn history_draft(&self) -> HistoryDraft {
        HistoryDraft {
            source_name: self.metadata.source.clone(),
            total_items: self.summary.record_count as u64,
            average_metric: self.summary.averages.get(Metric::Flow),
            critical_count: self.high_risk_count() as u64,
        }
    }
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the pipeline over in-memory rows.
///
/// Normalization, aggregation and classification never fail for
/// data-quality reasons; dirty cells are coerced by the normalizer. The
/// aggregator and classifier both read the same immutable dataset.
pub fn analyze_rows(rows: &[RawRow], thresholds: &RiskThresholds, source: &str) -> AnalysisReport {
    let analyze_start = std::time::Instant::now();

    let dataset = SchemaResolver::normalize(rows);
    let summary = Aggregator::summarize(&dataset);
    let classification = RiskClassifier::classify(&dataset, thresholds);

    let analyze_time = analyze_start.elapsed().as_secs_f64();
    debug!(
        rows = rows.len(),
        high_risk = classification.high_risk_count(),
        "analysis complete"
    );

    AnalysisReport {
        summary,
        classification,
        metadata: AnalysisMetadata {
            generated_at: Utc::now().to_rfc3339(),
            source: source.to_string(),
            rows_processed: rows.len(),
            load_time_seconds: 0.0,
            analyze_time_seconds: analyze_time,
        },
    }
}

/// Load `path` and run the pipeline over its rows.
///
/// Structural failures propagate: `FileRead` when the file is unreadable,
/// `MalformedInput` when it is not row-shaped, and `EmptyInput` when it
/// parses to zero rows.
pub fn analyze_file(
    path: &Path,
    format: InputFormat,
    thresholds: &RiskThresholds,
) -> Result<AnalysisReport> {
    let load_start = std::time::Instant::now();
    let rows = load_rows(path, format)?;
    let load_time = load_start.elapsed().as_secs_f64();

    if rows.is_empty() {
        return Err(AnalyzerError::EmptyInput);
    }

    let source = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("input")
        .to_string();

    let mut report = analyze_rows(&rows, thresholds, &source);
    report.metadata.load_time_seconds = load_time;
    Ok(report)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
