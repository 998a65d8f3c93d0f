//! Threshold-based risk classification of normalized records.

use analyzer_core::models::{Metric, NormalizedDataset, NormalizedRecord, RiskLevel};
use analyzer_core::thresholds::RiskThresholds;
use tracing::debug;

/// Metrics that participate in classification, in evaluation order. Flow is
/// informational only.
const THRESHOLDED: [Metric; 3] = [Metric::Pressure, Metric::Temperature, Metric::RiskScore];

// ── Classification ────────────────────────────────────────────────────────────

/// The classifier's verdict over one dataset.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Classification {
    /// Records flagged critical, in input order.
    pub high_risk_records: Vec<NormalizedRecord>,
    /// Health level of every input record, aligned with the dataset order.
    pub record_levels: Vec<RiskLevel>,
}

impl Classification {
    /// Number of critical records. Always equals `high_risk_records.len()`.
    pub fn high_risk_count(&self) -> usize {
        self.high_risk_records.len()
    }

    /// Number of records at the warning level.
    pub fn warning_count(&self) -> usize {
        self.record_levels
            .iter()
            .filter(|level| **level == RiskLevel::Warning)
            .count()
    }
}

// ── RiskClassifier ────────────────────────────────────────────────────────────

/// Stateless threshold classifier.
pub struct RiskClassifier;

impl RiskClassifier {
    /// Classify every record in `dataset` against `thresholds`.
    ///
    /// A record is critical when ANY applicable critical limit is strictly
    /// exceeded — a logical OR across the available predicates, so a single
    /// abnormal reading flags the record. Only metrics actually resolved
    /// from input columns are applicable; when none of the thresholded
    /// metrics exist in the input, every record is stable and nothing is
    /// flagged. Pure and order-preserving.
    pub fn classify(dataset: &NormalizedDataset, thresholds: &RiskThresholds) -> Classification {
        let applicable: Vec<Metric> = THRESHOLDED
            .iter()
            .copied()
            .filter(|metric| dataset.has(*metric))
            .collect();

        if applicable.is_empty() && !dataset.is_empty() {
            debug!("no thresholded metrics present; all records stable");
        }

        let mut high_risk_records = Vec::new();
        let mut record_levels = Vec::with_capacity(dataset.len());
        for record in &dataset.records {
            let level = level_for(record, &applicable, thresholds);
            if level == RiskLevel::Critical {
                high_risk_records.push(record.clone());
            }
            record_levels.push(level);
        }

        Classification {
            high_risk_records,
            record_levels,
        }
    }
}

/// Health level of one record given the applicable metrics.
///
/// Any exceeded critical limit wins immediately; otherwise an exceeded
/// warning limit downgrades to warning; a record with no applicable metrics
/// is stable.
fn level_for(
    record: &NormalizedRecord,
    applicable: &[Metric],
    thresholds: &RiskThresholds,
) -> RiskLevel {
    let mut level = RiskLevel::Stable;
    for &metric in applicable {
        let value = record.metrics.get(metric);
        if let Some(limit) = thresholds.critical_limit(metric) {
            if value > limit {
                return RiskLevel::Critical;
            }
        }
        if let Some(limit) = thresholds.warning_limit(metric) {
            if value > limit {
                level = RiskLevel::Warning;
            }
        }
    }
    level
}

// ── Tests ─────────────────────────────────────────────────────────────────────
