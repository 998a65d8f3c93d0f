use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One raw input row: column name → untyped cell value, in column order.
///
/// `serde_json`'s `preserve_order` feature keeps the columns in the order
/// they appeared in the source, which the category fallback relies on.
pub type RawRow = Map<String, Value>;

// ── Canonical metrics ─────────────────────────────────────────────────────────

/// The numeric sensor fields the pipeline understands, independent of how the
/// input names its columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Flow,
    Pressure,
    Temperature,
    RiskScore,
}

impl Metric {
    /// All canonical metrics, in display order.
    pub const ALL: [Metric; 4] = [
        Metric::Flow,
        Metric::Pressure,
        Metric::Temperature,
        Metric::RiskScore,
    ];

    /// Accepted column-name spellings, lowercase. Covers both naming
    /// conventions seen in the field: `Flowrate`/`Pressure`/`Temperature`
    /// and `load`/`risk_score`.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Metric::Flow => &["flowrate", "flow_rate", "flow rate", "flow", "load"],
            Metric::Pressure => &["pressure"],
            Metric::Temperature => &["temperature", "temp"],
            Metric::RiskScore => &["risk_score", "riskscore", "risk score", "risk"],
        }
    }

    /// Canonical display label.
    pub fn label(self) -> &'static str {
        match self {
            Metric::Flow => "flowrate",
            Metric::Pressure => "pressure",
            Metric::Temperature => "temperature",
            Metric::RiskScore => "risk_score",
        }
    }
}

/// The four canonical metric values of one record (or their averages across
/// a dataset). Unresolved metrics stay at 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricValues {
    #[serde(default)]
    pub flowrate: f64,
    #[serde(default)]
    pub pressure: f64,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub risk_score: f64,
}

impl MetricValues {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Flow => self.flowrate,
            Metric::Pressure => self.pressure,
            Metric::Temperature => self.temperature,
            Metric::RiskScore => self.risk_score,
        }
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        match metric {
            Metric::Flow => self.flowrate = value,
            Metric::Pressure => self.pressure = value,
            Metric::Temperature => self.temperature = value,
            Metric::RiskScore => self.risk_score = value,
        }
    }
}

// ── Normalized records ────────────────────────────────────────────────────────

/// One equipment reading after schema normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Human-readable name, synthesized as `"Item N"` when the input had none.
    pub name: String,
    /// Resolved category label (equipment type or first-column fallback).
    pub category: String,
    /// Canonical numeric values, coerced to 0 where unparseable or absent.
    pub metrics: MetricValues,
    /// The original row as ingested, column order preserved.
    pub fields: RawRow,
}

/// A normalized record set plus the canonical metrics that were actually
/// resolved from input columns.
///
/// Every record carries the same canonical field set; `resolved` records
/// which of those fields were backed by a real column (a metric defaulted to
/// 0 because no column matched is not "resolved" and never drives
/// classification).
#[derive(Debug, Clone, Default)]
pub struct NormalizedDataset {
    pub records: Vec<NormalizedRecord>,
    pub resolved: Vec<Metric>,
}

impl NormalizedDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether `metric` was resolved from an actual input column.
    pub fn has(&self, metric: Metric) -> bool {
        self.resolved.contains(&metric)
    }
}

// ── Risk levels ───────────────────────────────────────────────────────────────

/// Health label assigned to each record by the classifier.
///
/// `Critical` is the high-risk predicate (any critical limit strictly
/// exceeded); `Warning` uses the lower warning limits and never counts as
/// high-risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Stable,
    Warning,
    Critical,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Stable => "Stable",
            RiskLevel::Warning => "Warning",
            RiskLevel::Critical => "Critical",
        }
    }
}

// ── History ───────────────────────────────────────────────────────────────────

/// One retained analysis result in the history ledger.
///
/// Immutable once appended; `id` and `timestamp` are assigned by the ledger
/// at append time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique, monotonically increasing identifier.
    pub id: u64,
    /// Name of the analyzed source (file name or submission label).
    pub source_name: String,
    /// Append instant (UTC). Non-decreasing across the ledger.
    pub timestamp: DateTime<Utc>,
    /// Number of records in the analyzed dataset.
    pub total_items: u64,
    /// Mean of the primary metric (flowrate) across the dataset.
    pub average_metric: f64,
    /// Number of records flagged critical by the analysis.
    #[serde(default)]
    pub critical_count: u64,
}

/// The ledger-facing payload of a finished analysis, before the ledger has
/// assigned an id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryDraft {
    pub source_name: String,
    pub total_items: u64,
    pub average_metric: f64,
    pub critical_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── MetricValues ──────────────────────────────────────────────────────

    #[test]
    fn test_metric_values_default_zero() {
        let values = MetricValues::default();
        for metric in Metric::ALL {
            assert_eq!(values.get(metric), 0.0);
        }
    }

    #[test]
    fn test_metric_values_get_set_roundtrip() {
        let mut values = MetricValues::default();
        values.set(Metric::Pressure, 7.5);
        values.set(Metric::Temperature, 131.0);
        assert_eq!(values.get(Metric::Pressure), 7.5);
        assert_eq!(values.get(Metric::Temperature), 131.0);
        assert_eq!(values.get(Metric::Flow), 0.0);
    }

    // ── Metric aliases ────────────────────────────────────────────────────

    #[test]
    fn test_aliases_are_lowercase() {
        for metric in Metric::ALL {
            for alias in metric.aliases() {
                assert_eq!(*alias, alias.to_lowercase());
            }
        }
    }

    #[test]
    fn test_aliases_cover_both_conventions() {
        assert!(Metric::Flow.aliases().contains(&"flowrate"));
        assert!(Metric::Flow.aliases().contains(&"load"));
        assert!(Metric::RiskScore.aliases().contains(&"risk_score"));
    }

    // ── NormalizedDataset ─────────────────────────────────────────────────

    #[test]
    fn test_dataset_has_resolved_metric() {
        let dataset = NormalizedDataset {
            records: vec![],
            resolved: vec![Metric::Pressure],
        };
        assert!(dataset.has(Metric::Pressure));
        assert!(!dataset.has(Metric::Temperature));
        assert!(dataset.is_empty());
    }

    // ── RiskLevel serde ───────────────────────────────────────────────────

    #[test]
    fn test_risk_level_serde_lowercase() {
        let json = serde_json::to_string(&RiskLevel::Critical).unwrap();
        assert_eq!(json, r#""critical""#);
        let back: RiskLevel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RiskLevel::Critical);
    }

    // ── HistoryEntry serde ────────────────────────────────────────────────

    #[test]
    fn test_history_entry_serde_roundtrip() {
        let entry = HistoryEntry {
            id: 7,
            source_name: "plant_a.csv".to_string(),
            timestamp: "2024-03-01T12:00:00Z".parse().unwrap(),
            total_items: 42,
            average_metric: 3.25,
            critical_count: 4,
        };
        let json = serde_json::to_string(&entry).unwrap();
        let back: HistoryEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_history_entry_missing_critical_count_defaults() {
        // Entries persisted before the critical_count field existed.
        let json = r#"{
            "id": 1,
            "source_name": "old.csv",
            "timestamp": "2024-01-01T00:00:00Z",
            "total_items": 3,
            "average_metric": 1.5
        }"#;
        let entry: HistoryEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.critical_count, 0);
    }
}
