//! Aggregate statistics over a normalized record set.

use std::collections::HashMap;

use analyzer_core::models::{Metric, MetricValues, NormalizedDataset};

// ── Summary ───────────────────────────────────────────────────────────────────

/// Aggregate statistics of one normalized dataset.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Summary {
    /// Number of records in the dataset.
    pub record_count: usize,
    /// Mean of each canonical metric. Exactly 0 for an empty dataset or an
    /// unresolved metric.
    pub averages: MetricValues,
    /// `(label, count)` per category, in first-seen order. Counts always sum
    /// to `record_count`.
    pub category_distribution: Vec<(String, u32)>,
}

impl Summary {
    /// Count for one category label, or 0 when the label never occurred.
    pub fn category_count(&self, label: &str) -> u32 {
        self.category_distribution
            .iter()
            .find(|(candidate, _)| candidate == label)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }
}

// ── Aggregator ────────────────────────────────────────────────────────────────

/// Stateless helper computing dataset-level statistics.
pub struct Aggregator;

impl Aggregator {
    /// Summarize a dataset.
    ///
    /// Deterministic: the same dataset always yields the same summary. Never
    /// divides by zero; an empty dataset produces all-zero averages.
    pub fn summarize(dataset: &NormalizedDataset) -> Summary {
        let record_count = dataset.len();

        let mut averages = MetricValues::default();
        if record_count > 0 {
            for metric in Metric::ALL {
                if !dataset.has(metric) {
                    continue;
                }
                let sum: f64 = dataset
                    .records
                    .iter()
                    .map(|record| record.metrics.get(metric))
                    .sum();
                averages.set(metric, sum / record_count as f64);
            }
        }

        // First-seen label order, constant-time lookup while counting.
        let mut category_distribution: Vec<(String, u32)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for record in &dataset.records {
            match positions.get(&record.category) {
                Some(&position) => category_distribution[position].1 += 1,
                None => {
                    positions.insert(record.category.clone(), category_distribution.len());
                    category_distribution.push((record.category.clone(), 1));
                }
            }
        }

        Summary {
            record_count,
            averages,
            category_distribution,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaResolver;
    use analyzer_core::models::RawRow;
    use serde_json::{json, Value};

    fn dataset_from(rows: Vec<Value>) -> NormalizedDataset {
        let raw: Vec<RawRow> = rows
            .into_iter()
            .map(|value| match value {
                Value::Object(map) => map,
                _ => panic!("test rows must be objects"),
            })
            .collect();
        SchemaResolver::normalize(&raw)
    }

    // ── averages ──────────────────────────────────────────────────────────────

    #[test]
    fn test_summarize_averages() {
        let dataset = dataset_from(vec![
            json!({"Flowrate": 10, "Pressure": 4}),
            json!({"Flowrate": 20, "Pressure": 6}),
        ]);
        let summary = Aggregator::summarize(&dataset);

        assert_eq!(summary.record_count, 2);
        assert!((summary.averages.flowrate - 15.0).abs() < 1e-9);
        assert!((summary.averages.pressure - 5.0).abs() < 1e-9);
        assert_eq!(summary.averages.temperature, 0.0);
    }

    #[test]
    fn test_summarize_empty_dataset() {
        let dataset = dataset_from(vec![]);
        let summary = Aggregator::summarize(&dataset);

        assert_eq!(summary.record_count, 0);
        for metric in Metric::ALL {
            assert_eq!(summary.averages.get(metric), 0.0);
        }
        assert!(summary.category_distribution.is_empty());
    }

    #[test]
    fn test_summarize_coerced_cells_count_as_zero() {
        let dataset = dataset_from(vec![
            json!({"Pressure": "broken"}),
            json!({"Pressure": 10}),
        ]);
        let summary = Aggregator::summarize(&dataset);
        assert!((summary.averages.pressure - 5.0).abs() < 1e-9);
    }

    // ── category distribution ─────────────────────────────────────────────────

    #[test]
    fn test_summarize_category_distribution_first_seen_order() {
        let dataset = dataset_from(vec![
            json!({"Type": "Pump"}),
            json!({"Type": "Valve"}),
            json!({"Type": "Pump"}),
        ]);
        let summary = Aggregator::summarize(&dataset);

        assert_eq!(
            summary.category_distribution,
            vec![("Pump".to_string(), 2), ("Valve".to_string(), 1)]
        );
        assert_eq!(summary.category_count("Pump"), 2);
        assert_eq!(summary.category_count("Compressor"), 0);
    }

    #[test]
    fn test_summarize_distribution_sums_to_record_count() {
        let dataset = dataset_from(vec![
            json!({"Type": "Pump"}),
            json!({"Unit": "Boiler"}),
            json!({}),
            json!({"Type": "Pump"}),
        ]);
        let summary = Aggregator::summarize(&dataset);

        let total: u32 = summary
            .category_distribution
            .iter()
            .map(|(_, count)| count)
            .sum();
        assert_eq!(total as usize, summary.record_count);
    }

    #[test]
    fn test_summarize_no_numeric_fields_no_crash() {
        let dataset = dataset_from(vec![
            json!({"Type": "Pump"}),
            json!({"Type": "Valve"}),
            json!({"Type": "Pump"}),
        ]);
        let summary = Aggregator::summarize(&dataset);

        assert_eq!(summary.category_count("Pump"), 2);
        assert_eq!(summary.category_count("Valve"), 1);
        for metric in Metric::ALL {
            assert_eq!(summary.averages.get(metric), 0.0);
        }
    }

    // ── determinism ───────────────────────────────────────────────────────────

    #[test]
    fn test_summarize_deterministic() {
        let dataset = dataset_from(vec![
            json!({"Type": "Pump", "Pressure": 3.3}),
            json!({"Type": "Valve", "Pressure": 8.1}),
        ]);
        let first = Aggregator::summarize(&dataset);
        let second = Aggregator::summarize(&dataset);

        assert_eq!(first.record_count, second.record_count);
        assert_eq!(first.category_distribution, second.category_distribution);
        assert_eq!(first.averages, second.averages);
    }
}
