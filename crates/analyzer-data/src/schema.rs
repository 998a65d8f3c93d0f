//! Schema normalization: resolving loosely-named input columns onto the
//! canonical sensor fields.
//!
//! Normalization is a pure transform and never fails: unmatched numeric
//! columns default every row to 0, unparseable cells coerce to 0, and missing
//! names are synthesized. The output always contains exactly one record per
//! input row.

use analyzer_core::models::{Metric, MetricValues, NormalizedDataset, NormalizedRecord, RawRow};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// Column names accepted as the category source, lowercase, in priority order.
const CATEGORY_ALIASES: &[&str] = &["type", "equipment_type", "equipment type", "category"];

/// Column names accepted as the record name, lowercase, in priority order.
const NAME_ALIASES: &[&str] = &["equipment name", "equipment_name", "name", "equipment"];

/// Category label used when a row has no usable category value.
const UNKNOWN_CATEGORY: &str = "Unknown";

// ── SchemaResolver ────────────────────────────────────────────────────────────

/// Stateless resolver mapping heterogeneous rows onto canonical records.
pub struct SchemaResolver;

impl SchemaResolver {
    /// Normalize raw rows into the canonical record shape.
    ///
    /// Each canonical metric is resolved to the first column whose lowercased
    /// name matches one of its aliases (alias priority first, then row
    /// order); metrics with no matching column stay 0 for every row. The
    /// category comes from a type-style column when one exists, otherwise
    /// from the first column of each row. Names fall back to
    /// `"Item N"` (1-based).
    pub fn normalize(rows: &[RawRow]) -> NormalizedDataset {
        let mut resolved: Vec<Metric> = Vec::new();
        let mut columns: Vec<(Metric, String)> = Vec::new();
        for metric in Metric::ALL {
            if let Some(column) = resolve_column(rows, metric.aliases()) {
                debug!("resolved {} from column \"{}\"", metric.label(), column);
                resolved.push(metric);
                columns.push((metric, column));
            }
        }

        let category_column = resolve_column(rows, CATEGORY_ALIASES);
        let name_column = resolve_column(rows, NAME_ALIASES);

        let records = rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let mut metrics = MetricValues::default();
                for (metric, column) in &columns {
                    let value = row.get(column).and_then(lenient_number).unwrap_or(0.0);
                    metrics.set(*metric, value);
                }
                NormalizedRecord {
                    name: resolve_name(row, name_column.as_deref(), index),
                    category: resolve_category(row, category_column.as_deref()),
                    metrics,
                    fields: row.clone(),
                }
            })
            .collect();

        NormalizedDataset { records, resolved }
    }
}

// ── Cell coercion ─────────────────────────────────────────────────────────────

/// Best-effort numeric view of a cell.
///
/// Numbers pass through; strings get a plain float parse first and then a
/// scan for the first embedded decimal literal (`"7.5 bar"` → 7.5). Anything
/// else is `None`, which the normalizer turns into 0.
pub fn lenient_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            if let Ok(parsed) = trimmed.parse::<f64>() {
                return Some(parsed);
            }
            let re = Regex::new(r"-?\d+(?:\.\d+)?").expect("regex is valid");
            re.find(trimmed).and_then(|m| m.as_str().parse().ok())
        }
        _ => None,
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// First column whose lowercased, trimmed name matches one of `aliases`.
///
/// Aliases are checked in priority order, rows in input order, so a
/// preferred spelling anywhere in the input wins over a fallback spelling in
/// an earlier row.
fn resolve_column(rows: &[RawRow], aliases: &[&str]) -> Option<String> {
    for alias in aliases {
        for row in rows {
            for key in row.keys() {
                if key.trim().to_lowercase() == *alias {
                    return Some(key.clone());
                }
            }
        }
    }
    None
}

/// Category label for one row.
///
/// When no type-style column exists anywhere in the input, the first column
/// of the row is the category source. Coarse, but it keeps
/// differently-shaped uploads countable instead of rejected.
fn resolve_category(row: &RawRow, column: Option<&str>) -> String {
    if let Some(column) = column {
        if let Some(label) = row.get(column).and_then(display_label) {
            return label;
        }
    } else if let Some((_, value)) = row.iter().next() {
        if let Some(label) = display_label(value) {
            return label;
        }
    }
    UNKNOWN_CATEGORY.to_string()
}

/// Record name for one row, synthesized from the 1-based position when the
/// input has no usable name column.
fn resolve_name(row: &RawRow, column: Option<&str>, index: usize) -> String {
    if let Some(column) = column {
        if let Some(label) = row.get(column).and_then(display_label) {
            return label;
        }
    }
    format!("Item {}", index + 1)
}

/// Render a cell as a non-empty display string, if possible.
fn display_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
