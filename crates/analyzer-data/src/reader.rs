//! Input discovery and row loading for the equipment analyzer.
//!
//! Reads sensor readings from delimited CSV files or row-structured JSON
//! documents and converts them into untyped [`RawRow`]s for the schema
//! normalizer. Individual dirty cells are preserved as-is here; only input
//! that is not row-shaped at all is rejected.

use std::path::{Path, PathBuf};

use analyzer_core::error::{AnalyzerError, Result};
use analyzer_core::models::RawRow;
use serde_json::Value;
use tracing::{debug, warn};

// ── Formats ───────────────────────────────────────────────────────────────────

/// Recognized input formats. `Auto` resolves by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Json,
    Auto,
}

impl InputFormat {
    /// Map the CLI `--format` value onto a format. Unrecognized strings fall
    /// back to `Auto` (clap already restricts the accepted set).
    pub fn from_flag(flag: &str) -> Self {
        match flag {
            "csv" => InputFormat::Csv,
            "json" => InputFormat::Json,
            _ => InputFormat::Auto,
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all `.csv` / `.json` files recursively under `data_path`, sorted by
/// path.
pub fn find_data_files(data_path: &Path) -> Vec<PathBuf> {
    if !data_path.exists() {
        warn!("Data path does not exist: {}", data_path.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| {
                        ext.eq_ignore_ascii_case("csv") || ext.eq_ignore_ascii_case("json")
                    })
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Load `path` into raw rows.
///
/// Fails with `FileRead` when the file cannot be read and `MalformedInput`
/// when the bytes cannot be interpreted as rows. An input that parses to
/// zero rows is returned as an empty vector; whether that is acceptable is
/// the caller's decision.
pub fn load_rows(path: &Path, format: InputFormat) -> Result<Vec<RawRow>> {
    let resolved = resolve_format(path, format)?;
    let text = std::fs::read_to_string(path).map_err(|e| AnalyzerError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let rows = if resolved == InputFormat::Csv {
        parse_csv(&text)?
    } else {
        parse_json(&text)?
    };

    debug!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Parse CSV text: the first non-blank line is the header, each later
/// non-blank line one row. Cells are paired with headers by position;
/// missing trailing cells leave their columns absent from the row.
pub fn parse_csv(text: &str) -> Result<Vec<RawRow>> {
    let mut lines = text.lines();

    let header_line = lines
        .by_ref()
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| AnalyzerError::MalformedInput("missing header row".to_string()))?;

    let headers: Vec<String> = split_csv_line(header_line);
    if headers.iter().all(|h| h.is_empty()) {
        return Err(AnalyzerError::MalformedInput(
            "header row has no column names".to_string(),
        ));
    }

    let mut rows: Vec<RawRow> = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let cells = split_csv_line(line);
        let mut row = RawRow::new();
        for (i, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let Some(cell) = cells.get(i) else {
                break;
            };
            row.insert(header.clone(), cell_value(cell));
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Parse row-structured JSON: a top-level array of objects, or an object
/// wrapping one under a `"rows"` / `"records"` key.
pub fn parse_json(text: &str) -> Result<Vec<RawRow>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| AnalyzerError::MalformedInput(format!("invalid JSON: {}", e)))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("rows").or_else(|| map.remove("records")) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(AnalyzerError::MalformedInput(
                    "expected a JSON array of row objects".to_string(),
                ))
            }
        },
        _ => {
            return Err(AnalyzerError::MalformedInput(
                "expected a JSON array of row objects".to_string(),
            ))
        }
    };

    let mut rows: Vec<RawRow> = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(map) => rows.push(map),
            _ => {
                return Err(AnalyzerError::MalformedInput(format!(
                    "row {} is not an object",
                    index + 1
                )))
            }
        }
    }
    Ok(rows)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Resolve `Auto` to a concrete format via the file extension.
fn resolve_format(path: &Path, requested: InputFormat) -> Result<InputFormat> {
    if requested != InputFormat::Auto {
        return Ok(requested);
    }
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("csv") => Ok(InputFormat::Csv),
        Some("json") => Ok(InputFormat::Json),
        _ => Err(AnalyzerError::MalformedInput(format!(
            "cannot determine input format for {}",
            path.display()
        ))),
    }
}

/// Split one CSV line on commas, honouring double-quoted cells (`""` is an
/// escaped quote inside a quoted cell). Each cell is trimmed.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.trim_end_matches('\r').chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                cells.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_string());
    cells
}

/// Convert a CSV cell to a JSON value: clean integers and floats become
/// numbers, everything else stays a string.
fn cell_value(cell: &str) -> Value {
    if let Ok(int) = cell.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Ok(float) = cell.parse::<f64>() {
        if let Some(number) = serde_json::Number::from_f64(float) {
            return Value::Number(number);
        }
    }
    Value::String(cell.to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
