use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the equipment analyzer.
///
/// Data-quality problems inside individual cells are never errors: the
/// normalizer coerces them to defaults. Only structural failures (input that
/// is not row-shaped at all, unreadable files, a failing history store) are
/// surfaced, each as its own variant so callers can map them to distinct
/// user-facing messages.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input bytes could not be interpreted as a sequence of rows.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Zero rows were supplied where the caller required at least one.
    #[error("No data rows supplied")]
    EmptyInput,

    /// The history store failed on append or query.
    #[error("History storage failure: {0}")]
    Storage(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the analyzer crates.
pub type Result<T> = std::result::Result<T, AnalyzerError>;
