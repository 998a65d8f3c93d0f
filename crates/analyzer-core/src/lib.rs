//! Shared foundation for the equipment analyzer.
//!
//! Holds the data model (canonical metrics, normalized records, history
//! entries), the validated risk-threshold configuration, the error taxonomy,
//! CLI settings with last-used persistence, and small formatting / timezone
//! helpers used by the other crates.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod thresholds;
pub mod time_utils;
