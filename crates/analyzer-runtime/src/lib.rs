//! Runtime layer for the equipment analyzer.
//!
//! Owns the history ledger (with injected storage and clock), the pluggable
//! history stores, and the async watch orchestrator that re-runs analyses on
//! an interval.

pub mod ledger;
pub mod orchestrator;
pub mod store;

pub use analyzer_core as core;
pub use analyzer_data as data;
