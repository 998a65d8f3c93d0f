//! Report rendering layer for the equipment analyzer.
//!
//! Lays history-ledger entries out into deterministic, paginated pages and
//! provides a plain-text document sink that serializes those pages for a
//! file or stdout.

pub mod layout;
pub mod renderer;
pub mod text;

pub use analyzer_core as core;
