//! Error handling and export statistics.
//!
//! This module provides:
//! - Error type definitions for initialization, storage, row sources and exports
//! - Outcome categories and thread-safe counters for the export service

mod stats;
mod types;

// Re-export public API
pub use stats::ExportStats;
pub use types::{DatabaseError, ExportError, ExportOutcome, InitializationError, SourceError};
