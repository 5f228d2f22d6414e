//! Application initialization and resource setup.
//!
//! This module provides functions to initialize shared resources:
//! - The logger
//! - The row source (SQLite pool or PostgREST client)

mod logger;
mod source;

// Re-export public API
pub use logger::init_logger_with;
pub use source::init_row_source;
