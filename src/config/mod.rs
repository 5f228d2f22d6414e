//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (page sizes, limits, defaults)
//! - Library configuration types with validation
//! - CLI parsing

mod cli;
mod constants;
mod types;

// Re-export all constants
pub use cli::{Cli, Command, ExportArgs, ServeArgs};
pub use constants::*;
pub use types::{BackendConfig, Config, ConfigValidationError, LogFormat, LogLevel, ServeConfig};
