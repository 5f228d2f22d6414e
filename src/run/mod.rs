//! Entry points behind the CLI subcommands.
//!
//! `run_export` writes one artifact to disk (atomically) or stdout;
//! `run_server` runs the export service until interrupted.

mod export;
mod output;
mod serve;

pub use export::{run_export, ExportReport};
pub use serve::run_server;
