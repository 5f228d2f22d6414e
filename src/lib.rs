//! planning_export library: paginated bulk export of PlanningSOL tables
//!
//! This library pages through the tables of a PlanningSOL database (a local
//! SQLite copy or the hosted PostgREST API) and serializes them as CSV for
//! spreadsheets, pretty JSON for backups, or a data-only MySQL dump, with
//! optional gzip compression. The same exporter backs the `export` command and
//! the authenticated HTTP service.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use planning_export::export::{AllowList, BulkExporter, ExportFormat, ExportRequest, ExportSettings, TableSelection};
//! use planning_export::source::SqliteRowSource;
//! use planning_export::storage::open_db_pool;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = open_db_pool(std::path::Path::new("planningsol.db"), 5).await?;
//! let exporter = BulkExporter::new(
//!     Arc::new(SqliteRowSource::new(pool)),
//!     AllowList::all(),
//!     ExportSettings::default(),
//! );
//! let request = ExportRequest::new(TableSelection::All, ExportFormat::Json).with_compression(true);
//! let result = exporter.export(&request, &CancellationToken::new()).await?;
//! std::fs::write(&result.filename, &result.content)?;
//! println!("Exported {} rows to {}", result.total_rows, result.filename);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod config;
pub mod error_handling;
pub mod export;
pub mod initialization;
mod run;
pub mod server;
pub mod source;
pub mod storage;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel, ServeConfig};
pub use error_handling::{ExportError, SourceError};
pub use export::{BulkExporter, ExportFormat, ExportRequest, ExportResult, ExportTable};
pub use run::{run_export, run_server, ExportReport};
pub use source::RowSource;
