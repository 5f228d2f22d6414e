//! Bulk export of PlanningSOL tables.
//!
//! This module pages through tables of an injected row source and serializes
//! them as CSV (for spreadsheets), JSON (for backups) or a MySQL data dump,
//! optionally gzip-compressed.

mod compress;
mod csv;
mod exporter;
mod filename;
mod json;
mod labels;
mod pagination;
mod sql;
mod tables;
mod types;
mod writer;

pub use compress::{compress_payload, GzipSupport, Payload, GZIP_CONTENT_TYPE};
pub use exporter::BulkExporter;
pub use filename::{build_filename, export_stem};
pub use labels::{column_display_name, translate_rows, value_label, LabelLookups};
pub use pagination::{PageCursor, PageState};
pub use tables::{AllowList, ExportTable, TableSelection};
pub use types::{
    CsvDelimiter, ExportFilters, ExportFormat, ExportRequest, ExportResult, ExportSettings,
    ExportSummary,
};
