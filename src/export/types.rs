//! Export types and options.

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::{CSV_PAGE_SIZE, JSON_PAGE_SIZE};

use super::compress::GzipSupport;
use super::tables::{ExportTable, TableSelection};

/// Export format options.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// CSV with BOM, one table per file (for Excel/Sheets)
    Csv,
    /// Pretty-printed JSON mapping table name to rows (for backups and restores)
    Json,
    /// Data-only MySQL dump of INSERT statements
    Sql,
}

impl ExportFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Sql => "sql",
        }
    }

    /// Content type of the uncompressed artifact.
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
            ExportFormat::Sql => "application/sql; charset=utf-8",
        }
    }

    /// Format used when a request names none: CSV for a single table, a JSON
    /// backup for every table or several.
    pub fn default_for(tables: &TableSelection) -> Self {
        match tables {
            TableSelection::Only(tables) if tables.len() == 1 => ExportFormat::Csv,
            _ => ExportFormat::Json,
        }
    }

    /// Whether enumerated codes are translated to display labels by default.
    ///
    /// CSV is read by people; JSON and SQL are read back by tools and must keep
    /// the raw codes.
    pub fn labels_by_default(&self) -> bool {
        matches!(self, ExportFormat::Csv)
    }
}

/// Field delimiter for CSV output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CsvDelimiter {
    /// `;` (what Dutch-locale Excel expects)
    #[default]
    Semicolon,
    /// `,`
    Comma,
}

impl CsvDelimiter {
    pub fn as_byte(&self) -> u8 {
        match self {
            CsvDelimiter::Semicolon => b';',
            CsvDelimiter::Comma => b',',
        }
    }
}

/// Row filters. Each filter applies to the tables that have the column it
/// targets and is ignored for the others.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportFilters {
    /// Production location code (e.g. `sol_emmen`)
    pub location: Option<String>,
    /// Calendar year on the table's date column
    pub year: Option<i32>,
    /// Inclusive lower bound on the table's date column
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the table's date column
    pub date_to: Option<NaiveDate>,
}

impl ExportFilters {
    /// Effective inclusive date bounds: `year` intersected with from/to.
    pub fn date_bounds(&self) -> (Option<NaiveDate>, Option<NaiveDate>) {
        let mut from = self.date_from;
        let mut to = self.date_to;
        if let Some(year) = self.year {
            let start = NaiveDate::from_ymd_opt(year, 1, 1);
            let end = NaiveDate::from_ymd_opt(year, 12, 31);
            from = match (from, start) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            };
            to = match (to, end) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
        }
        (from, to)
    }

    pub fn is_empty(&self) -> bool {
        self.location.is_none()
            && self.year.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }

    /// Location filter, if the table has a location column.
    pub fn location_for(&self, table: ExportTable) -> Option<&str> {
        if table.has_location() {
            self.location.as_deref()
        } else {
            None
        }
    }

    /// Date column and bounds, if the table has a date column and any bound is set.
    pub fn date_range_for(
        &self,
        table: ExportTable,
    ) -> Option<(&'static str, Option<NaiveDate>, Option<NaiveDate>)> {
        let column = table.date_column()?;
        match self.date_bounds() {
            (None, None) => None,
            (from, to) => Some((column, from, to)),
        }
    }

    /// Filename suffix segments, in the order the original reports used.
    pub(crate) fn filename_segments(&self) -> Vec<String> {
        let mut segments = Vec::new();
        if let Some(year) = self.year {
            segments.push(year.to_string());
        }
        if let Some(location) = &self.location {
            segments.push(location.clone());
        }
        segments
    }
}

/// A validated export request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportRequest {
    pub tables: TableSelection,
    pub format: ExportFormat,
    pub compress: bool,
    pub filters: ExportFilters,
    /// CSV delimiter; the exporter default applies when `None`
    pub delimiter: Option<CsvDelimiter>,
    /// Label translation; the format default applies when `None`
    pub labels: Option<bool>,
    /// Filename stem; derived from the tables when `None`
    pub purpose: Option<String>,
}

impl ExportRequest {
    pub fn new(tables: TableSelection, format: ExportFormat) -> Self {
        Self {
            tables,
            format,
            compress: false,
            filters: ExportFilters::default(),
            delimiter: None,
            labels: None,
            purpose: None,
        }
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn with_filters(mut self, filters: ExportFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_delimiter(mut self, delimiter: CsvDelimiter) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_labels(mut self, labels: bool) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    pub(crate) fn labels_enabled(&self) -> bool {
        self.labels
            .unwrap_or_else(|| self.format.labels_by_default())
    }
}

/// Exporter tuning shared by every request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportSettings {
    /// Rows per page for CSV exports
    pub csv_page_size: u64,
    /// Rows per page for JSON and SQL exports
    pub json_page_size: u64,
    /// CSV delimiter when the request does not name one
    pub default_delimiter: CsvDelimiter,
    /// Runtime gzip capability
    pub gzip: GzipSupport,
}

impl ExportSettings {
    pub fn page_size(&self, format: ExportFormat) -> u64 {
        match format {
            ExportFormat::Csv => self.csv_page_size,
            ExportFormat::Json | ExportFormat::Sql => self.json_page_size,
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            csv_page_size: CSV_PAGE_SIZE,
            json_page_size: JSON_PAGE_SIZE,
            default_delimiter: CsvDelimiter::default(),
            gzip: GzipSupport::default(),
        }
    }
}

/// A finished in-memory export.
#[derive(Clone, Debug)]
pub struct ExportResult {
    /// Artifact bytes (gzip stream when `compressed`)
    pub content: Vec<u8>,
    pub content_type: String,
    pub filename: String,
    /// Rows summed over every table and page
    pub total_rows: u64,
    pub compressed: bool,
}

/// Outcome of an export streamed into a writer.
#[derive(Clone, Debug)]
pub struct ExportSummary {
    pub filename: String,
    pub content_type: String,
    pub total_rows: u64,
    pub compressed: bool,
    /// Rows per table, in export order
    pub tables: Vec<(ExportTable, u64)>,
}
