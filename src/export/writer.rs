//! The seam between the pagination loop and the three output formats.
//!
//! The exporter drives a [`FormatWriter`] through
//! `begin -> (begin_table -> write_rows* -> end_table)* -> finish`, handing it
//! each page as soon as it is fetched. Writers keep only the state they need
//! between pages (a header flag, a pending INSERT batch), never whole tables.

use std::io::Write;

use serde_json::Value;

use crate::error_handling::ExportError;
use crate::source::Row;

use super::csv::CsvWriter;
use super::json::JsonWriter;
use super::sql::SqlWriter;
use super::tables::ExportTable;
use super::types::{CsvDelimiter, ExportFormat};

pub(crate) trait FormatWriter: Send {
    fn begin(&mut self, out: &mut dyn Write) -> Result<(), ExportError>;

    /// Starts a table. `columns` is the table's full column list, possibly
    /// empty when the backend cannot describe it.
    fn begin_table(
        &mut self,
        out: &mut dyn Write,
        table: ExportTable,
        columns: &[String],
    ) -> Result<(), ExportError>;

    fn write_rows(&mut self, out: &mut dyn Write, rows: &[Row]) -> Result<(), ExportError>;

    /// Closes the current table after `rows` rows.
    fn end_table(&mut self, out: &mut dyn Write, rows: u64) -> Result<(), ExportError>;

    fn finish(&mut self, out: &mut dyn Write) -> Result<(), ExportError>;
}

/// Picks the writer for a format.
pub(crate) fn writer_for(
    format: ExportFormat,
    delimiter: CsvDelimiter,
    labels: bool,
) -> Box<dyn FormatWriter> {
    match format {
        ExportFormat::Csv => Box::new(CsvWriter::new(delimiter, labels)),
        ExportFormat::Json => Box::new(JsonWriter::new()),
        ExportFormat::Sql => Box::new(SqlWriter::new()),
    }
}

/// Renders a scalar as a CSV field.
///
/// Null becomes an empty field; nested arrays and objects are written as
/// compact JSON so nothing is lost.
pub(crate) fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(nested) => nested.to_string(),
    }
}

/// Column names of a page when the backend gave none up front.
pub(crate) fn columns_from_rows(rows: &[Row]) -> Vec<String> {
    rows.first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default()
}
