//! Data-only MySQL dump output.
//!
//! Produces `INSERT` statements that load the exported rows into an existing
//! MySQL schema of the same shape. Foreign key checks are switched off for the
//! duration of the script so tables can be replayed in any order. Nothing
//! time-dependent is written, so the same data always dumps to the same bytes.

use std::io::Write;

use serde_json::Value;

use crate::config::SQL_INSERT_BATCH_ROWS;
use crate::error_handling::ExportError;
use crate::source::Row;

use super::tables::ExportTable;
use super::writer::{columns_from_rows, FormatWriter};

const PREAMBLE: &str = "-- PlanningSOL data export\n\
-- --------------------------------------------------------\n\
\n\
SET NAMES utf8mb4;\n\
SET FOREIGN_KEY_CHECKS = 0;\n\
SET SQL_MODE = 'NO_AUTO_VALUE_ON_ZERO';\n\
\n";

pub(crate) struct SqlWriter {
    table: Option<ExportTable>,
    columns: Vec<String>,
    /// Rendered `(...)` tuples waiting for the next INSERT
    pending: Vec<String>,
    total_rows: u64,
}

impl SqlWriter {
    pub(crate) fn new() -> Self {
        Self {
            table: None,
            columns: Vec::new(),
            pending: Vec::with_capacity(SQL_INSERT_BATCH_ROWS),
            total_rows: 0,
        }
    }

    fn flush_pending(&mut self, out: &mut dyn Write) -> Result<(), ExportError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let Some(table) = self.table else {
            return Ok(());
        };
        let column_list = self
            .columns
            .iter()
            .map(|c| quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(
            out,
            "INSERT INTO {} ({}) VALUES\n{};",
            quote_identifier(table.as_str()),
            column_list,
            self.pending.join(",\n")
        )?;
        self.pending.clear();
        Ok(())
    }
}

impl FormatWriter for SqlWriter {
    fn begin(&mut self, out: &mut dyn Write) -> Result<(), ExportError> {
        out.write_all(PREAMBLE.as_bytes())?;
        Ok(())
    }

    fn begin_table(
        &mut self,
        out: &mut dyn Write,
        table: ExportTable,
        columns: &[String],
    ) -> Result<(), ExportError> {
        writeln!(out, "-- Table: {table}")?;
        self.table = Some(table);
        self.columns = columns.to_vec();
        self.pending.clear();
        Ok(())
    }

    fn write_rows(&mut self, out: &mut dyn Write, rows: &[Row]) -> Result<(), ExportError> {
        if self.columns.is_empty() {
            self.columns = columns_from_rows(rows);
        }
        for row in rows {
            let values = self
                .columns
                .iter()
                .map(|column| sql_literal(row.get(column)))
                .collect::<Vec<_>>()
                .join(", ");
            self.pending.push(format!("({values})"));
            if self.pending.len() >= SQL_INSERT_BATCH_ROWS {
                self.flush_pending(out)?;
            }
        }
        Ok(())
    }

    fn end_table(&mut self, out: &mut dyn Write, rows: u64) -> Result<(), ExportError> {
        self.flush_pending(out)?;
        let table = self.table.take().map(|t| t.as_str()).unwrap_or_default();
        if rows > 0 {
            writeln!(out, "-- {rows} rows exported for {table}")?;
        } else {
            writeln!(out, "-- 0 rows in {table}")?;
        }
        writeln!(out)?;
        self.total_rows += rows;
        Ok(())
    }

    fn finish(&mut self, out: &mut dyn Write) -> Result<(), ExportError> {
        writeln!(out, "SET FOREIGN_KEY_CHECKS = 1;")?;
        writeln!(out)?;
        writeln!(out, "-- Export complete: {} total rows", self.total_rows)?;
        out.flush()?;
        Ok(())
    }
}

fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Renders a value as a MySQL literal.
fn sql_literal(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "NULL".to_string(),
        Some(Value::Bool(b)) => (if *b { "1" } else { "0" }).to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => quote_string(s),
        Some(nested) => quote_string(&nested.to_string()),
    }
}

fn quote_string(raw: &str) -> String {
    let mut quoted = String::with_capacity(raw.len() + 2);
    quoted.push('\'');
    for c in raw.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\0' => quoted.push_str("\\0"),
            '\u{1a}' => quoted.push_str("\\Z"),
            other => quoted.push(other),
        }
    }
    quoted.push('\'');
    quoted
}
