//! Streaming JSON output.
//!
//! The artifact is an object mapping table name to an array of row objects,
//! indented by two spaces. Rows are written page by page, yet the bytes match
//! what `serde_json::to_string_pretty` produces for the whole mapping, so a
//! restore tool can parse it with any JSON reader.

use std::io::Write;

use crate::error_handling::ExportError;
use crate::source::Row;

use super::tables::ExportTable;
use super::writer::FormatWriter;

/// Indentation of a row object inside `{"table": [ ... ]}`.
const ROW_INDENT: &str = "    ";

pub(crate) struct JsonWriter {
    tables: usize,
    rows_in_table: u64,
}

impl JsonWriter {
    pub(crate) fn new() -> Self {
        Self {
            tables: 0,
            rows_in_table: 0,
        }
    }
}

impl FormatWriter for JsonWriter {
    fn begin(&mut self, out: &mut dyn Write) -> Result<(), ExportError> {
        out.write_all(b"{")?;
        Ok(())
    }

    fn begin_table(
        &mut self,
        out: &mut dyn Write,
        table: ExportTable,
        _columns: &[String],
    ) -> Result<(), ExportError> {
        let separator: &[u8] = if self.tables == 0 { b"\n" } else { b",\n" };
        out.write_all(separator)?;
        let key = serde_json::to_string(table.as_str())?;
        write!(out, "  {key}: [")?;
        self.tables += 1;
        self.rows_in_table = 0;
        Ok(())
    }

    fn write_rows(&mut self, out: &mut dyn Write, rows: &[Row]) -> Result<(), ExportError> {
        for row in rows {
            let separator: &[u8] = if self.rows_in_table == 0 { b"\n" } else { b",\n" };
            out.write_all(separator)?;
            let pretty = serde_json::to_string_pretty(row)?;
            for (i, line) in pretty.lines().enumerate() {
                if i > 0 {
                    out.write_all(b"\n")?;
                }
                out.write_all(ROW_INDENT.as_bytes())?;
                out.write_all(line.as_bytes())?;
            }
            self.rows_in_table += 1;
        }
        Ok(())
    }

    fn end_table(&mut self, out: &mut dyn Write, _rows: u64) -> Result<(), ExportError> {
        if self.rows_in_table > 0 {
            out.write_all(b"\n  ]")?;
        } else {
            out.write_all(b"]")?;
        }
        Ok(())
    }

    fn finish(&mut self, out: &mut dyn Write) -> Result<(), ExportError> {
        if self.tables > 0 {
            out.write_all(b"\n}")?;
        } else {
            out.write_all(b"}")?;
        }
        out.flush()?;
        Ok(())
    }
}
