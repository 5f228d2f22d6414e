//! CSV output.
//!
//! One table per artifact: a UTF-8 BOM so spreadsheet tools pick the right
//! encoding, one header line, then one line per row. Quoting is left to the
//! `csv` crate (`QuoteStyle::Necessary`), which quotes fields containing the
//! delimiter, a quote, CR or LF and doubles inner quotes.

use std::io::Write;

use csv::{QuoteStyle, WriterBuilder};

use crate::config::UTF8_BOM;
use crate::error_handling::ExportError;
use crate::source::Row;

use super::labels::header_for;
use super::tables::ExportTable;
use super::types::CsvDelimiter;
use super::writer::{columns_from_rows, field_text, FormatWriter};

pub(crate) struct CsvWriter {
    delimiter: CsvDelimiter,
    labels: bool,
    columns: Vec<String>,
    header_written: bool,
}

impl CsvWriter {
    pub(crate) fn new(delimiter: CsvDelimiter, labels: bool) -> Self {
        Self {
            delimiter,
            labels,
            columns: Vec::new(),
            header_written: false,
        }
    }

    fn write_records<I>(&self, out: &mut dyn Write, records: I) -> Result<(), ExportError>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter.as_byte())
            .quote_style(QuoteStyle::Necessary)
            .has_headers(false)
            .from_writer(out);
        for record in records {
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_header(&mut self, out: &mut dyn Write) -> Result<(), ExportError> {
        let header: Vec<String> = self
            .columns
            .iter()
            .map(|c| header_for(c, self.labels).to_string())
            .collect();
        self.write_records(out, [header])?;
        self.header_written = true;
        Ok(())
    }
}

impl FormatWriter for CsvWriter {
    fn begin(&mut self, out: &mut dyn Write) -> Result<(), ExportError> {
        out.write_all(UTF8_BOM)?;
        Ok(())
    }

    fn begin_table(
        &mut self,
        out: &mut dyn Write,
        _table: ExportTable,
        columns: &[String],
    ) -> Result<(), ExportError> {
        self.columns = columns.to_vec();
        self.header_written = false;
        if !self.columns.is_empty() {
            self.write_header(out)?;
        }
        Ok(())
    }

    fn write_rows(&mut self, out: &mut dyn Write, rows: &[Row]) -> Result<(), ExportError> {
        if rows.is_empty() {
            return Ok(());
        }
        if !self.header_written {
            self.columns = columns_from_rows(rows);
            self.write_header(out)?;
        }
        let records: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|column| field_text(row.get(column)))
                    .collect()
            })
            .collect();
        self.write_records(out, records)
    }

    fn end_table(&mut self, _out: &mut dyn Write, _rows: u64) -> Result<(), ExportError> {
        Ok(())
    }

    fn finish(&mut self, out: &mut dyn Write) -> Result<(), ExportError> {
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("test rows must be objects"),
        }
    }

    fn render(delimiter: CsvDelimiter, labels: bool, columns: &[&str], rows: &[Row]) -> String {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let mut out = Vec::new();
        let mut writer = CsvWriter::new(delimiter, labels);
        writer.begin(&mut out).unwrap();
        writer
            .begin_table(&mut out, ExportTable::Customers, &columns)
            .unwrap();
        writer.write_rows(&mut out, rows).unwrap();
        writer.end_table(&mut out, rows.len() as u64).unwrap();
        writer.finish(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_bom_header_and_rows() {
        let rows = vec![
            row(json!({"id": 1, "name": "Air Liquide", "is_active": true})),
            row(json!({"id": 2, "name": "Linde", "is_active": false})),
        ];
        let text = render(CsvDelimiter::Semicolon, false, &["id", "name", "is_active"], &rows);
        assert!(text.starts_with('\u{feff}'));
        assert_eq!(
            text.trim_start_matches('\u{feff}'),
            "id;name;is_active\n1;Air Liquide;true\n2;Linde;false\n"
        );
    }

    #[test]
    fn test_fields_needing_quotes() {
        let rows = vec![row(json!({
            "id": 1,
            "name": "De \"Boer\"; BV",
            "notes": "line one\nline two",
        }))];
        let text = render(CsvDelimiter::Semicolon, false, &["id", "name", "notes"], &rows);
        assert!(text.contains("\"De \"\"Boer\"\"; BV\""));
        assert!(text.contains("\"line one\nline two\""));
    }

    #[test]
    fn test_comma_delimiter_leaves_semicolons_unquoted() {
        let rows = vec![row(json!({"id": 1, "name": "a;b"}))];
        let text = render(CsvDelimiter::Comma, false, &["id", "name"], &rows);
        assert!(text.ends_with("id,name\n1,a;b\n"));
    }

    #[test]
    fn test_empty_table_is_header_only() {
        let text = render(CsvDelimiter::Semicolon, false, &["id", "name"], &[]);
        assert_eq!(text, "\u{feff}id;name\n");
    }

    #[test]
    fn test_header_uses_display_names_with_labels() {
        let text = render(CsvDelimiter::Semicolon, true, &["order_number", "customer_id"], &[]);
        assert_eq!(text, "\u{feff}Ordernummer;customer_id\n");
    }

    #[test]
    fn test_missing_columns_fall_back_to_first_row() {
        let rows = vec![row(json!({"key": "theme", "value": null}))];
        let text = render(CsvDelimiter::Semicolon, false, &[], &rows);
        assert_eq!(text, "\u{feff}key;value\ntheme;\n");
    }
}
