//! Artifact filenames: `<purpose>_<YYYY-MM-DD>.<ext>[.gz]`.

use chrono::NaiveDate;

use crate::config::DEFAULT_EXPORT_PURPOSE;

use super::tables::ExportTable;
use super::types::{ExportFilters, ExportFormat};

/// Builds the filename stem for a request.
///
/// An explicit purpose wins; otherwise a single-table export is named after
/// its table and anything wider gets the generic export name. Year and
/// location filters are appended so filtered exports don't collide.
pub fn export_stem(purpose: Option<&str>, tables: &[ExportTable], filters: &ExportFilters) -> String {
    let base = match purpose.map(sanitize).filter(|p| !p.is_empty()) {
        Some(purpose) => purpose,
        None => match tables {
            [single] => single.as_str().to_string(),
            _ => DEFAULT_EXPORT_PURPOSE.to_string(),
        },
    };

    let mut stem = base;
    for segment in filters.filename_segments() {
        let segment = sanitize(&segment);
        if !segment.is_empty() {
            stem.push('_');
            stem.push_str(&segment);
        }
    }
    stem
}

/// Full filename for an artifact.
pub fn build_filename(stem: &str, date: NaiveDate, format: ExportFormat, compressed: bool) -> String {
    let mut name = format!("{}_{}.{}", stem, date.format("%Y-%m-%d"), format.extension());
    if compressed {
        name.push_str(".gz");
    }
    name
}

/// Keeps `[A-Za-z0-9_-]`, turns everything else into `-`, trims separators.
fn sanitize(raw: &str) -> String {
    let mapped: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    mapped.trim_matches(|c| c == '-' || c == '_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()
    }

    #[test]
    fn test_single_table_uses_table_name() {
        let stem = export_stem(None, &[ExportTable::Customers], &ExportFilters::default());
        assert_eq!(
            build_filename(&stem, day(), ExportFormat::Csv, false),
            "customers_2026-03-09.csv"
        );
    }

    #[test]
    fn test_multi_table_uses_generic_name_and_gz_suffix() {
        let stem = export_stem(
            None,
            &[ExportTable::Customers, ExportTable::Orders],
            &ExportFilters::default(),
        );
        assert_eq!(
            build_filename(&stem, day(), ExportFormat::Json, true),
            "planningsol_export_2026-03-09.json.gz"
        );
    }

    #[test]
    fn test_filters_are_appended() {
        let filters = ExportFilters {
            location: Some("sol_emmen".into()),
            year: Some(2024),
            ..Default::default()
        };
        let stem = export_stem(Some("gascilinder-orders"), &[ExportTable::GasCylinderOrders], &filters);
        assert_eq!(stem, "gascilinder-orders_2024_sol_emmen");
    }

    #[test]
    fn test_purpose_is_sanitized() {
        let stem = export_stem(
            Some("../../etc/passwd"),
            &[ExportTable::Customers],
            &ExportFilters::default(),
        );
        assert!(!stem.contains('/'));
        assert!(!stem.contains('.'));

        let blank = export_stem(Some("  "), &[ExportTable::Customers], &ExportFilters::default());
        assert_eq!(blank, "customers");
    }
}
