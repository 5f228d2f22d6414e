//! Shared state and wire types for the export service.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error_handling::{ExportError, ExportStats};
use crate::export::{
    BulkExporter, CsvDelimiter, ExportFilters, ExportFormat, ExportRequest, TableSelection,
};

/// Shared state for the export service handlers.
#[derive(Clone)]
pub struct ExportState {
    pub exporter: Arc<BulkExporter>,
    pub admin_tokens: Arc<Vec<String>>,
    pub stats: Arc<ExportStats>,
    pub start_time: Arc<Instant>,
    /// Cancelled on shutdown; every request runs under a child of it
    pub shutdown: CancellationToken,
}

impl ExportState {
    pub fn new(
        exporter: Arc<BulkExporter>,
        admin_tokens: Vec<String>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            exporter,
            admin_tokens: Arc::new(admin_tokens),
            stats: Arc::new(ExportStats::new()),
            start_time: Arc::new(Instant::now()),
            shutdown,
        }
    }
}

/// `POST /export` body. Every field is optional; an empty body is a JSON
/// backup of every allow-listed table.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportRequestBody {
    pub tables: Option<Vec<String>>,
    pub format: Option<ExportFormat>,
    #[serde(default)]
    pub compress: bool,
    pub delimiter: Option<CsvDelimiter>,
    pub labels: Option<bool>,
    pub location: Option<String>,
    pub year: Option<i32>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub purpose: Option<String>,
}

impl ExportRequestBody {
    /// Converts the body into a request. An explicit empty `tables` list is
    /// rejected; leaving `tables` out selects every allow-listed table.
    pub fn to_request(&self) -> Result<ExportRequest, ExportError> {
        let tables = match &self.tables {
            None => TableSelection::All,
            Some(names) if names.is_empty() => return Err(ExportError::InvalidTable(String::new())),
            Some(names) => TableSelection::from_names(names)?,
        };
        let filters = ExportFilters {
            location: self.location.clone().filter(|l| !l.trim().is_empty()),
            year: self.year,
            date_from: self.from,
            date_to: self.to,
        };
        let format = self
            .format
            .unwrap_or_else(|| ExportFormat::default_for(&tables));
        let mut request = ExportRequest::new(tables, format)
            .with_compression(self.compress)
            .with_filters(filters);
        request.delimiter = self.delimiter;
        request.labels = self.labels;
        request.purpose = self.purpose.clone();
        Ok(request)
    }
}

/// `GET /tables` response
#[derive(Debug, Serialize)]
pub struct TablesResponse {
    pub tables: Vec<&'static str>,
}

/// `GET /status` response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub source: String,
    pub exports_completed: usize,
    pub exports_failed: usize,
    pub rows_exported: u64,
    pub uptime_seconds: f64,
    /// Request count per outcome
    pub outcomes: BTreeMap<&'static str, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportTable;

    #[test]
    fn test_empty_body_selects_all_tables_as_json() {
        let request = ExportRequestBody::default().to_request().unwrap();
        assert_eq!(request.tables, TableSelection::All);
        assert_eq!(request.format, ExportFormat::Json);
        assert!(!request.compress);
        assert!(request.filters.is_empty());
    }

    #[test]
    fn test_body_fields_map_onto_request() {
        let body: ExportRequestBody = serde_json::from_str(
            r#"{
                "tables": ["gas_cylinder_orders"],
                "format": "csv",
                "compress": true,
                "delimiter": "comma",
                "labels": false,
                "location": "sol_emmen",
                "year": 2024,
                "purpose": "jaaroverzicht"
            }"#,
        )
        .unwrap();
        let request = body.to_request().unwrap();
        assert_eq!(
            request.tables,
            TableSelection::Only(vec![ExportTable::GasCylinderOrders])
        );
        assert!(request.compress);
        assert_eq!(request.delimiter, Some(CsvDelimiter::Comma));
        assert_eq!(request.labels, Some(false));
        assert_eq!(request.filters.location.as_deref(), Some("sol_emmen"));
        assert_eq!(request.filters.year, Some(2024));
        assert_eq!(request.purpose.as_deref(), Some("jaaroverzicht"));
    }

    #[test]
    fn test_single_table_defaults_to_csv() {
        let body: ExportRequestBody = serde_json::from_str(r#"{"tables": ["customers"]}"#).unwrap();
        assert_eq!(body.to_request().unwrap().format, ExportFormat::Csv);

        let body: ExportRequestBody =
            serde_json::from_str(r#"{"tables": ["customers", "orders"]}"#).unwrap();
        assert_eq!(body.to_request().unwrap().format, ExportFormat::Json);
    }

    #[test]
    fn test_explicit_empty_table_list_is_invalid() {
        let body = ExportRequestBody {
            tables: Some(Vec::new()),
            ..Default::default()
        };
        assert!(matches!(
            body.to_request(),
            Err(ExportError::InvalidTable(_))
        ));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let parsed = serde_json::from_str::<ExportRequestBody>(r#"{"table": "customers"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_dates_parse_from_iso_strings() {
        let body: ExportRequestBody =
            serde_json::from_str(r#"{"from": "2024-03-01", "to": "2024-03-31"}"#).unwrap();
        let request = body.to_request().unwrap();
        assert_eq!(request.filters.date_from, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(request.filters.date_to, NaiveDate::from_ymd_opt(2024, 3, 31));
    }
}
