//! PostgREST row source (the hosted Supabase API).
//!
//! Pages are plain `GET /rest/v1/<table>` requests using PostgREST's
//! `offset`/`limit` parameters with an explicit `order`, so results are stable
//! across pages. The service key goes in both the `apikey` and the bearer
//! `Authorization` header, which is what the gateway expects.
//!
//! The server truncates every response to its `db-max-rows` setting without
//! signalling it. The source reports that cap through
//! [`RowSource::max_page_size`] so pages are never requested larger than the
//! server will return.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::ACCEPT;
use reqwest::{Client, ClientBuilder, Request};
use serde_json::Value;
use url::Url;

use crate::config::POSTGREST_MAX_ROWS;
use crate::error_handling::{InitializationError, SourceError};
use crate::export::{ExportFilters, ExportTable};

use super::{PageQuery, Row, RowBatch, RowSource};

/// Longest error body kept from a failed response.
const MAX_ERROR_BODY: usize = 512;

pub struct PostgrestRowSource {
    client: Client,
    rest_base: Url,
    api_key: String,
    max_rows: u64,
}

impl PostgrestRowSource {
    /// Creates a source for the project at `base_url` (e.g. `https://xyz.supabase.co`).
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, InitializationError> {
        let invalid = |reason: &str| InitializationError::InvalidBackendUrl {
            url: base_url.to_string(),
            reason: reason.to_string(),
        };
        let mut base = Url::parse(base_url).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let rest_base = base
            .join("rest/v1/")
            .map_err(|e| invalid(&e.to_string()))?;

        let client = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("planning_export/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            rest_base,
            api_key: api_key.into(),
            max_rows: POSTGREST_MAX_ROWS,
        })
    }

    /// Sets the per-response row cap; must not exceed the server's `db-max-rows`.
    pub fn with_max_rows(mut self, max_rows: u64) -> Self {
        self.max_rows = max_rows.max(1);
        self
    }

    /// URL of one page of `table`.
    fn page_url(&self, table: ExportTable, offset: u64, limit: u64, filters: &ExportFilters) -> Url {
        let mut url = self.rest_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(table.as_str());
        }

        let order = table
            .order_columns()
            .iter()
            .map(|c| format!("{c}.asc"))
            .collect::<Vec<_>>()
            .join(",");
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", "*");
            if let Some(location) = filters.location_for(table) {
                pairs.append_pair("location", &format!("eq.{location}"));
            }
            if let Some((column, from, to)) = filters.date_range_for(table) {
                if let Some(from) = from {
                    pairs.append_pair(column, &format!("gte.{}", from.format("%Y-%m-%d")));
                }
                if let Some(to) = to {
                    pairs.append_pair(column, &format!("lte.{}", to.format("%Y-%m-%d")));
                }
            }
            pairs.append_pair("order", &order);
            pairs.append_pair("offset", &offset.to_string());
            pairs.append_pair("limit", &limit.to_string());
        }
        url
    }

    fn build_request(&self, url: Url) -> Result<Request, reqwest::Error> {
        self.client
            .get(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "application/json")
            .build()
    }

    async fn fetch_rows(&self, url: Url) -> Result<Vec<Row>, SourceError> {
        let request = self.build_request(url)?;
        let response = self.client.execute(request).await?;
        let status = response.status();
        if !status.is_success() {
            let mut body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!("postgrest: could not read {} error body: {}", status, e);
                    String::new()
                }
            };
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(SourceError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }
        let items: Vec<Value> = response.json().await?;
        decode_rows(items)
    }
}

/// PostgREST answers with a JSON array of objects; anything else is a decode error.
fn decode_rows(items: Vec<Value>) -> Result<Vec<Row>, SourceError> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(row) => Ok(row),
            other => Err(SourceError::Decode(format!(
                "item {i} is not an object: {}",
                type_name(&other)
            ))),
        })
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl RowSource for PostgrestRowSource {
    async fn columns(&self, table: ExportTable) -> Result<Vec<String>, SourceError> {
        // PostgREST has no cheap column listing; the first row's keys are it.
        let url = self.page_url(table, 0, 1, &ExportFilters::default());
        let rows = self.fetch_rows(url).await?;
        let columns = match rows.first() {
            Some(row) => row.keys().cloned().collect(),
            None => table
                .known_columns()
                .iter()
                .map(|c| c.to_string())
                .collect(),
        };
        Ok(columns)
    }

    async fn fetch_page(&self, query: &PageQuery<'_>) -> Result<RowBatch, SourceError> {
        let url = self.page_url(query.table, query.offset, query.limit, query.filters);
        debug!("postgrest: GET {}", url.path());
        let rows = self.fetch_rows(url).await?;
        Ok(RowBatch {
            table: query.table,
            offset: query.offset,
            rows,
        })
    }

    fn max_page_size(&self) -> Option<u64> {
        Some(self.max_rows)
    }

    fn name(&self) -> &str {
        "postgrest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn source(base: &str) -> PostgrestRowSource {
        PostgrestRowSource::new(base, "service-key", Duration::from_secs(5)).unwrap()
    }

    fn pairs(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_page_url_for_plain_table() {
        let source = source("https://project.supabase.co");
        let url = source.page_url(ExportTable::Customers, 2000, 1000, &ExportFilters::default());
        assert_eq!(url.path(), "/rest/v1/customers");
        assert_eq!(
            pairs(&url),
            vec![
                ("select".to_string(), "*".to_string()),
                ("order".to_string(), "id.asc".to_string()),
                ("offset".to_string(), "2000".to_string()),
                ("limit".to_string(), "1000".to_string()),
            ]
        );
    }

    #[test]
    fn test_page_url_with_filters() {
        let source = source("https://project.supabase.co/");
        let filters = ExportFilters {
            location: Some("sol_tilburg".into()),
            date_from: NaiveDate::from_ymd_opt(2025, 2, 1),
            ..Default::default()
        };
        let url = source.page_url(ExportTable::GasCylinderOrders, 0, 10, &filters);
        let pairs = pairs(&url);
        assert!(pairs.contains(&("location".into(), "eq.sol_tilburg".into())));
        assert!(pairs.contains(&("scheduled_date".into(), "gte.2025-02-01".into())));
        assert!(pairs.contains(&("order".into(), "scheduled_date.asc,id.asc".into())));
        assert!(!pairs.iter().any(|(_, v)| v.starts_with("lte.")));
    }

    #[test]
    fn test_base_path_prefix_is_kept() {
        let source = source("http://localhost:54321/proxy");
        let url = source.page_url(ExportTable::Orders, 0, 1, &ExportFilters::default());
        assert_eq!(url.path(), "/proxy/rest/v1/orders");
    }

    #[test]
    fn test_request_carries_key_headers() {
        let source = source("https://project.supabase.co");
        let url = source.page_url(ExportTable::Customers, 0, 1, &ExportFilters::default());
        let request = source.build_request(url).unwrap();
        assert_eq!(request.method(), &reqwest::Method::GET);
        assert_eq!(request.headers()["apikey"], "service-key");
        assert_eq!(request.headers()["authorization"], "Bearer service-key");
    }

    #[test]
    fn test_row_cap_defaults_to_server_default() {
        let source = source("https://project.supabase.co");
        assert_eq!(source.max_page_size(), Some(1_000));
        assert_eq!(source.with_max_rows(250).max_page_size(), Some(250));
        let clamped = PostgrestRowSource::new("https://project.supabase.co", "k", Duration::from_secs(1))
            .unwrap()
            .with_max_rows(0);
        assert_eq!(clamped.max_page_size(), Some(1));
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(matches!(
            PostgrestRowSource::new("ftp://example.com", "k", Duration::from_secs(1)),
            Err(InitializationError::InvalidBackendUrl { .. })
        ));
        assert!(PostgrestRowSource::new("not a url", "k", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_decode_rows_rejects_non_objects() {
        let rows = decode_rows(vec![json!({"id": 1})]).unwrap();
        assert_eq!(rows[0]["id"], 1);
        match decode_rows(vec![json!({"id": 1}), json!(2)]) {
            Err(SourceError::Decode(message)) => assert!(message.contains("item 1")),
            other => panic!("expected Decode, got {:?}", other),
        }
    }
}
