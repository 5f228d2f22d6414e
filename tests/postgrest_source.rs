//! Tests for the PostgREST row source against a local stub server.
//!
//! The stub truncates every response to a fixed row cap the way PostgREST's
//! `db-max-rows` setting does, without signalling the truncation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use planning_export::error_handling::{ExportError, SourceError};
use planning_export::export::{
    AllowList, BulkExporter, ExportFormat, ExportRequest, ExportSettings, ExportTable,
    TableSelection,
};
use planning_export::source::PostgrestRowSource;

#[path = "helpers.rs"]
mod helpers;

use helpers::{export_date, strip_bom};

const SERVICE_KEY: &str = "service-key";

#[derive(Clone)]
struct Stub {
    tables: Arc<HashMap<String, Vec<Value>>>,
    max_rows: usize,
    /// `(table, offset, limit)` of every request
    requests: Arc<Mutex<Vec<(String, usize, usize)>>>,
}

impl Stub {
    fn new(max_rows: usize) -> Self {
        Self {
            tables: Arc::new(HashMap::new()),
            max_rows,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn with_table(mut self, table: &str, rows: Vec<Value>) -> Self {
        Arc::make_mut(&mut self.tables).insert(table.to_string(), rows);
        self
    }

    fn requests(&self) -> Vec<(String, usize, usize)> {
        self.requests.lock().unwrap().clone()
    }
}

async fn table_handler(
    State(stub): State<Stub>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some(SERVICE_KEY) {
        return (StatusCode::UNAUTHORIZED, "missing apikey").into_response();
    }
    if table == "orders" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "relation is locked").into_response();
    }
    let offset = params
        .get("offset")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0usize);
    let limit = params
        .get("limit")
        .and_then(|v| v.parse().ok())
        .unwrap_or(usize::MAX);
    stub.requests
        .lock()
        .unwrap()
        .push((table.clone(), offset, limit));

    let rows: Vec<Value> = stub
        .tables
        .get(&table)
        .map(|rows| {
            rows.iter()
                .skip(offset)
                .take(limit.min(stub.max_rows))
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    Json(rows).into_response()
}

/// Serves `stub` on an ephemeral port and returns its base URL.
async fn serve(stub: Stub) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new()
        .route("/rest/v1/{table}", get(table_handler))
        .with_state(stub);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn customers(count: usize) -> Vec<Value> {
    (1..=count)
        .map(|id| json!({"id": id, "name": format!("Klant {id}"), "is_active": true}))
        .collect()
}

fn exporter(source: PostgrestRowSource, settings: ExportSettings) -> BulkExporter {
    BulkExporter::new(Arc::new(source), AllowList::all(), settings)
}

fn source(base_url: &str) -> PostgrestRowSource {
    PostgrestRowSource::new(base_url, SERVICE_KEY, Duration::from_secs(5)).unwrap()
}

fn request(table: &str, format: ExportFormat) -> ExportRequest {
    ExportRequest::new(TableSelection::from_names(&[table]).unwrap(), format)
}

#[tokio::test]
async fn test_capped_responses_do_not_truncate_csv_export() {
    let stub = Stub::new(1_000).with_table("customers", customers(2_500));
    let base_url = serve(stub.clone()).await;
    let exporter = exporter(source(&base_url), ExportSettings::default());

    let result = exporter
        .export_on(
            &request("customers", ExportFormat::Csv),
            export_date(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.total_rows, 2_500);
    let text = std::str::from_utf8(strip_bom(&result.content)).unwrap();
    assert_eq!(text.lines().count(), 2_501);
    assert!(text.lines().last().unwrap().starts_with("2500;Klant 2500;"));

    // The column lookup first, then pages no larger than the cap
    let pages: Vec<(usize, usize)> = stub
        .requests()
        .into_iter()
        .skip(1)
        .map(|(_, offset, limit)| (offset, limit))
        .collect();
    assert_eq!(pages, vec![(0, 1_000), (1_000, 1_000), (2_000, 1_000)]);
}

#[tokio::test]
async fn test_configured_row_cap_below_server_default() {
    let stub = Stub::new(400).with_table("customers", customers(900));
    let base_url = serve(stub.clone()).await;
    let exporter = exporter(
        source(&base_url).with_max_rows(400),
        ExportSettings::default(),
    );

    let result = exporter
        .export_on(
            &request("customers", ExportFormat::Json),
            export_date(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.total_rows, 900);
    let parsed: Value = serde_json::from_slice(&result.content).unwrap();
    assert_eq!(parsed["customers"].as_array().unwrap().len(), 900);
    assert_eq!(parsed["customers"][899]["id"], 900);
}

#[tokio::test]
async fn test_exact_multiple_of_cap_ends_on_empty_page() {
    let stub = Stub::new(1_000).with_table("customers", customers(2_000));
    let base_url = serve(stub.clone()).await;
    let exporter = exporter(source(&base_url), ExportSettings::default());

    let result = exporter
        .export_on(
            &request("customers", ExportFormat::Json),
            export_date(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.total_rows, 2_000);
    let offsets: Vec<usize> = stub
        .requests()
        .into_iter()
        .skip(1)
        .map(|(_, offset, _)| offset)
        .collect();
    assert_eq!(offsets, vec![0, 1_000, 2_000]);
}

#[tokio::test]
async fn test_error_status_keeps_response_body() {
    let base_url = serve(Stub::new(1_000)).await;
    let exporter = exporter(source(&base_url), ExportSettings::default());

    let err = exporter
        .export_on(
            &request("orders", ExportFormat::Json),
            export_date(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match err {
        ExportError::FetchFailed {
            table,
            offset,
            source: SourceError::UnexpectedStatus { status, body },
        } => {
            assert_eq!(table, ExportTable::Orders);
            assert_eq!(offset, 0);
            assert_eq!(status, 500);
            assert_eq!(body, "relation is locked");
        }
        other => panic!("expected FetchFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_wrong_key_is_reported_as_status() {
    let base_url = serve(Stub::new(1_000).with_table("customers", customers(1))).await;
    let source = PostgrestRowSource::new(&base_url, "wrong-key", Duration::from_secs(5)).unwrap();
    let exporter = exporter(source, ExportSettings::default());

    let err = exporter
        .export_on(
            &request("customers", ExportFormat::Json),
            export_date(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ExportError::FetchFailed {
            source: SourceError::UnexpectedStatus { status: 401, .. },
            ..
        }
    ));
}
