// Shared test helpers: SQLite fixtures, an in-memory row source and artifact decoding.
//
// Included by the integration tests with `#[path = "helpers.rs"] mod helpers;`.
#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use flate2::read::GzDecoder;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use planning_export::error_handling::SourceError;
use planning_export::export::{AllowList, BulkExporter, ExportSettings, ExportTable};
use planning_export::source::{PageQuery, Row, RowBatch, RowSource, SqliteRowSource};
use planning_export::storage::{open_db_pool, run_migrations};

/// Date every test export is stamped with.
pub fn export_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 31).expect("valid date")
}

/// Creates a PlanningSOL database file with the schema applied and returns a
/// writable pool for seeding it.
pub async fn create_test_db(dir: &Path) -> (PathBuf, SqlitePool) {
    let db_path = dir.join("planningsol.db");
    let options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to create test database");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    (db_path, pool)
}

/// Exporter over the read-only SQLite backend at `db_path`.
pub async fn sqlite_exporter(db_path: &Path, settings: ExportSettings) -> BulkExporter {
    let pool = open_db_pool(db_path, 2)
        .await
        .expect("Failed to open export pool");
    BulkExporter::new(
        Arc::new(SqliteRowSource::new(pool)),
        AllowList::all(),
        settings,
    )
}

pub async fn insert_customer(pool: &SqlitePool, id: i64, name: &str, notes: Option<&str>) {
    sqlx::query(
        "INSERT INTO customers (id, name, contact_person, notes, is_active, created_at, updated_at)
         VALUES (?, ?, 'Jan de Vries', ?, 1, '2024-01-02 08:00:00', '2024-01-02 08:00:00')",
    )
    .bind(id)
    .bind(name)
    .bind(notes)
    .execute(pool)
    .await
    .expect("Failed to insert customer");
}

pub async fn insert_gas_cylinder_order(
    pool: &SqlitePool,
    id: i64,
    scheduled_date: &str,
    location: &str,
    status: &str,
) {
    sqlx::query(
        "INSERT INTO gas_cylinder_orders (
            id, order_number, customer_name, gas_type, gas_grade, cylinder_size,
            cylinder_count, scheduled_date, status, location, created_at, updated_at
        ) VALUES (?, ?, 'Air Liquide', 'co2', 'medical', '50L', 4, ?, ?, ?,
                  '2024-01-02 08:00:00', '2024-01-02 08:00:00')",
    )
    .bind(id)
    .bind(format!("GC-{id:04}"))
    .bind(scheduled_date)
    .bind(status)
    .bind(location)
    .execute(pool)
    .await
    .expect("Failed to insert gas cylinder order");
}

pub async fn insert_gas_type(pool: &SqlitePool, id: i64, name: &str) {
    sqlx::query(
        "INSERT INTO gas_types (id, name, created_at, updated_at)
         VALUES (?, ?, '2024-01-02 08:00:00', '2024-01-02 08:00:00')",
    )
    .bind(id)
    .bind(name)
    .execute(pool)
    .await
    .expect("Failed to insert gas type");
}

/// Points a cylinder order at a `gas_types` row.
pub async fn set_gas_type_id(pool: &SqlitePool, order_id: i64, gas_type_id: i64) {
    sqlx::query("UPDATE gas_cylinder_orders SET gas_type_id = ? WHERE id = ?")
        .bind(gas_type_id)
        .bind(order_id)
        .execute(pool)
        .await
        .expect("Failed to set gas type id");
}

/// Builds a row from a JSON object literal.
pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("test rows must be objects, got {other}"),
    }
}

/// `count` customer rows with ids starting at 1.
pub fn customer_rows(count: usize) -> Vec<Row> {
    (1..=count)
        .map(|id| {
            row(serde_json::json!({
                "id": id,
                "name": format!("Klant {id}"),
                "is_active": id % 2 == 1,
            }))
        })
        .collect()
}

/// In-memory row source recording every page request.
#[derive(Default)]
pub struct FakeSource {
    tables: HashMap<ExportTable, Vec<Row>>,
    fail_at: Option<(ExportTable, u64)>,
    fetches: AtomicUsize,
    pages: Mutex<Vec<(ExportTable, u64, u64)>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: ExportTable, rows: Vec<Row>) -> Self {
        self.tables.insert(table, rows);
        self
    }

    /// Fails the fetch of `table` at `offset`.
    pub fn failing_at(mut self, table: ExportTable, offset: u64) -> Self {
        self.fail_at = Some((table, offset));
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// `(table, offset, limit)` of every page requested, in order.
    pub fn pages(&self) -> Vec<(ExportTable, u64, u64)> {
        self.pages.lock().expect("pages lock").clone()
    }
}

#[async_trait]
impl RowSource for FakeSource {
    async fn columns(&self, table: ExportTable) -> Result<Vec<String>, SourceError> {
        Ok(self
            .tables
            .get(&table)
            .and_then(|rows| rows.first())
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_else(|| {
                table
                    .known_columns()
                    .iter()
                    .map(|c| c.to_string())
                    .collect()
            }))
    }

    async fn fetch_page(&self, query: &PageQuery<'_>) -> Result<RowBatch, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.pages
            .lock()
            .expect("pages lock")
            .push((query.table, query.offset, query.limit));
        if self.fail_at == Some((query.table, query.offset)) {
            return Err(SourceError::UnexpectedStatus {
                status: 503,
                body: "upstream unavailable".to_string(),
            });
        }
        let rows = self
            .tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .skip(query.offset as usize)
                    .take(query.limit as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(RowBatch {
            table: query.table,
            offset: query.offset,
            rows,
        })
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Settings with small pages so pagination is exercised.
pub fn small_pages(page_size: u64) -> ExportSettings {
    ExportSettings {
        csv_page_size: page_size,
        json_page_size: page_size,
        ..Default::default()
    }
}

pub fn gunzip(bytes: &[u8]) -> Vec<u8> {
    let mut decoded = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut decoded)
        .expect("artifact should be valid gzip");
    decoded
}

/// Strips the UTF-8 BOM, failing the test if it is missing.
pub fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes
        .strip_prefix(b"\xEF\xBB\xBF".as_slice())
        .expect("CSV artifact should start with a BOM")
}
