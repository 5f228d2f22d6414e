//! Row sources: the backends the exporter pages through.
//!
//! The exporter never talks to a database directly. It is handed an
//! `Arc<dyn RowSource>` and asks it for column lists and pages of rows.
//! Two backends are provided:
//!
//! - [`SqliteRowSource`]: a local SQLite copy of the PlanningSOL schema (sqlx)
//! - [`PostgrestRowSource`]: the hosted PostgREST API (reqwest)

mod postgrest;
mod sqlite;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error_handling::SourceError;
use crate::export::{ExportFilters, ExportTable};

pub use postgrest::PostgrestRowSource;
pub use sqlite::SqliteRowSource;

/// One row: column name to scalar value, in column order.
pub type Row = Map<String, Value>;

/// A page of rows as returned by one fetch.
#[derive(Debug, Clone)]
pub struct RowBatch {
    pub table: ExportTable,
    pub offset: u64,
    pub rows: Vec<Row>,
}

impl RowBatch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parameters of a single page fetch.
#[derive(Debug, Clone, Copy)]
pub struct PageQuery<'a> {
    pub table: ExportTable,
    pub offset: u64,
    pub limit: u64,
    pub filters: &'a ExportFilters,
}

/// A backend that can list a table's columns and return pages of its rows.
///
/// Pages must come back in a stable order (see [`ExportTable::order_columns`])
/// so that consecutive offsets never overlap or skip rows.
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Column names of `table`, in schema order. May be empty if the backend
    /// cannot describe the table.
    async fn columns(&self, table: ExportTable) -> Result<Vec<String>, SourceError>;

    /// Fetches at most `query.limit` rows starting at `query.offset`.
    async fn fetch_page(&self, query: &PageQuery<'_>) -> Result<RowBatch, SourceError>;

    /// Most rows one response can hold, if the backend caps responses.
    ///
    /// The exporter never asks for more, so a capped page is not mistaken for
    /// the end of a table.
    fn max_page_size(&self) -> Option<u64> {
        None
    }

    /// Short backend name for logs.
    fn name(&self) -> &str;
}
