//! SQLite row source.
//!
//! Reads a local copy of the PlanningSOL schema. Values are converted by
//! SQLite storage class, except that columns declared `BOOLEAN` come back as
//! JSON booleans (SQLite stores them as 0/1).

use async_trait::async_trait;
use log::debug;
use serde_json::{Number, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, QueryBuilder, Row as _, Sqlite, TypeInfo, ValueRef};

use crate::error_handling::SourceError;
use crate::export::ExportTable;
use crate::storage::DbPool;

use super::{PageQuery, Row, RowBatch, RowSource};

pub struct SqliteRowSource {
    pool: DbPool,
}

impl SqliteRowSource {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Builds the page query. Table and column names come from [`ExportTable`],
/// never from the caller; filter values are bound.
fn build_page_query<'a>(query: &PageQuery<'_>) -> QueryBuilder<'a, Sqlite> {
    let table = query.table;
    let mut builder = QueryBuilder::new(format!("SELECT * FROM \"{}\"", table.as_str()));

    let mut joiner = " WHERE ";
    if let Some(location) = query.filters.location_for(table) {
        builder.push(joiner);
        builder.push("location = ");
        builder.push_bind(location.to_string());
        joiner = " AND ";
    }
    if let Some((column, from, to)) = query.filters.date_range_for(table) {
        if let Some(from) = from {
            builder.push(joiner);
            builder.push(format!("date({column}) >= "));
            builder.push_bind(from.format("%Y-%m-%d").to_string());
            joiner = " AND ";
        }
        if let Some(to) = to {
            builder.push(joiner);
            builder.push(format!("date({column}) <= "));
            builder.push_bind(to.format("%Y-%m-%d").to_string());
        }
    }

    builder.push(" ORDER BY ");
    builder.push(table.order_columns().join(", "));
    builder.push(" LIMIT ");
    builder.push_bind(query.limit as i64);
    builder.push(" OFFSET ");
    builder.push_bind(query.offset as i64);
    builder
}

fn row_to_json(row: &SqliteRow) -> Result<Row, SourceError> {
    let mut out = Row::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let raw = row.try_get_raw(idx)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let storage = raw.type_info().name().to_string();
            let declared_bool = column.type_info().name().eq_ignore_ascii_case("BOOLEAN");
            match storage.as_str() {
                "INTEGER" | "BOOLEAN" | "INT8" if declared_bool => {
                    Value::Bool(row.try_get_unchecked::<i64, _>(idx)? != 0)
                }
                "INTEGER" | "INT8" => Value::from(row.try_get_unchecked::<i64, _>(idx)?),
                "BOOLEAN" => Value::Bool(row.try_get_unchecked::<bool, _>(idx)?),
                "REAL" => {
                    let f = row.try_get_unchecked::<f64, _>(idx)?;
                    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
                }
                "BLOB" => Value::String(hex(&row.try_get_unchecked::<Vec<u8>, _>(idx)?)),
                _ => Value::String(row.try_get_unchecked::<String, _>(idx)?),
            }
        };
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[async_trait]
impl RowSource for SqliteRowSource {
    async fn columns(&self, table: ExportTable) -> Result<Vec<String>, SourceError> {
        let names: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM pragma_table_info(?) ORDER BY cid")
                .bind(table.as_str())
                .fetch_all(self.pool.as_ref())
                .await?;
        Ok(names.into_iter().map(|(name,)| name).collect())
    }

    async fn fetch_page(&self, query: &PageQuery<'_>) -> Result<RowBatch, SourceError> {
        let mut builder = build_page_query(query);
        let rows = builder.build().fetch_all(self.pool.as_ref()).await?;
        debug!(
            "sqlite: {} rows from {} at offset {}",
            rows.len(),
            query.table,
            query.offset
        );
        let rows = rows
            .iter()
            .map(row_to_json)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RowBatch {
            table: query.table,
            offset: query.offset,
            rows,
        })
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}
