//! Database connection pool management.
//!
//! Exports only read, so the pool opens an existing SQLite file in read-only
//! mode. A missing file is an error rather than a silently created empty
//! database, which would export as a valid but empty artifact.

use std::path::Path;
use std::sync::Arc;

use log::{error, info};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error_handling::DatabaseError;

/// Shared handle to the SQLite pool.
pub type DbPool = Arc<SqlitePool>;

/// Opens a read-only pool over an existing SQLite file.
///
/// # Errors
///
/// Returns `DatabaseError::MissingDatabase` if `db_path` does not exist and
/// `DatabaseError::SqlError` if SQLite refuses to open it.
pub async fn open_db_pool(db_path: &Path, max_connections: u32) -> Result<DbPool, DatabaseError> {
    if !db_path.is_file() {
        error!("Database file not found: {}", db_path.display());
        return Err(DatabaseError::MissingDatabase(
            db_path.display().to_string(),
        ));
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .read_only(true)
        .create_if_missing(false);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await
        .map_err(|e| {
            error!("Failed to open database {}: {e}", db_path.display());
            DatabaseError::SqlError(e)
        })?;

    info!(
        "Opened {} read-only ({} connections max)",
        db_path.display(),
        max_connections.max(1)
    );
    Ok(Arc::new(pool))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::run_migrations;

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.db");
        match open_db_pool(&path, 1).await {
            Err(DatabaseError::MissingDatabase(p)) => assert!(p.ends_with("nope.db")),
            other => panic!("expected MissingDatabase, got {:?}", other.map(|_| ())),
        }
        assert!(!path.exists(), "opening must not create the file");
    }

    #[tokio::test]
    async fn test_pool_is_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("planningsol.db");
        {
            let options = SqliteConnectOptions::new()
                .filename(&path)
                .create_if_missing(true);
            let writable = SqlitePool::connect_with(options).await.unwrap();
            run_migrations(&writable).await.unwrap();
            writable.close().await;
        }

        let pool = open_db_pool(&path, 2).await.unwrap();
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM customers")
            .fetch_one(pool.as_ref())
            .await
            .unwrap();
        assert_eq!(count.0, 0);

        let write = sqlx::query("INSERT INTO customers (name) VALUES ('x')")
            .execute(pool.as_ref())
            .await;
        assert!(write.is_err());
    }
}
