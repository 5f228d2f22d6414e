//! Row source initialization.

use std::sync::Arc;
use std::time::Duration;

use log::info;

use crate::config::{BackendConfig, Config};
use crate::error_handling::InitializationError;
use crate::source::{PostgrestRowSource, RowSource, SqliteRowSource};
use crate::storage::open_db_pool;

/// Builds the row source the configuration names.
///
/// # Errors
///
/// Returns `InitializationError::DatabaseError` if the SQLite file is missing
/// or cannot be opened, and `InvalidBackendUrl`/`HttpClientError` if the
/// PostgREST client cannot be built.
pub async fn init_row_source(config: &Config) -> Result<Arc<dyn RowSource>, InitializationError> {
    match &config.backend {
        BackendConfig::Sqlite { db_path } => {
            let pool = open_db_pool(db_path, config.db_max_connections).await?;
            info!("Exporting from SQLite database {}", db_path.display());
            Ok(Arc::new(SqliteRowSource::new(pool)))
        }
        BackendConfig::Postgrest { url, api_key } => {
            let source = PostgrestRowSource::new(
                url,
                api_key.clone(),
                Duration::from_secs(config.postgrest_timeout_secs),
            )?
            .with_max_rows(config.postgrest_max_rows);
            info!(
                "Exporting from PostgREST API at {url} (at most {} rows per response)",
                config.postgrest_max_rows
            );
            Ok(Arc::new(source))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_sqlite_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            backend: BackendConfig::Sqlite {
                db_path: dir.path().join("absent.db"),
            },
            ..Default::default()
        };
        match init_row_source(&config).await {
            Err(InitializationError::DatabaseError(e)) => {
                assert!(e.to_string().contains("absent.db"))
            }
            Err(other) => panic!("expected DatabaseError, got {other}"),
            Ok(_) => panic!("expected DatabaseError, got a source"),
        }
    }

    #[tokio::test]
    async fn test_postgrest_backend() {
        let config = Config {
            backend: BackendConfig::Postgrest {
                url: "https://project.supabase.co".into(),
                api_key: "key".into(),
            },
            ..Default::default()
        };
        let source = init_row_source(&config).await.unwrap();
        assert_eq!(source.name(), "postgrest");
        assert_eq!(source.max_page_size(), Some(1_000));

        let config = Config {
            backend: BackendConfig::Postgrest {
                url: "mailto:someone@example.com".into(),
                api_key: "key".into(),
            },
            ..Default::default()
        };
        assert!(matches!(
            init_row_source(&config).await,
            Err(InitializationError::InvalidBackendUrl { .. })
        ));
    }
}
