//! Error type definitions.
//!
//! This module defines the error types used throughout the exporter, plus the
//! outcome categories tracked by the export service.

use log::SetLoggerError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

use crate::export::ExportTable;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error building the HTTP client for a remote row source.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    /// The SQLite backend could not be opened.
    #[error("Database initialization error: {0}")]
    DatabaseError(#[from] DatabaseError),

    /// The PostgREST base URL could not be parsed.
    #[error("Invalid PostgREST URL '{url}': {reason}")]
    InvalidBackendUrl {
        /// URL as configured
        url: String,
        /// Parser message
        reason: String,
    },
}

/// Error types for database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The SQLite file to export from does not exist.
    #[error("Database file not found: {0}")]
    MissingDatabase(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// Applying the schema migrations failed.
    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}

/// Errors raised by a row source while reading a page or a column list.
#[derive(Error, Debug)]
pub enum SourceError {
    /// SQLite query failed.
    #[error("database query failed: {0}")]
    Database(#[from] sqlx::Error),

    /// Transport-level HTTP failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned HTTP {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body (truncated)
        body: String,
    },

    /// The backend answered with a payload we could not turn into rows.
    #[error("could not decode backend response: {0}")]
    Decode(String),
}

/// Errors produced by an export request.
///
/// `InvalidTable` and `MultiTableCsv` are caller errors and are always raised
/// before the row source is touched. `FetchFailed` aborts the whole export.
#[derive(Error, Debug)]
pub enum ExportError {
    /// A requested table is unknown or not on the allow-list.
    #[error("table '{0}' is not available for export")]
    InvalidTable(String),

    /// CSV output carries a single header line, so it holds exactly one table.
    #[error("CSV export takes exactly one table, {0} were requested")]
    MultiTableCsv(usize),

    /// The row source failed mid-pagination.
    #[error("fetching {table} at offset {offset} failed: {source}")]
    FetchFailed {
        /// Table being read
        table: ExportTable,
        /// Offset of the failed page
        offset: u64,
        /// Underlying backend error
        #[source]
        source: SourceError,
    },

    /// The export was cancelled before it finished.
    #[error("export cancelled")]
    Cancelled,

    /// CSV serialization failed.
    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failed.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing to the output sink failed.
    #[error("writing export output failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// True for errors caused by the request itself rather than the backend.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            ExportError::InvalidTable(_) | ExportError::MultiTableCsv(_)
        )
    }
}

/// Outcome categories counted by the export service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ExportOutcome {
    /// Artifact delivered
    Completed,
    /// Invalid table or request shape
    InvalidRequest,
    /// Missing or malformed credentials
    Unauthorized,
    /// Valid credentials without the admin capability
    Forbidden,
    /// Backend failure mid-export
    FetchFailed,
    /// Export cancelled (shutdown)
    Cancelled,
    /// Serialization or sink failure
    InternalError,
}

impl std::fmt::Display for ExportOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ExportOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportOutcome::Completed => "completed",
            ExportOutcome::InvalidRequest => "invalid_request",
            ExportOutcome::Unauthorized => "unauthorized",
            ExportOutcome::Forbidden => "forbidden",
            ExportOutcome::FetchFailed => "fetch_failed",
            ExportOutcome::Cancelled => "cancelled",
            ExportOutcome::InternalError => "internal_error",
        }
    }
}

impl From<&ExportError> for ExportOutcome {
    fn from(err: &ExportError) -> Self {
        match err {
            ExportError::InvalidTable(_) | ExportError::MultiTableCsv(_) => {
                ExportOutcome::InvalidRequest
            }
            ExportError::FetchFailed { .. } => ExportOutcome::FetchFailed,
            ExportError::Cancelled => ExportOutcome::Cancelled,
            ExportError::Csv(_) | ExportError::Json(_) | ExportError::Io(_) => {
                ExportOutcome::InternalError
            }
        }
    }
}
