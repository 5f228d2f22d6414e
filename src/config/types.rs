//! Configuration types.
//!
//! This module defines the library-level configuration structs. They can be
//! built programmatically; the CLI in [`super::cli`] converts parsed flags into
//! them.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::ValueEnum;
use thiserror::Error;

use crate::config::constants::{
    CSV_PAGE_SIZE, DB_MAX_CONNECTIONS, DB_PATH, DEFAULT_BIND_ADDRESS, DEFAULT_SERVER_PORT,
    JSON_PAGE_SIZE, MAX_PAGE_SIZE, POSTGREST_MAX_ROWS, POSTGREST_TIMEOUT_SECS,
};
use crate::export::{AllowList, CsvDelimiter, ExportSettings, GzipSupport};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: One JSON object per line for log shippers
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Where rows are read from.
#[derive(Clone, PartialEq, Eq)]
pub enum BackendConfig {
    /// A local SQLite copy of the PlanningSOL schema
    Sqlite { db_path: PathBuf },
    /// The hosted PostgREST API
    Postgrest { url: String, api_key: String },
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendConfig::Sqlite { db_path } => f
                .debug_struct("Sqlite")
                .field("db_path", db_path)
                .finish(),
            // The key is a service credential; keep it out of logs.
            BackendConfig::Postgrest { url, .. } => f
                .debug_struct("Postgrest")
                .field("url", url)
                .field("api_key", &"<redacted>")
                .finish(),
        }
    }
}

/// A configuration value failed validation.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid {field}: {message}")]
pub struct ConfigValidationError {
    /// Name of the offending setting (as spelled on the command line)
    pub field: &'static str,
    pub message: String,
}

impl ConfigValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use planning_export::config::{BackendConfig, Config};
/// use std::path::PathBuf;
///
/// let config = Config {
///     backend: BackendConfig::Sqlite {
///         db_path: PathBuf::from("./backup.db"),
///     },
///     csv_page_size: 5_000,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,

    /// Row source
    pub backend: BackendConfig,

    /// Tables that may be exported
    pub allowed_tables: AllowList,

    /// Runtime gzip capability
    pub gzip: GzipSupport,

    /// Rows per page for CSV exports
    pub csv_page_size: u64,

    /// Rows per page for JSON and SQL exports
    pub json_page_size: u64,

    /// CSV delimiter when a request does not name one
    pub default_delimiter: CsvDelimiter,

    /// SQLite pool size
    pub db_max_connections: u32,

    /// PostgREST per-request timeout in seconds
    pub postgrest_timeout_secs: u64,

    /// Rows the PostgREST server returns per response at most (its `db-max-rows`)
    pub postgrest_max_rows: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            backend: BackendConfig::Sqlite {
                db_path: PathBuf::from(DB_PATH),
            },
            allowed_tables: AllowList::all(),
            gzip: GzipSupport::default(),
            csv_page_size: CSV_PAGE_SIZE,
            json_page_size: JSON_PAGE_SIZE,
            default_delimiter: CsvDelimiter::default(),
            db_max_connections: DB_MAX_CONNECTIONS,
            postgrest_timeout_secs: POSTGREST_TIMEOUT_SECS,
            postgrest_max_rows: POSTGREST_MAX_ROWS,
        }
    }
}

impl Config {
    /// Checks settings that clap cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        validate_page_size("csv-page-size", self.csv_page_size)?;
        validate_page_size("json-page-size", self.json_page_size)?;
        validate_page_size("postgrest-max-rows", self.postgrest_max_rows)?;

        if self.allowed_tables.is_empty() {
            return Err(ConfigValidationError::new(
                "allowed-tables",
                "at least one table must be exportable",
            ));
        }
        if let GzipSupport::Available { level } = self.gzip {
            if level > 9 {
                return Err(ConfigValidationError::new(
                    "gzip-level",
                    format!("must be between 0 and 9, got {level}"),
                ));
            }
        }
        if self.db_max_connections == 0 {
            return Err(ConfigValidationError::new(
                "db-max-connections",
                "must be at least 1",
            ));
        }

        match &self.backend {
            BackendConfig::Sqlite { db_path } if db_path.as_os_str().is_empty() => Err(
                ConfigValidationError::new("db-path", "must not be empty"),
            ),
            BackendConfig::Postgrest { url, .. } if url.trim().is_empty() => Err(
                ConfigValidationError::new("postgrest-url", "must not be empty"),
            ),
            BackendConfig::Postgrest { api_key, .. } if api_key.trim().is_empty() => Err(
                ConfigValidationError::new("postgrest-key", "required with --postgrest-url"),
            ),
            _ => Ok(()),
        }
    }

    /// Exporter settings derived from this configuration.
    pub fn export_settings(&self) -> ExportSettings {
        ExportSettings {
            csv_page_size: self.csv_page_size,
            json_page_size: self.json_page_size,
            default_delimiter: self.default_delimiter,
            gzip: self.gzip,
        }
    }
}

fn validate_page_size(field: &'static str, size: u64) -> Result<(), ConfigValidationError> {
    if size == 0 || size > MAX_PAGE_SIZE {
        return Err(ConfigValidationError::new(
            field,
            format!("must be between 1 and {MAX_PAGE_SIZE}, got {size}"),
        ));
    }
    Ok(())
}

/// Export service settings.
#[derive(Clone)]
pub struct ServeConfig {
    /// Address to bind
    pub bind: String,
    /// Port to listen on
    pub port: u16,
    /// Bearer tokens granted export access
    pub admin_tokens: Vec<String>,
}

impl std::fmt::Debug for ServeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServeConfig")
            .field("bind", &self.bind)
            .field("port", &self.port)
            .field("admin_tokens", &self.admin_tokens.len())
            .finish()
    }
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_SERVER_PORT,
            admin_tokens: Vec::new(),
        }
    }
}

impl ServeConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.bind.parse::<IpAddr>().is_err() {
            return Err(ConfigValidationError::new(
                "bind",
                format!("'{}' is not an IP address", self.bind),
            ));
        }
        if self.admin_tokens.is_empty() {
            return Err(ConfigValidationError::new(
                "admin-token",
                "at least one admin token is required to serve exports",
            ));
        }
        if self.admin_tokens.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigValidationError::new(
                "admin-token",
                "tokens must not be blank",
            ));
        }
        Ok(())
    }
}
