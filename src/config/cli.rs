//! Command-line interface.
//!
//! Global flags describe the deployment (backend, allow-list, gzip); the
//! subcommands describe one export or the long-running service. Every global
//! flag also reads a `PLANNING_EXPORT_*` environment variable so a `.env` file
//! can carry the backend credentials.
//!
//! ```bash
//! # One table to a CSV file in the current directory
//! planning_export --db-path ./backup.db export --tables gas_cylinder_orders --year 2024
//!
//! # Full JSON backup from the hosted API, gzipped, to stdout
//! planning_export --postgrest-url https://xyz.supabase.co --postgrest-key $KEY \
//!     export --format json --compress --output -
//!
//! # Export service
//! planning_export serve --port 8787 --admin-token "$ADMIN_TOKEN"
//! ```

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::config::constants::{
    DB_MAX_CONNECTIONS, DB_PATH, DEFAULT_BIND_ADDRESS, DEFAULT_GZIP_LEVEL, DEFAULT_SERVER_PORT,
    POSTGREST_MAX_ROWS, POSTGREST_TIMEOUT_SECS,
};
use crate::config::types::{
    BackendConfig, Config, ConfigValidationError, LogFormat, LogLevel, ServeConfig,
};
use crate::error_handling::ExportError;
use crate::export::{
    AllowList, CsvDelimiter, ExportFilters, ExportFormat, ExportRequest, GzipSupport,
    TableSelection,
};

#[derive(Debug, Parser)]
#[command(
    name = "planning_export",
    version,
    about = "Exports PlanningSOL tables to CSV, JSON or a MySQL dump."
)]
pub struct Cli {
    /// Log level: error|warn|info|debug|trace
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// SQLite file to export from (ignored when --postgrest-url is set)
    #[arg(long, global = true, env = "PLANNING_EXPORT_DB_PATH", default_value = DB_PATH)]
    pub db_path: PathBuf,

    /// SQLite pool size
    #[arg(long, global = true, default_value_t = DB_MAX_CONNECTIONS)]
    pub db_max_connections: u32,

    /// Base URL of the hosted PostgREST API (e.g. https://xyz.supabase.co)
    #[arg(long, global = true, env = "PLANNING_EXPORT_POSTGREST_URL")]
    pub postgrest_url: Option<String>,

    /// Service key for the PostgREST API
    #[arg(
        long,
        global = true,
        env = "PLANNING_EXPORT_POSTGREST_KEY",
        hide_env_values = true
    )]
    pub postgrest_key: Option<String>,

    /// PostgREST per-request timeout in seconds
    #[arg(long, global = true, default_value_t = POSTGREST_TIMEOUT_SECS)]
    pub postgrest_timeout_secs: u64,

    /// Rows the PostgREST server returns per response at most (its db-max-rows)
    #[arg(
        long,
        global = true,
        env = "PLANNING_EXPORT_POSTGREST_MAX_ROWS",
        default_value_t = POSTGREST_MAX_ROWS
    )]
    pub postgrest_max_rows: u64,

    /// Tables that may be exported (comma-separated; default: all)
    #[arg(
        long,
        global = true,
        env = "PLANNING_EXPORT_ALLOWED_TABLES",
        value_delimiter = ','
    )]
    pub allowed_tables: Vec<String>,

    /// Disable gzip; compressed requests then return uncompressed output
    #[arg(long, global = true, env = "PLANNING_EXPORT_DISABLE_GZIP")]
    pub no_gzip: bool,

    /// gzip level (0-9)
    #[arg(long, global = true, default_value_t = DEFAULT_GZIP_LEVEL)]
    pub gzip_level: u32,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Export tables to a file or stdout
    Export(ExportArgs),
    /// Run the authenticated export service
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Tables to export (comma-separated; default: every allowed table)
    #[arg(long, value_delimiter = ',')]
    pub tables: Vec<String>,

    /// Output format (default: csv for one table, json otherwise)
    #[arg(long, value_enum)]
    pub format: Option<ExportFormat>,

    /// gzip the artifact
    #[arg(long)]
    pub compress: bool,

    /// CSV field delimiter
    #[arg(long, value_enum)]
    pub delimiter: Option<CsvDelimiter>,

    /// Translate codes to display labels (default for CSV)
    #[arg(long, conflicts_with = "no_labels")]
    pub labels: bool,

    /// Keep raw codes (default for JSON and SQL)
    #[arg(long)]
    pub no_labels: bool,

    /// Only rows for this production location (e.g. sol_emmen)
    #[arg(long)]
    pub location: Option<String>,

    /// Only rows dated in this calendar year
    #[arg(long)]
    pub year: Option<i32>,

    /// Only rows dated on or after this day (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Only rows dated on or before this day (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Filename stem (default: the table name, or planningsol_export)
    #[arg(long)]
    pub purpose: Option<String>,

    /// Output directory, file path, or `-` for stdout
    #[arg(long, short, default_value = ".")]
    pub output: PathBuf,

    /// Rows per page (overrides the per-format default)
    #[arg(long)]
    pub page_size: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, default_value = DEFAULT_BIND_ADDRESS)]
    pub bind: String,

    /// Port to listen on
    #[arg(long, default_value_t = DEFAULT_SERVER_PORT)]
    pub port: u16,

    /// Admin bearer token (repeat or comma-separate for several)
    #[arg(
        long = "admin-token",
        env = "PLANNING_EXPORT_ADMIN_TOKENS",
        value_delimiter = ',',
        hide_env_values = true
    )]
    pub admin_tokens: Vec<String>,
}

impl Cli {
    /// Library configuration from the global flags.
    ///
    /// A page size given to `export` replaces both per-format defaults.
    pub fn config(&self) -> Result<Config, ConfigValidationError> {
        let backend = match &self.postgrest_url {
            Some(url) => BackendConfig::Postgrest {
                url: url.clone(),
                api_key: self.postgrest_key.clone().unwrap_or_default(),
            },
            None => BackendConfig::Sqlite {
                db_path: self.db_path.clone(),
            },
        };
        let allowed_tables =
            AllowList::from_names(&self.allowed_tables).map_err(|e| ConfigValidationError {
                field: "allowed-tables",
                message: e.to_string(),
            })?;
        let gzip = if self.no_gzip {
            GzipSupport::Unavailable
        } else {
            GzipSupport::Available {
                level: self.gzip_level,
            }
        };

        let mut config = Config {
            log_level: self.log_level.clone(),
            log_format: self.log_format.clone(),
            backend,
            allowed_tables,
            gzip,
            db_max_connections: self.db_max_connections,
            postgrest_timeout_secs: self.postgrest_timeout_secs,
            postgrest_max_rows: self.postgrest_max_rows,
            ..Default::default()
        };
        if let Command::Export(args) = &self.command {
            if let Some(size) = args.page_size {
                config.csv_page_size = size;
                config.json_page_size = size;
            }
        }
        config.validate()?;
        Ok(config)
    }
}

impl ExportArgs {
    /// The export request these flags describe.
    pub fn to_request(&self) -> Result<ExportRequest, ExportError> {
        let tables = TableSelection::from_names(&self.tables)?;
        let filters = ExportFilters {
            location: self.location.clone(),
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
        if let Some(delimiter) = self.delimiter {
            request = request.with_delimiter(delimiter);
        }
        if self.labels {
            request = request.with_labels(true);
        } else if self.no_labels {
            request = request.with_labels(false);
        }
        if let Some(purpose) = &self.purpose {
            request = request.with_purpose(purpose.clone());
        }
        Ok(request)
    }

    /// Whether the artifact goes to stdout.
    pub fn to_stdout(&self) -> bool {
        self.output.as_os_str() == "-"
    }
}

impl ServeArgs {
    pub fn serve_config(&self) -> Result<ServeConfig, ConfigValidationError> {
        let config = ServeConfig {
            bind: self.bind.clone(),
            port: self.port,
            admin_tokens: self
                .admin_tokens
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        };
        config.validate()?;
        Ok(config)
    }
}
