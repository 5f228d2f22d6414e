//! Configuration constants.
//!
//! Defaults for every tunable, plus the fixed byte sequences the output
//! formats rely on.

/// SQLite file exported from when no backend is configured.
pub const DB_PATH: &str = "./planningsol.db";
/// Connections in the read-only SQLite pool
pub const DB_MAX_CONNECTIONS: u32 = 5;

// Pagination
/// Rows per page for CSV exports (the spreadsheet reports page in large batches)
pub const CSV_PAGE_SIZE: u64 = 10_000;
/// Rows per page for JSON and SQL exports
pub const JSON_PAGE_SIZE: u64 = 1_000;
/// Upper bound accepted for either page size.
pub const MAX_PAGE_SIZE: u64 = 50_000;

// Output formats
/// Rows per `INSERT` statement in SQL dumps
pub const SQL_INSERT_BATCH_ROWS: usize = 100;
/// UTF-8 byte order mark written at the start of CSV artifacts
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
/// Filename stem of exports spanning several tables
pub const DEFAULT_EXPORT_PURPOSE: &str = "planningsol_export";

/// gzip level used when compression is requested
pub const DEFAULT_GZIP_LEVEL: u32 = 6;

// PostgREST backend
/// Per-request timeout in seconds
pub const POSTGREST_TIMEOUT_SECS: u64 = 30;
/// Most rows PostgREST returns per response (Supabase's default `db-max-rows`)
pub const POSTGREST_MAX_ROWS: u64 = 1_000;

// Export service
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_SERVER_PORT: u16 = 8787;
/// Largest accepted `POST /export` body. Requests are small JSON objects.
pub const MAX_REQUEST_BODY_BYTES: usize = 16 * 1024;
