//! Logger initialization.
//!
//! This module configures `env_logger` with either a coloured human-readable
//! line format or one JSON object per line.

use std::io::Write;

use crate::config::LogFormat;
use crate::error_handling::InitializationError;
use colored::*;
use log::{LevelFilter, Record};

/// Initializes the logger with the specified level and format.
///
/// `RUST_LOG` is read first and `level` then overrides it for this crate, so
/// `RUST_LOG=sqlx=debug` still works for digging into a dependency while
/// `--log-level` controls the exporter's own output.
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if a logger is already installed.
///
/// # Examples
///
/// ```bash
/// # Quick debugging without CLI flags
/// RUST_LOG=debug planning_export export --tables customers
///
/// # Watch the SQL a page fetch runs
/// RUST_LOG=sqlx=debug planning_export --log-level debug export --tables orders
/// ```
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    let mut builder = env_logger::Builder::from_default_env();

    builder.filter_level(level);
    // Dependency chatter stays at info unless RUST_LOG asks otherwise
    builder.filter_module("sqlx", LevelFilter::Info.min(level));
    builder.filter_module("reqwest", LevelFilter::Info.min(level));
    builder.filter_module("hyper", LevelFilter::Warn);
    builder.filter_module("hyper_util", LevelFilter::Warn);
    builder.filter_module("planning_export", level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{}",
                    json_line(chrono::Utc::now().timestamp_millis(), record)
                )
            });
        }
        LogFormat::Plain => {
            colored::control::set_override(true);
            builder.format(|buf, record| {
                let level = record.level();
                let colored_level = match level {
                    log::Level::Error => level.to_string().red().bold(),
                    log::Level::Warn => level.to_string().yellow(),
                    log::Level::Info => level.to_string().green(),
                    log::Level::Debug => level.to_string().blue(),
                    log::Level::Trace => level.to_string().purple(),
                };
                writeln!(
                    buf,
                    "{} [{}] {} {}",
                    chrono::Local::now().format("%H:%M:%S%.3f").to_string().dimmed(),
                    colored_level,
                    record.target().cyan(),
                    record.args()
                )
            });
        }
    }

    builder.try_init().map_err(InitializationError::from)?;

    Ok(())
}

/// Renders a record as a single-line JSON object.
fn json_line(ts_millis: i64, record: &Record<'_>) -> String {
    serde_json::json!({
        "ts": ts_millis,
        "level": record.level().to_string(),
        "target": record.target(),
        "msg": record.args().to_string(),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_line_is_one_parseable_object() {
        let line = json_line(
            1_700_000_000_000,
            &Record::builder()
                .args(format_args!("exported {} rows\nfrom \"customers\"", 3))
                .level(log::Level::Warn)
                .target("planning_export::export")
                .build(),
        );
        assert!(!line.contains('\n'));

        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["ts"], 1_700_000_000_000i64);
        assert_eq!(parsed["level"], "WARN");
        assert_eq!(parsed["target"], "planning_export::export");
        assert_eq!(parsed["msg"], "exported 3 rows\nfrom \"customers\"");
    }

    #[test]
    fn test_init_logger_twice_reports_error() {
        // env_logger can only be installed once per process; whichever call
        // comes second must fail without panicking.
        let first = init_logger_with(LevelFilter::Info, LogFormat::Plain);
        let second = init_logger_with(LevelFilter::Debug, LogFormat::Json);
        assert!(first.is_err() || second.is_err());
        assert!(matches!(
            second,
            Err(InitializationError::LoggerError(_))
        ));
    }
}
