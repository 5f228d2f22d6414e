//! `export` subcommand.

use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Local;
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use crate::config::{Config, ExportArgs};
use crate::export::{BulkExporter, ExportRequest, ExportSummary, ExportTable};
use crate::initialization::init_row_source;

use super::output::{IgnoreBrokenPipe, OutputTarget};

/// Results of a CLI export.
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// Generated artifact name (also used for stdout exports)
    pub filename: String,
    /// Written file, `None` for stdout
    pub path: Option<PathBuf>,
    pub total_rows: u64,
    pub compressed: bool,
    /// Rows per table, in export order
    pub tables: Vec<(ExportTable, u64)>,
    pub elapsed_seconds: f64,
}

/// Runs one export described by the `export` flags.
///
/// File output is staged in a temporary file next to the destination and
/// renamed into place only after every page was written, so a failed or
/// interrupted export never leaves a partial artifact behind. Stdout output
/// is streamed and may end early if the export is interrupted.
///
/// # Errors
///
/// Returns an error if the request is invalid, the row source cannot be
/// initialized, a page fetch fails, or the output cannot be written.
pub async fn run_export(config: Config, args: &ExportArgs) -> Result<ExportReport> {
    let request = args.to_request()?;
    let source = init_row_source(&config)
        .await
        .context("Failed to initialize row source")?;
    let exporter = BulkExporter::new(
        source,
        config.allowed_tables.clone(),
        config.export_settings(),
    );
    // Reject bad requests before creating any output.
    exporter.validate(&request)?;

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling export");
            signal_token.cancel();
        }
    });

    let start_time = Instant::now();
    let target = OutputTarget::from_arg(&args.output);
    let result = export_to_target(&exporter, &request, &target, &cancel).await;
    signal_task.abort();

    let (summary, path) = result?;
    let elapsed_seconds = start_time.elapsed().as_secs_f64();
    if let Some(path) = &path {
        info!("Wrote {} ({} rows)", path.display(), summary.total_rows);
    }

    Ok(ExportReport {
        filename: summary.filename,
        path,
        total_rows: summary.total_rows,
        compressed: summary.compressed,
        tables: summary.tables,
        elapsed_seconds,
    })
}

async fn export_to_target(
    exporter: &BulkExporter,
    request: &ExportRequest,
    target: &OutputTarget,
    cancel: &CancellationToken,
) -> Result<(ExportSummary, Option<PathBuf>)> {
    let date = Local::now().date_naive();

    let Some(staging_dir) = target.staging_dir() else {
        let mut out = IgnoreBrokenPipe::new(BufWriter::new(std::io::stdout()));
        let summary = exporter
            .export_to_writer(request, date, &mut out, cancel)
            .await?;
        out.flush().context("Failed to flush stdout")?;
        return Ok((summary, None));
    };

    let mut staged = tempfile::Builder::new()
        .prefix(".planning_export-")
        .tempfile_in(&staging_dir)
        .with_context(|| {
            format!(
                "Failed to create temporary file in {}",
                staging_dir.display()
            )
        })?;

    let summary = {
        let mut out = BufWriter::new(staged.as_file_mut());
        let summary = exporter
            .export_to_writer(request, date, &mut out, cancel)
            .await?;
        out.flush().context("Failed to flush export file")?;
        summary
    };

    let Some(final_path) = target.final_path(&summary.filename) else {
        anyhow::bail!("output target has no file path");
    };
    staged
        .persist(&final_path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to write {}", final_path.display()))?;

    Ok((summary, Some(final_path)))
}
