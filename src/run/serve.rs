//! `serve` subcommand.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use crate::config::{Config, ServeConfig};
use crate::export::BulkExporter;
use crate::initialization::init_row_source;
use crate::server::{start_export_server, ExportState};

/// Runs the export service until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the row source cannot be initialized or the address
/// cannot be bound.
pub async fn run_server(config: Config, serve: ServeConfig) -> Result<()> {
    let source = init_row_source(&config)
        .await
        .context("Failed to initialize row source")?;
    info!(
        "Serving {} table(s) from {}",
        config.allowed_tables.tables().len(),
        source.name()
    );
    let exporter = Arc::new(BulkExporter::new(
        source,
        config.allowed_tables.clone(),
        config.export_settings(),
    ));

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, finishing in-flight requests");
                signal_token.cancel();
            }
            Err(e) => warn!("Failed to listen for shutdown signal: {}", e),
        }
    });

    let state = ExportState::new(exporter, serve.admin_tokens.clone(), shutdown);
    start_export_server(&serve, state).await
}
