//! HTTP export service.
//!
//! Provides three endpoints:
//! - `POST /export` - runs an export and returns the artifact (admin token)
//! - `GET /tables` - allow-listed table names (admin token)
//! - `GET /status` - JSON counters for completed and failed exports
//!
//! The server stops accepting connections when the state's shutdown token is
//! cancelled; in-flight exports see the same cancellation.

mod auth;
mod error;
mod handlers;
mod types;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::config::{ServeConfig, MAX_REQUEST_BODY_BYTES};

pub use error::ApiError;
use handlers::{export_handler, status_handler, tables_handler};
pub use types::{ExportRequestBody, ExportState, StatusResponse, TablesResponse};

/// Builds the service router.
pub fn build_router(state: ExportState) -> Router {
    Router::new()
        .route("/export", post(export_handler))
        .route("/tables", get(tables_handler))
        .route("/status", get(status_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .with_state(state)
}

/// Binds the configured address and serves until the shutdown token fires.
pub async fn start_export_server(
    config: &ServeConfig,
    state: ExportState,
) -> Result<(), anyhow::Error> {
    let addr = format!("{}:{}", config.bind, config.port);
    let shutdown = state.shutdown.clone();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind export server to {}: {}", addr, e))?;

    log::info!("Export server listening on http://{}/", addr);
    log::info!("  - Export: POST http://{}/export", addr);
    log::info!("  - Tables: GET http://{}/tables", addr);
    log::info!("  - Status: GET http://{}/status", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| anyhow::anyhow!("Export server error: {}", e))?;

    log::info!("Export server stopped");
    Ok(())
}
