//! `GET /status` handler.

use axum::extract::State;
use axum::Json;
use strum::IntoEnumIterator;

use crate::error_handling::ExportOutcome;

use super::super::types::{ExportState, StatusResponse};

/// Service counters. Unauthenticated; exposes no row data.
pub async fn status_handler(State(state): State<ExportState>) -> Json<StatusResponse> {
    let outcomes = ExportOutcome::iter()
        .map(|outcome| (outcome.as_str(), state.stats.count(outcome)))
        .collect();

    Json(StatusResponse {
        source: state.exporter.source_name().to_string(),
        exports_completed: state.stats.count(ExportOutcome::Completed),
        exports_failed: state.stats.total_failed(),
        rows_exported: state.stats.rows_exported(),
        uptime_seconds: state.start_time.elapsed().as_secs_f64(),
        outcomes,
    })
}
