//! `POST /export` handler.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::export::ExportResult;

use super::super::auth::authorize;
use super::super::error::ApiError;
use super::super::types::{ExportRequestBody, ExportState};

const EXPORT_ROWS_HEADER: HeaderName = HeaderName::from_static("x-export-rows");

/// Runs one export and returns the artifact as an attachment.
///
/// The body is only parsed after the token check, so unauthenticated callers
/// learn nothing about the request format.
pub async fn export_handler(
    State(state): State<ExportState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match run_export(&state, &headers, &body).await {
        Ok(result) => {
            state.stats.record_completed(result.total_rows);
            artifact_response(result)
        }
        Err(err) => {
            state.stats.record(err.outcome());
            if !matches!(err, ApiError::Unauthorized(_) | ApiError::Forbidden) {
                log::warn!("Export request failed: {}", err);
            }
            err.into_response()
        }
    }
}

async fn run_export(
    state: &ExportState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<ExportResult, ApiError> {
    authorize(headers, &state.admin_tokens)?;

    let body: ExportRequestBody = if body.iter().all(u8::is_ascii_whitespace) {
        ExportRequestBody::default()
    } else {
        serde_json::from_slice(body)
            .map_err(|e| ApiError::BadRequest(format!("invalid export request: {e}")))?
    };
    let request = body.to_request()?;

    // Dropping the handler future (client gone) abandons the in-flight fetch;
    // the child token covers server shutdown.
    let cancel = state.shutdown.child_token();
    let result = state.exporter.export(&request, &cancel).await?;
    Ok(result)
}

fn artifact_response(result: ExportResult) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", result.filename);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, result.content_type),
            (header::CONTENT_DISPOSITION, disposition),
            (EXPORT_ROWS_HEADER, result.total_rows.to_string()),
        ],
        result.content,
    )
        .into_response()
}
