//! `GET /tables` handler.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::super::auth::authorize;
use super::super::types::{ExportState, TablesResponse};

/// Lists the allow-listed tables in export order. Requires an admin token.
pub async fn tables_handler(State(state): State<ExportState>, headers: HeaderMap) -> Response {
    if let Err(err) = authorize(&headers, &state.admin_tokens) {
        return err.into_response();
    }
    let tables = state
        .exporter
        .allow_list()
        .tables()
        .iter()
        .map(|table| table.as_str())
        .collect();
    Json(TablesResponse { tables }).into_response()
}
