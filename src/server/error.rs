//! HTTP error responses.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::error_handling::{ExportError, ExportOutcome};

/// Message returned for backend and serialization failures. Details stay in
/// the log.
const EXPORT_FAILED_MESSAGE: &str = "the export failed, try again";

/// Errors returned by the export service, rendered as `{"error": "..."}`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed `Authorization` header
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    /// Well-formed token without export rights
    #[error("forbidden")]
    Forbidden,

    /// Body that is not a valid export request
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Export(e) if e.is_caller_error() => StatusCode::BAD_REQUEST,
            ApiError::Export(ExportError::Cancelled) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Category counted by the `/status` endpoint.
    pub fn outcome(&self) -> ExportOutcome {
        match self {
            ApiError::Unauthorized(_) => ExportOutcome::Unauthorized,
            ApiError::Forbidden => ExportOutcome::Forbidden,
            ApiError::BadRequest(_) => ExportOutcome::InvalidRequest,
            ApiError::Export(e) => ExportOutcome::from(e),
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Unauthorized(reason) => format!("unauthorized: {reason}"),
            ApiError::Forbidden => "forbidden: this token may not export data".to_string(),
            ApiError::BadRequest(message) => message.clone(),
            ApiError::Export(e) if e.is_caller_error() => e.to_string(),
            ApiError::Export(ExportError::Cancelled) => "the export was cancelled".to_string(),
            ApiError::Export(_) => EXPORT_FAILED_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.public_message() }));
        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}
