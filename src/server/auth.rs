//! Bearer token check for export endpoints.

use axum::http::{header, HeaderMap};

use super::error::ApiError;

/// Checks the `Authorization: Bearer <token>` header against the admin set.
///
/// A missing or malformed header is `Unauthorized`; a well-formed token that
/// is not an admin token is `Forbidden`.
pub(crate) fn authorize(headers: &HeaderMap, admin_tokens: &[String]) -> Result<(), ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(ApiError::Unauthorized("missing bearer token"))?;
    let value = value
        .to_str()
        .map_err(|_| ApiError::Unauthorized("malformed authorization header"))?;

    let token = match value.trim().split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
        _ => return Err(ApiError::Unauthorized("malformed authorization header")),
    };
    if token.is_empty() {
        return Err(ApiError::Unauthorized("malformed authorization header"));
    }

    if admin_tokens.iter().any(|admin| admin == token) {
        Ok(())
    } else {
        log::warn!("Rejected export request: token is not an admin token");
        Err(ApiError::Forbidden)
    }
}
