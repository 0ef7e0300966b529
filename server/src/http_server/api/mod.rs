use axum::{body::Bytes, extract::State};
use serde_json::Value;

use crate::{
    http_server::errors::{ApiError, ApiResponse},
    state::VersionInfo,
    AppState,
};

pub(crate) mod favorites;
pub(crate) mod recipes;

/// Bodies are read as raw bytes so malformed JSON gets its own error code
/// instead of axum's plain-text rejection.
pub(crate) fn parse_json(body: &Bytes) -> Result<Value, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::InvalidJson(e.to_string()))
}

pub(crate) async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

pub(crate) async fn not_found() -> ApiError {
    ApiError::NotFound("No route matches this path".to_string())
}

pub(crate) async fn versions(State(state): State<AppState>) -> ApiResponse<VersionInfo> {
    ApiResponse(state.versions)
}
