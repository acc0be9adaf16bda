//! Deletion-log endpoints.

use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, ClearedDto, LogEntryDto};

/// Lists the deletion log, newest first.
///
/// # Endpoint
/// `GET /api/history`
pub async fn list_history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<LogEntryDto>>>, ApiError> {
    let entries = state.service.deletion_log().await?;
    let dtos = entries.into_iter().map(LogEntryDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}

/// Removes one deletion-log entry by its composite key.
///
/// # Endpoint
/// `DELETE /api/history/{unique_key}`
pub async fn delete_history_entry(
    State(state): State<Arc<AppState>>,
    Path(unique_key): Path<String>,
) -> Result<Json<ApiResponse<&'static str>>, ApiError> {
    state.service.delete_log_entry(&unique_key).await?;
    Ok(Json(ApiResponse::success("deleted")))
}

/// Wipes the deletion log.
///
/// # Endpoint
/// `DELETE /api/history`
pub async fn clear_history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ClearedDto>>, ApiError> {
    let removed = state.service.clear_log().await?;
    Ok(Json(ApiResponse::success(ClearedDto { removed })))
}
