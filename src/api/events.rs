//! Event ingest endpoint.
//!
//! Media servers post deletion events here. The handler only validates the
//! payload shape and queues it; the dispatcher runs the cascade off the queue,
//! one event at a time.

use axum::{Json, extract::State, http::StatusCode};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::domain::events::MediaEvent;

/// Accepts a media-server event.
///
/// # Endpoint
/// `POST /api/events`
///
/// Responds `202 Accepted` once the event is queued; handling happens
/// asynchronously.
pub async fn ingest_event(
    State(state): State<Arc<AppState>>,
    Json(event): Json<MediaEvent>,
) -> Result<(StatusCode, Json<ApiResponse<&'static str>>), ApiError> {
    if event.event.is_empty() {
        return Err(ApiError::ValidationError(
            "event field must not be empty".to_string(),
        ));
    }

    state
        .ingest
        .send(event)
        .await
        .map_err(|_| ApiError::InternalError("event queue is closed".to_string()))?;

    Ok((StatusCode::ACCEPTED, Json(ApiResponse::success("queued"))))
}
