use axum::{
    Json,
    Router,
    http::HeaderValue,
    routing::{delete, get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domain::events::MediaEvent;
use crate::services::SyncDelService;

mod error;
pub mod events;
pub mod history;
mod types;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn SyncDelService>,

    /// Sender side of the dispatcher queue.
    pub ingest: mpsc::Sender<MediaEvent>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// `GET /api/health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub fn router(state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let api_router = Router::new()
        .route("/events", post(events::ingest_event))
        .route("/history", get(history::list_history))
        .route("/history", delete(history::clear_history))
        .route("/history/{unique_key}", delete(history::delete_history_entry))
        .route("/health", get(health))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
