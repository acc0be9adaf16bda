//! Inbound event dispatch.
//!
//! Events from the ingest surface are queued on an mpsc channel and handled
//! serially, so two deletions can never race on the same transfer rows or
//! directory tree. Handlers subscribe to event kinds by name.

use crate::domain::events::{MediaEvent, Outcome};
use crate::services::SyncDelService;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// A consumer of inbound media-server events.
#[async_trait::async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &MediaEvent) -> Outcome;
}

/// Routes events to handlers registered for their kind and runs them one at a
/// time off an mpsc queue.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<String, Vec<Arc<dyn EventHandler>>>,
}

impl EventDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: impl Into<String>, handler: Arc<dyn EventHandler>) {
        self.handlers.entry(kind.into()).or_default().push(handler);
    }

    /// Delivers one event to every handler registered for its kind.
    pub async fn dispatch(&self, event: &MediaEvent) {
        let Some(handlers) = self.handlers.get(&event.event) else {
            debug!("No handler for event kind {}", event.event);
            return;
        };
        for handler in handlers {
            match handler.handle(event).await {
                Outcome::Ignored => {}
                Outcome::Skipped { reason } => {
                    debug!("Event {} skipped: {reason}", event.event);
                }
                Outcome::Rejected { reason } => {
                    debug!("Event {} rejected: {reason}", event.event);
                }
                Outcome::Disabled => {
                    error!("Deletion sync disabled itself while handling {}", event.event);
                }
                Outcome::Failed { reason } => {
                    error!("Handler failed on event {}: {reason}", event.event);
                }
                Outcome::Completed { deleted_records } => {
                    info!(
                        "Event {} handled, {deleted_records} transfer records removed",
                        event.event
                    );
                }
            }
        }
    }

    /// Drains the ingest queue until all senders are dropped.
    pub async fn run(self, mut receiver: mpsc::Receiver<MediaEvent>) {
        while let Some(event) = receiver.recv().await {
            self.dispatch(&event).await;
        }
        info!("Event queue closed, dispatcher stopping");
    }
}

/// Bridges both deletion channels onto the sync service.
pub struct SyncDelHandler {
    service: Arc<dyn SyncDelService>,
}

impl SyncDelHandler {
    #[must_use]
    pub fn new(service: Arc<dyn SyncDelService>) -> Self {
        Self { service }
    }

    /// Event kinds this handler wants; register it under each.
    #[must_use]
    pub const fn kinds() -> [&'static str; 3] {
        ["library.deleted", "ItemDeleted", "media_del"]
    }
}

#[async_trait::async_trait]
impl EventHandler for SyncDelHandler {
    async fn handle(&self, event: &MediaEvent) -> Outcome {
        let result = if event.event == "media_del" {
            self.service.handle_scripter_event(event).await
        } else {
            self.service.handle_webhook_event(event).await
        };
        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Deletion sync failed: {e}");
                Outcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
