//! Domain service for deletion synchronization.
//!
//! This module provides the [`SyncDelService`] trait: turning media-server
//! deletion events into transfer-history cleanup, plus the read/delete surface
//! over the plugin's own deletion log.

use crate::db::LogEntry;
use crate::domain::events::{MediaEvent, Outcome};
use thiserror::Error;

/// Domain errors for deletion-sync operations.
///
/// Malformed or inapplicable events are not errors; they come back as
/// [`Outcome`] variants. Errors are reserved for infrastructure faults.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Log entry not found: {0}")]
    LogEntryNotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for SyncError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for deletion synchronization.
#[async_trait::async_trait]
pub trait SyncDelService: Send + Sync {
    /// Handles an item-deletion webhook (`library.deleted` / `ItemDeleted`).
    ///
    /// Runs the full cascade: normalize, resolve transfer records, delete
    /// rows and files, prune directories, log and notify.
    ///
    /// # Errors
    ///
    /// - Returns [`SyncError::Database`] on history-store failures
    async fn handle_webhook_event(&self, event: &MediaEvent) -> Result<Outcome, SyncError>;

    /// Handles a script-plugin deletion (`media_del`).
    ///
    /// A payload without the `item_isvirtual` flag trips the persisted kill
    /// switch and aborts; virtual items are ignored outright.
    ///
    /// # Errors
    ///
    /// - Returns [`SyncError::Database`] on history-store failures
    /// - Returns [`SyncError::Internal`] if the kill switch cannot be persisted
    async fn handle_scripter_event(&self, event: &MediaEvent) -> Result<Outcome, SyncError>;

    /// Deletion log, newest first.
    async fn deletion_log(&self) -> Result<Vec<LogEntry>, SyncError>;

    /// Removes one log entry by its composite key.
    ///
    /// # Errors
    ///
    /// - Returns [`SyncError::LogEntryNotFound`] if no entry carries the key
    async fn delete_log_entry(&self, unique_key: &str) -> Result<(), SyncError>;

    /// Wipes the deletion log, returning the number of entries removed.
    async fn clear_log(&self) -> Result<u64, SyncError>;
}
