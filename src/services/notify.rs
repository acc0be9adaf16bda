//! User notification seam and the deletion summary text.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize)]
pub struct DeletionNotice {
    pub title: String,
    pub text: String,
    pub image: String,
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: &DeletionNotice) -> Result<()>;
}

/// Posts the notice as JSON to a configured webhook.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notice: &DeletionNotice) -> Result<()> {
        self.client
            .post(&self.url)
            .json(notice)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Fallback when no webhook is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notice: &DeletionNotice) -> Result<()> {
        tracing::info!("{}: {}", notice.title, notice.text.replace('\n', " | "));
        Ok(())
    }
}

/// Summary text for a completed cascade.
///
/// The torrent counters are populated only by a downloader feedback channel;
/// with downloader handling delegated to the `DownloadFileDeleted` consumer
/// they stay empty and those lines are omitted.
#[must_use]
pub fn build_summary(
    description: &str,
    record_count: usize,
    deleted_hashes: &[String],
    paused_hashes: &[String],
    error_count: usize,
    timestamp: &str,
) -> String {
    let mut text = format!("{description}\nRemoved {record_count} transfer records\n");

    let deleted: HashSet<&String> = deleted_hashes.iter().collect();
    if !deleted.is_empty() {
        text.push_str(&format!("Removed {} torrents\n", deleted.len()));
    }

    let paused = paused_hashes
        .iter()
        .collect::<HashSet<_>>()
        .into_iter()
        .filter(|hash| !deleted.contains(*hash))
        .count();
    if paused > 0 {
        text.push_str(&format!("Paused {paused} torrents\n"));
    }

    if error_count > 0 {
        text.push_str(&format!("Failed to remove {error_count} torrents\n"));
    }

    text.push_str(&format!("At {timestamp}"));
    text
}
