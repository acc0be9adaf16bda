//! Event types crossing the plugin boundary.
//!
//! Inbound [`MediaEvent`]s arrive from the media-server channels; outbound
//! [`OutboundEvent`]s are published on a broadcast bus for external consumers
//! such as a downloader manager.

use serde::{Deserialize, Deserializer, Serialize};

/// Inbound media-server event, deliberately loose.
///
/// The two channels (webhook and script plugin) share most fields but name the
/// media type differently, and numeric fields arrive as either JSON numbers or
/// strings depending on the source version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaEvent {
    pub event: String,

    /// Webhook channel media type (`Movie`, `Series`, `Season`, `Episode`).
    #[serde(default)]
    pub media_type: Option<String>,

    /// Script-plugin channel media type.
    #[serde(default)]
    pub item_type: Option<String>,

    #[serde(default)]
    pub item_name: Option<String>,

    #[serde(default)]
    pub item_path: Option<String>,

    #[serde(default, deserialize_with = "stringlike")]
    pub tmdb_id: Option<String>,

    #[serde(default, deserialize_with = "stringlike")]
    pub season_id: Option<String>,

    #[serde(default, deserialize_with = "stringlike")]
    pub episode_id: Option<String>,

    /// Script-plugin virtual-item flag, the literal strings `"True"`/`"False"`.
    /// Its absence on that channel is a safety fault.
    #[serde(default)]
    pub item_isvirtual: Option<String>,
}

impl MediaEvent {
    /// Media type as reported, preferring the webhook field name.
    #[must_use]
    pub fn raw_media_type(&self) -> Option<&str> {
        self.media_type.as_deref().or(self.item_type.as_deref())
    }
}

/// Accepts numbers and strings alike, normalizing to `String`.
fn stringlike<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Events published for external subsystems.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum OutboundEvent {
    /// A source file tied to a download task was deleted; the downloader
    /// manager decides what to do with the task itself.
    DownloadFileDeleted { src: String, hash: String },
}

pub type EventBus = tokio::sync::broadcast::Sender<OutboundEvent>;

/// Result of handling one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Event kind or channel did not apply to this handler.
    Ignored,
    /// Valid event, deliberately not acted on (excluded path, path still
    /// present, no matching records).
    Skipped { reason: String },
    /// Malformed or incomplete event, dropped without side effects.
    Rejected { reason: String },
    /// Safety fault: the kill switch was tripped.
    Disabled,
    /// Infrastructure failure after acceptance; logged by the dispatcher.
    Failed { reason: String },
    /// Deletion cascade ran to completion.
    Completed { deleted_records: usize },
}
