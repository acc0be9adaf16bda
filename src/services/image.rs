//! Poster/backdrop lookup seam.
//!
//! The host platform resolves artwork from its own metadata chain; this crate
//! only needs a seam plus URL plumbing for records that store bare TMDB image
//! paths.

use crate::constants::{DEFAULT_NOTIFICATION_ICON, tmdb};
use crate::domain::MediaKind;
use anyhow::Result;

#[async_trait::async_trait]
pub trait MediaImageService: Send + Sync {
    /// Backdrop for the notification, if the collaborator can resolve one.
    async fn backdrop(
        &self,
        tmdb_id: Option<&str>,
        kind: MediaKind,
        season: Option<&str>,
        episode: Option<&str>,
    ) -> Result<Option<String>>;

    /// Poster for the deletion-log entry.
    async fn poster(&self, tmdb_id: Option<&str>, kind: MediaKind) -> Result<Option<String>>;
}

/// Stand-in used when no artwork collaborator is wired up; callers fall back
/// to the transfer record's own image or the default icon.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoArtworkService;

#[async_trait::async_trait]
impl MediaImageService for NoArtworkService {
    async fn backdrop(
        &self,
        _tmdb_id: Option<&str>,
        _kind: MediaKind,
        _season: Option<&str>,
        _episode: Option<&str>,
    ) -> Result<Option<String>> {
        Ok(None)
    }

    async fn poster(&self, _tmdb_id: Option<&str>, _kind: MediaKind) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Builds a full TMDB image URL from a bare path like `/abc.jpg`.
#[must_use]
pub fn tmdb_image_url(path: &str, prefix: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    format!("{}/t/p/{}{}", tmdb::IMAGE_BASE, prefix, path)
}

/// Normalizes a transfer record's image field: absolute URLs pass through,
/// bare TMDB paths get the default prefix, anything else falls back to the
/// notification icon.
#[must_use]
pub fn normalize_image_url(raw: &str) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else if raw.starts_with('/') {
        tmdb_image_url(raw, tmdb::DEFAULT_IMAGE_PREFIX)
    } else {
        DEFAULT_NOTIFICATION_ICON.to_string()
    }
}
