//! Domain types for deletion synchronization.
//!
//! Media servers report deletions with loosely-typed payloads; these types pin
//! down the canonical identity of a deletion once the event has been accepted.

pub mod events;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Effective media kind of a deletion.
///
/// Sources report movies as `"Movie"` or `"MOV"`; everything else is treated
/// as episodic TV content, matching how the transfer pipeline labels rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Movie,
    Tv,
}

impl MediaKind {
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "Movie" | "MOV" => Self::Movie,
            _ => Self::Tv,
        }
    }

    /// Storage value used in `transfer_history.mtype` and the deletion log.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "Movie",
            Self::Tv => "TV",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Zero-padded season label, rendered as `S{nn}` (season 2 -> `S02`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeasonLabel(u32);

impl SeasonLabel {
    /// Parses a raw season field. Only fully-numeric strings are accepted;
    /// anything else (empty, signed, decorated) is not a usable season.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        raw.parse().ok().map(Self)
    }

    #[must_use]
    pub const fn number(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SeasonLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{:02}", self.0)
    }
}

/// Zero-padded episode label, rendered as `E{nn}` (episode 5 -> `E05`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EpisodeLabel(u32);

impl EpisodeLabel {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        raw.parse().ok().map(Self)
    }

    #[must_use]
    pub const fn number(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EpisodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:02}", self.0)
    }
}

/// Canonical deletion tuple produced by the event normalizer.
///
/// `season` and `episode` stay as the raw numeric strings from the source;
/// validation happens per lookup strategy, since a season-only deletion and a
/// season+episode deletion have different requirements.
#[derive(Debug, Clone)]
pub struct DeletionRequest {
    pub kind_raw: String,
    pub name: String,
    pub path: String,
    pub tmdb_id: Option<String>,
    pub season: Option<String>,
    pub episode: Option<String>,
}

impl DeletionRequest {
    /// TMDB id as a number, when the source provided a usable one.
    #[must_use]
    pub fn tmdb_num(&self) -> Option<i64> {
        self.tmdb_id.as_deref().and_then(|t| t.parse().ok())
    }
}
