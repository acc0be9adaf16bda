//! Persistent self-disable switch.
//!
//! The script-plugin channel requires the `item_isvirtual` flag; its absence
//! means the channel is misconfigured and acting on its events could delete
//! the wrong files. When that happens sync is halted until an operator resets
//! the switch, independently of the user-owned config file.

use anyhow::{Context, Result};
use std::path::PathBuf;

const MARKER_NAME: &str = "sync_disabled";

#[derive(Debug, Clone)]
pub struct KillSwitch {
    marker: PathBuf,
}

impl KillSwitch {
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            marker: data_dir.into().join(MARKER_NAME),
        }
    }

    #[must_use]
    pub fn is_tripped(&self) -> bool {
        self.marker.exists()
    }

    pub fn trip(&self) -> Result<()> {
        if let Some(parent) = self.marker.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.marker, b"1")
            .with_context(|| format!("Failed to write {}", self.marker.display()))?;
        Ok(())
    }

    pub fn reset(&self) -> Result<()> {
        if self.marker.exists() {
            std::fs::remove_file(&self.marker)
                .with_context(|| format!("Failed to remove {}", self.marker.display()))?;
        }
        Ok(())
    }
}
