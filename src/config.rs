use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub sync: SyncConfig,

    pub notifications: NotificationsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Directory for plugin-owned state (kill-switch marker).
    pub data_path: String,

    /// Outbound event bus buffer size (default: 100)
    pub event_bus_buffer_size: usize,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/mediasweep.db".to_string(),
            log_level: "info".to_string(),
            data_path: "data".to_string(),
            event_bus_buffer_size: 100,
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 6790,
            cors_allowed_origins: vec![
                "http://localhost:6790".to_string(),
                "http://127.0.0.1:6790".to_string(),
            ],
        }
    }
}

/// Which media-server channel deletion events are expected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncType {
    /// Emby 4.8.0.45+ item-deletion webhooks.
    Webhook,
    /// The Scripter X script plugin (`media_del` events).
    Plugin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub enabled: bool,

    pub sync_type: SyncType,

    pub notify: bool,

    /// Also delete the original source file (and signal the downloader
    /// manager) in addition to the library-side hard link.
    pub del_source: bool,

    /// One-shot: clear the deletion log at startup, then reset to false.
    pub del_history: bool,

    /// Comma-separated absolute path prefixes to leave alone.
    pub exclude_path: String,

    /// Newline-separated `from:to` pairs mapping media-server paths onto
    /// local transfer destinations. Misconfiguring this is the usual reason
    /// lookups come back empty.
    pub library_path: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sync_type: SyncType::Webhook,
            notify: true,
            del_source: false,
            del_history: false,
            exclude_path: String::new(),
            library_path: String::new(),
        }
    }
}

impl SyncConfig {
    /// Configured exclusion prefixes, empty entries dropped.
    #[must_use]
    pub fn exclude_prefixes(&self) -> Vec<PathBuf> {
        self.exclude_path
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .collect()
    }

    /// Configured `from:to` remap pairs; lines without a colon are ignored.
    #[must_use]
    pub fn path_mappings(&self) -> Vec<(String, String)> {
        self.library_path
            .lines()
            .filter_map(|line| {
                let (from, to) = line.split_once(':')?;
                if from.is_empty() {
                    return None;
                }
                Some((from.to_string(), to.to_string()))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// JSON webhook receiving deletion summaries. Empty means log-only.
    pub webhook_url: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::default_config_path();
        self.save_to_path(&path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("mediasweep").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".mediasweep").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.database_path.is_empty() {
            anyhow::bail!("general.database_path cannot be empty");
        }

        for line in self.sync.library_path.lines() {
            if !line.trim().is_empty() && !line.contains(':') {
                anyhow::bail!("sync.library_path line '{line}' is not a from:to pair");
            }
        }

        Ok(())
    }
}
