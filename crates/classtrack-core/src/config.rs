//! ClassTrack configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ClassTrackError, Result};

/// Root configuration, loaded from `~/.classtrack/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Telegram Bot API token.
    #[serde(default)]
    pub bot_token: String,
    /// Telegram user ids allowed to drive the admin menus.
    #[serde(default)]
    pub admin_ids: Vec<i64>,
    /// Directory holding students.json and logs.json.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Long-poll pause between getUpdates calls, seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
    /// Cap on class buttons shown in the cancel/reschedule menus.
    #[serde(default = "default_menu_limit")]
    pub menu_limit: usize,
    /// Default early/late cancellation threshold for new students.
    #[serde(default = "default_cutoff_hours")]
    pub cutoff_hours: i64,
}

fn default_data_dir() -> PathBuf {
    BotConfig::home_dir().join("data")
}
fn default_poll_interval() -> u64 {
    1
}
fn default_menu_limit() -> usize {
    8
}
fn default_cutoff_hours() -> i64 {
    24
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            admin_ids: Vec::new(),
            data_dir: default_data_dir(),
            poll_interval: default_poll_interval(),
            menu_limit: default_menu_limit(),
            cutoff_hours: default_cutoff_hours(),
        }
    }
}

impl BotConfig {
    /// Load config from the default path, falling back to defaults when
    /// no file exists yet.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClassTrackError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| ClassTrackError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| ClassTrackError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the ClassTrack home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".classtrack")
    }

    /// Whether this operator may drive the admin menus. An empty list
    /// means the gate is open (single-admin local deployments).
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.is_empty() || self.admin_ids.contains(&user_id)
    }
}
