use anyhow::{anyhow, Result};
use log::info;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tokio::time::Duration;

use crate::delivery::DEFAULT_REPLIES;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Delay before the counterpart starts "typing".
    pub typing_delay_ms: u64,
    /// How long the counterpart types before the reply lands.
    pub reply_delay_ms: u64,
    /// How long the loading spinner shows after switching contacts.
    pub loading_delay_ms: u64,
    /// Name shown in the typing indicator.
    pub contact_name: String,
    pub replies: Vec<String>,
    /// Start every conversation with the canned opening messages.
    pub seed_history: bool,
    pub initial_contact: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            typing_delay_ms: 1000,
            reply_delay_ms: 2000,
            loading_delay_ms: 800,
            contact_name: "Sudhanshu".to_string(),
            replies: DEFAULT_REPLIES.iter().map(|r| r.to_string()).collect(),
            seed_history: true,
            initial_contact: 1,
        }
    }
}

impl SessionConfig {
    pub fn typing_delay(&self) -> Duration {
        Duration::from_millis(self.typing_delay_ms)
    }

    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    pub fn loading_delay(&self) -> Duration {
        Duration::from_millis(self.loading_delay_ms)
    }
}

static CONFIG_PATH_OVERRIDE: OnceCell<PathBuf> = OnceCell::new();

/// Use `path` instead of the per-user config file for the rest of the process.
pub fn set_config_path_override(path: PathBuf) -> bool {
    CONFIG_PATH_OVERRIDE.set(path).is_ok()
}

pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow!("Could not determine config directory"))?
        .join("parley");
    Ok(config_dir)
}

fn get_config_path() -> Result<PathBuf> {
    if let Some(path) = CONFIG_PATH_OVERRIDE.get() {
        return Ok(path.clone());
    }
    Ok(get_config_dir()?.join("config.json"))
}

/// Load the session config from `path` or the default location. A missing
/// file yields the defaults; a malformed one is an error.
pub fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => get_config_path()?,
    };

    if !config_path.exists() {
        info!("No config at {}, using defaults", config_path.display());
        return Ok(SessionConfig::default());
    }

    let contents = fs::read_to_string(&config_path)?;
    let config: SessionConfig = serde_json::from_str(&contents)
        .map_err(|e| anyhow!("Invalid config {}: {}", config_path.display(), e))?;
    info!("Loaded config from {}", config_path.display());

    Ok(config)
}

pub fn save_config(config: &SessionConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, config)?;

    info!("Config saved to {}", path.display());
    Ok(())
}
