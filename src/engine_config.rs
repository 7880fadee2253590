use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use dirs::config_dir;
use paris::{info, warn};
use serde::{Deserialize, Serialize};

use crate::persistence::MONITOR_SETTINGS_KEY;

const CONFIG_FILE_NAME: &str = "cc.ivanli.ring_light/engine.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Delay before the first display enumeration, gives the backend time to start.
    pub warm_up_delay_ms: u64,
    /// Quiet interval of the debounced settings write.
    pub persist_debounce_ms: u64,
    pub settings_key: String,
    /// Clamp brightness and width into their slider ranges on update.
    pub clamp_values: bool,
    /// Displays to enumerate when the backend does not report any.
    pub displays: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            warm_up_delay_ms: 1000,
            persist_debounce_ms: 500,
            settings_key: MONITOR_SETTINGS_KEY.to_string(),
            clamp_values: true,
            displays: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn warm_up_delay(&self) -> Duration {
        Duration::from_millis(self.warm_up_delay_ms)
    }

    pub fn persist_debounce(&self) -> Duration {
        Duration::from_millis(self.persist_debounce_ms)
    }

    /// Get the configuration file path
    pub fn get_config_path() -> anyhow::Result<PathBuf> {
        let config_dir =
            config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join(CONFIG_FILE_NAME))
    }

    /// Read configuration from file, defaults when the file does not exist.
    pub async fn read_config(path: &Path) -> anyhow::Result<Self> {
        if !tokio::fs::try_exists(path).await? {
            info!("Engine config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Write configuration to file
    pub async fn write_config(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Config from the user's config directory, falling back to defaults.
    pub async fn load_or_default() -> Self {
        let result = match Self::get_config_path() {
            Ok(path) => Self::read_config(&path).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to read engine config: {}, using defaults", e);
                Self::default()
            }
        }
    }
}
