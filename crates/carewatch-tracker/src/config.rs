use anyhow::{Context, Result};
use carewatch_common::{DetectionConfig, GeneralConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::synthesizer::DEFAULT_CHILD_NAME;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct TrackerConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub child: ChildConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChildConfig {
    pub name: String,
}

impl Default for ChildConfig {
    fn default() -> Self {
        Self { name: DEFAULT_CHILD_NAME.to_string() }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct OutputConfig {
    /// Where care logs are appended; stdout when unset
    pub path: Option<String>,
}

impl TrackerConfig {
    /// Default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("carewatch")
            .join("tracker.toml")
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        debug!("Loading tracker configuration from {:?}", config_path);

        if !config_path.exists() {
            info!(
                "Configuration file not found at {:?}, creating default configuration",
                config_path
            );
            let default_config = Self::default();
            default_config.save_to_path(config_path)?;
            return Ok(default_config);
        }

        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: TrackerConfig = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        config.validate()?;

        info!("Loaded tracker configuration from {:?}", config_path);
        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        debug!("Saving tracker configuration to {:?}", config_path);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let config_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(config_path, config_content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        info!("Saved tracker configuration to {:?}", config_path);
        Ok(())
    }

    /// Update the configuration in memory and save it to `config_path`
    pub fn update_and_save<F>(&mut self, config_path: &Path, update_fn: F) -> Result<()>
    where
        F: FnOnce(&mut Self),
    {
        update_fn(self);
        self.validate()?;
        self.save_to_path(config_path)
    }

    pub fn validate(&self) -> Result<()> {
        self.detection.validate().context("Invalid [detection] section")?;
        debug!("Configuration validation passed");
        Ok(())
    }
}
