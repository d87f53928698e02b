//! Configuration for the plugin host.
//!
//! ```toml
//! [plugins]
//! enabled = true
//! disabled = ["AutoAccept"]
//!
//! [plugins.settings.RunePages]
//! page_name = "Generated"
//!
//! [log]
//! level = "debug"
//! ```

use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{PluginError, Result};

/// Environment variable overriding `log.level`.
pub const LOG_LEVEL_ENV: &str = "LCU_PLUGIN_LOG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub plugins: PluginsConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginsConfig {
    /// Whether plugins are registered at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Plugin names skipped at registration
    #[serde(default)]
    pub disabled: Vec<String>,
    /// Free-form settings per plugin name
    #[serde(default)]
    pub settings: HashMap<String, HashMap<String, serde_json::Value>>,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            disabled: Vec::new(),
            settings: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `info` or `lcu_plugin=debug`
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_true")]
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            ansi: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Parse and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Default config file location, e.g. `~/.config/lcu-plugin/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "lcu-plugin").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from [`Config::default_path`] if the file exists, else defaults.
    /// Environment overrides are applied either way, then the result is
    /// validated.
    pub fn load_or_default() -> anyhow::Result<Self> {
        Self::load_from_or_default(Self::default_path().as_deref())
    }

    fn load_from_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => Self::read(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            _ => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var(LOG_LEVEL_ENV) {
            if !level.trim().is_empty() {
                self.log.level = level.trim().to_string();
            }
        }
    }

    /// Reject settings that can never take effect.
    pub fn validate(&self) -> Result<()> {
        if self.log.level.trim().is_empty() {
            return Err(PluginError::Config("log.level must not be empty".into()));
        }
        if let Some(name) = self
            .plugins
            .disabled
            .iter()
            .find(|name| name.trim().is_empty())
        {
            return Err(PluginError::Config(format!(
                "plugins.disabled contains a blank name: {name:?}"
            )));
        }
        Ok(())
    }
}
