//! CLI configuration
//!
//! Settings come from, in order of precedence: command-line flags, their
//! `AEDRA_*` environment variables, the TOML config file, then defaults.

use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::output::OutputFormat;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "AEDRA_CONFIG";

/// Get default data directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("aedra")
}

/// Location of the config file
pub fn config_file_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("aedra")
        .join("config.toml")
}

/// Configuration for the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub default_graph: String,
    pub format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_graph: "default".to_string(),
            format: OutputFormat::Table,
        }
    }
}

impl Config {
    /// Load the config file, falling back to defaults when it is missing or unreadable
    pub fn load() -> Self {
        let path = config_file_path();
        match Self::load_from(&path) {
            Ok(Some(config)) => config,
            Ok(None) => Self::default(),
            Err(e) => {
                tracing::warn!("Ignoring config file {}: {:#}", path.display(), e);
                Self::default()
            }
        }
    }

    fn load_from(path: &std::path::Path) -> anyhow::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(Some(config))
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let path = config_file_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)
            .with_context(|| format!("writing config file {}", path.display()))?;
        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn keys() -> &'static [&'static str] {
        &["data_dir", "default_graph", "format"]
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "data_dir" => Some(self.data_dir.display().to_string()),
            "default_graph" => Some(self.default_graph.clone()),
            "format" => Some(self.format.to_string()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "data_dir" => self.data_dir = PathBuf::from(value),
            "default_graph" => {
                aedra_storage::validate_graph_name(value)?;
                self.default_graph = value.to_string();
            }
            "format" => self.format = value.parse()?,
            _ => anyhow::bail!(
                "Unknown config key: {} (available: {})",
                key,
                Self::keys().join(", ")
            ),
        }
        Ok(())
    }
}
