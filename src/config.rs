//! On-disk configuration consulted by `b15fctl` before touching hardware.

use crate::error::{B15FError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Serial port to use instead of scanning, e.g. `/dev/ttyUSB0`.
    #[serde(default)]
    pub default_port: Option<String>,
    /// Per-port probe timeout in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

fn default_probe_timeout_ms() -> u64 {
    5000
}

impl Default for ToolConfig {
    fn default() -> Self {
        ToolConfig {
            default_port: None,
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

/// Get the configuration file path inside the platform config directory
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .map(|p| p.join("b15f"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.toml")
}

/// Load configuration from file, creating default if not exists
pub fn load() -> Result<ToolConfig> {
    load_from(&config_path())
}

pub fn load_from(path: &Path) -> Result<ToolConfig> {
    if !path.exists() {
        tracing::info!("Config file not found at {:?}, creating default", path);
        let config = ToolConfig::default();
        save_to(path, &config)?;
        return Ok(config);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| B15FError::Config(format!("Failed to read config from {:?}: {}", path, e)))?;

    let config: ToolConfig = toml::from_str(&content)?;
    validate(&config)?;

    tracing::debug!("Loaded config from {:?}", path);
    Ok(config)
}

/// Save configuration to file
pub fn save(config: &ToolConfig) -> Result<()> {
    save_to(&config_path(), config)
}

pub fn save_to(path: &Path, config: &ToolConfig) -> Result<()> {
    validate(config)?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            B15FError::Config(format!(
                "Failed to create config directory {:?}: {}",
                parent, e
            ))
        })?;
    }

    let content = toml::to_string_pretty(config)?;

    fs::write(path, content)
        .map_err(|e| B15FError::Config(format!("Failed to write config to {:?}: {}", path, e)))?;

    tracing::debug!("Saved config to {:?}", path);
    Ok(())
}

/// Reject configurations that cannot work before any port is touched
pub fn validate(config: &ToolConfig) -> Result<()> {
    if config.probe_timeout_ms == 0 {
        return Err(B15FError::Config(
            "probe_timeout_ms must be greater than zero".to_string(),
        ));
    }

    if let Some(port) = &config.default_port {
        if port.trim().is_empty() {
            return Err(B15FError::Config(
                "default_port must not be empty".to_string(),
            ));
        }
    }

    Ok(())
}
