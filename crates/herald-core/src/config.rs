//! Configuration system for Herald.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $HERALD_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/herald/config.toml
//!   3. ~/.config/herald/config.toml

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::settings::Settings;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeraldConfig {
    pub discovery: Settings,
    pub node: NodeConfig,
}

/// Knobs for the demo daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Port for the local status API.
    pub api_port: u16,
    /// Topic the built-in echo function is bound to.
    pub echo_topic: String,
    /// FQN the built-in echo function is advertised under.
    pub echo_fqn: String,
    /// Seconds to wait for a probe reply. 0 disables the probe.
    pub probe_timeout: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            api_port: 9101,
            echo_topic: "echo".to_string(),
            echo_fqn: "herald.echo".to_string(),
            probe_timeout: 3,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
        .join("herald")
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl HeraldConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::file_path())?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from a specific file, without env overrides.
    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(HeraldConfig::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("HERALD_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        Self::write_default_to(&path)?;
        Ok(path)
    }

    fn write_default_to(path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteFailed(path.to_path_buf(), e))?;
        }
        let text = toml::to_string_pretty(&HeraldConfig::default())
            .map_err(ConfigError::SerializeFailed)?;
        std::fs::write(path, text).map_err(|e| ConfigError::WriteFailed(path.to_path_buf(), e))
    }

    /// Apply HERALD_* env var overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("HERALD_DISCOVERY__NAMESPACE") {
            self.discovery.namespace = v;
        }
        if let Some(v) = lookup("HERALD_DISCOVERY__VERSION") {
            self.discovery.version = v;
        }
        if let Some(v) = lookup("HERALD_DISCOVERY__TOPIC") {
            self.discovery.discovery_topic = v;
        }
        if let Some(v) = lookup("HERALD_DISCOVERY__INTERESTS") {
            self.discovery.interests = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(Ok(secs)) = lookup("HERALD_DISCOVERY__MAX_AGE").map(|v| v.parse::<u64>()) {
            self.discovery.max_age = secs;
        }
        if let Some(Ok(secs)) = lookup("HERALD_DISCOVERY__INTERVAL").map(|v| v.parse::<u64>()) {
            self.discovery.discovery_interval = secs;
        }
        if let Some(Ok(port)) = lookup("HERALD_NODE__API_PORT").map(|v| v.parse::<u16>()) {
            self.node.api_port = port;
        }
    }
}
