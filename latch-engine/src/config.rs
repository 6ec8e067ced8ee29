//! Engine configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via LATCH_CONFIG)
//! 3. Environment variables

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Timeout applied to script, external-call and store-query executors
    /// unless their rule config overrides it, in milliseconds.
    pub rule_timeout_ms: u64,

    /// Maximum number of nodes visited by the cycle-detection traversal.
    pub max_traversal_depth: usize,

    /// Maximum composite-rule nesting depth.
    pub max_rule_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rule_timeout_ms: 5_000,
            max_traversal_depth: 256,
            max_rule_depth: 16,
        }
    }
}

impl EngineConfig {
    /// Loads configuration from file (if `LATCH_CONFIG` is set), then
    /// applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("LATCH_CONFIG") {
            config = Self::from_file(&path)?;
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: EngineConfig = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    /// Applies `LATCH_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse("LATCH_RULE_TIMEOUT_MS") {
            self.rule_timeout_ms = v;
        }
        if let Some(v) = env_parse("LATCH_MAX_TRAVERSAL_DEPTH") {
            self.max_traversal_depth = v;
        }
        if let Some(v) = env_parse("LATCH_MAX_RULE_DEPTH") {
            self.max_rule_depth = v;
        }
    }

    /// Default executor timeout as a [`Duration`].
    pub fn rule_timeout(&self) -> Duration {
        Duration::from_millis(self.rule_timeout_ms)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config file {0}: {1}")]
    Parse(PathBuf, String),
}
