//! VM configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for [`VmConfig`]
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be serialized
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Interpreter strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpreterKind {
    /// Per-instruction checks on the raw code
    #[default]
    Baseline,
    /// Per-block checks on the analyzed code
    Advanced,
}

/// VM configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmConfig {
    /// Interpreter strategy
    #[serde(default)]
    pub interpreter: InterpreterKind,
    /// Keep code analyses between executions
    #[serde(default = "default_analysis_cache")]
    pub analysis_cache: bool,
    /// Most analyses kept per interpreter; the oldest is evicted first
    #[serde(default = "default_analysis_cache_capacity")]
    pub analysis_cache_capacity: usize,
    /// Attach the instruction tracer (stderr)
    #[serde(default)]
    pub trace: bool,
    /// Attach the histogram tracer (stderr)
    #[serde(default)]
    pub histogram: bool,
}

fn default_analysis_cache() -> bool {
    true
}

fn default_analysis_cache_capacity() -> usize {
    crate::cache::DEFAULT_CAPACITY
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            interpreter: InterpreterKind::default(),
            analysis_cache: default_analysis_cache(),
            analysis_cache_capacity: default_analysis_cache_capacity(),
            trace: false,
            histogram: false,
        }
    }
}

impl VmConfig {
    /// Parse a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Render as a TOML document
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
