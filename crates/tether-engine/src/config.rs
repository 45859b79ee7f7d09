//! Engine configuration (tether.toml)
//!
//! ```toml
//! [binding]
//! generation = "enabled"
//! fallback = true
//! max_generated_arity = 8
//! assignability = "convertible"
//! log_fallbacks = true
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::convert::AssignabilityMode;

/// Largest arity accepted for `max_generated_arity`
pub const ARITY_LIMIT: usize = 255;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Whether accessors are synthesized at bind time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Generate accessors, falling back on failure
    #[default]
    Enabled,
    /// Always use the reflective fallback
    Disabled,
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationMode::Enabled => write!(f, "enabled"),
            GenerationMode::Disabled => write!(f, "disabled"),
        }
    }
}

/// Binding behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BindingConfig {
    /// Accessor generation
    #[serde(default)]
    pub generation: GenerationMode,

    /// Substitute the reflective fallback when generation fails
    #[serde(default = "default_true")]
    pub fallback: bool,

    /// Largest parameter count the generator handles
    #[serde(default = "default_max_arity")]
    pub max_generated_arity: usize,

    /// Type compatibility rule used by the resolver
    #[serde(default)]
    pub assignability: AssignabilityMode,

    /// Log a warning whenever a fallback is substituted
    #[serde(default = "default_true")]
    pub log_fallbacks: bool,
}

fn default_true() -> bool {
    true
}

fn default_max_arity() -> usize {
    8
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            generation: GenerationMode::default(),
            fallback: true,
            max_generated_arity: default_max_arity(),
            assignability: AssignabilityMode::default(),
            log_fallbacks: true,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Binding behaviour
    #[serde(default)]
    pub binding: BindingConfig,
}

impl EngineConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let binding = &self.binding;
        if binding.max_generated_arity > ARITY_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_generated_arity {} exceeds {}",
                binding.max_generated_arity, ARITY_LIMIT
            )));
        }
        if binding.generation == GenerationMode::Disabled && !binding.fallback {
            return Err(ConfigError::Invalid(
                "generation is disabled and fallback is off: nothing could ever bind".to_string(),
            ));
        }
        Ok(())
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
