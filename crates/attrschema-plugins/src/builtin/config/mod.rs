//! Built-in plugin configuration.
//!
//! One place for the defaults and behaviour toggles of the plugins shipped in
//! `builtin`. Everything is serializable; loading from files or the
//! environment is the host's job.
//!
//! Conventions:
//! - every field has a serde default, so partial documents deserialize
//! - `validate` is called before a config is used to build plugins

#![cfg(feature = "builtin")]

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Built-in configuration root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuiltinConfig {
    #[serde(default)]
    pub required: RequiredConfig,
}

impl BuiltinConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.required.validate()
    }
}

/// Configuration for the `builtin.required` plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredConfig {
    /// Default for the `required` option on every adopting attribute.
    #[serde(default = "RequiredConfig::default_required")]
    pub default_required: bool,

    /// Default `required_message` template. `{full_path}` and `{name}` are substituted.
    #[serde(default = "RequiredConfig::default_message")]
    pub message: String,
}

impl Default for RequiredConfig {
    fn default() -> Self {
        Self {
            default_required: Self::default_required(),
            message: Self::default_message(),
        }
    }
}

impl RequiredConfig {
    fn default_required() -> bool {
        true
    }
    fn default_message() -> String {
        "Required value for '{full_path}' is not set.".to_string()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.message.trim().is_empty() {
            return Err(ConfigError::invalid("required.message", "must not be empty"));
        }
        Ok(())
    }
}
