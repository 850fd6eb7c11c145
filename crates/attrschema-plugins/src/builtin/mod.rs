//! Built-in plugins.
//!
//! - `builtin.required`: flags leaf attributes whose value is not set
//!
//! `register_all` installs every built-in plugin into a registry using the
//! given configuration.

#![cfg(feature = "builtin")]

pub mod config;
pub mod required;

use anyhow::Context as _;

use crate::registry::PluginRegistry;
use crate::spec::PluginSpec;

pub use self::config::{BuiltinConfig, ConfigError, RequiredConfig};
pub use self::required::{required_plugin, required_plugin_with, REQUIRED_PLUGIN_ID};

/// Ids of all built-in plugins, sorted.
pub const BUILTIN_PLUGIN_IDS: &[&str] = &[REQUIRED_PLUGIN_ID];

pub(crate) const BUILTIN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Specs for every built-in plugin under the default configuration.
pub fn builtin_specs() -> Vec<PluginSpec> {
    vec![required::spec(&required_plugin())]
}

/// Register every built-in plugin.
pub fn register_all(registry: &mut PluginRegistry, config: &BuiltinConfig) -> anyhow::Result<()> {
    config.validate().context("invalid builtin plugin config")?;

    let required = required_plugin_with(&config.required);
    registry
        .register(required::spec(&required), required)
        .with_context(|| format!("failed to register {REQUIRED_PLUGIN_ID}"))?;
    Ok(())
}
