//! Plugin specification types.
//!
//! A `PluginSpec` is the static, serializable description of a plugin:
//! - identity (id, display name, version)
//! - the option names it declares and the helpers it exposes
//! - free-form metadata for catalogs and UIs
//!
//! Specs are data-only and never run checks.

use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use attrschema_core::plugin::Plugin;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSpec {
    /// Stable plugin id. Must match the id of the registered `Plugin`.
    pub id: String,

    /// Human-readable display name.
    pub name: String,

    /// Plugin version string (host interprets).
    pub version: String,

    /// Option names the plugin declares, in declaration order.
    #[serde(default)]
    pub options: Vec<String>,

    /// Helper names the plugin exposes, sorted.
    #[serde(default)]
    pub helpers: Vec<String>,

    #[serde(default)]
    pub meta: BTreeMap<String, String>,
}

impl PluginSpec {
    pub fn new(id: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            options: Vec::new(),
            helpers: Vec::new(),
            meta: BTreeMap::new(),
        }
    }

    /// Fill option and helper names from a plugin value.
    pub fn describe(mut self, plugin: &Plugin) -> Self {
        self.options = plugin.option_names().map(str::to_string).collect();
        self.helpers = plugin.helper_names().map(str::to_string).collect();
        self
    }

    pub fn option(mut self, name: impl Into<String>) -> Self {
        self.options.push(name.into());
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn declares_option(&self, name: &str) -> bool {
        self.options.iter().any(|o| o == name)
    }

    /// Validate spec for basic quality constraints.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            anyhow::bail!("plugin id is empty");
        }
        if !self.id.is_ascii() {
            anyhow::bail!("plugin id must be ASCII");
        }
        if self.name.trim().is_empty() {
            anyhow::bail!("plugin name is empty");
        }
        if self.version.trim().is_empty() {
            anyhow::bail!("plugin version is empty");
        }
        Ok(())
    }
}
