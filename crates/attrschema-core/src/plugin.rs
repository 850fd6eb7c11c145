//! Plugin capability values.
//!
//! A plugin is a stateless template describing:
//! - named options, each with an optional default
//! - checks run against every attribute that adopts the plugin
//! - helper functions callable on adopting attributes
//!
//! Plugins are shared as `Arc<Plugin>`; the same value can be adopted by any
//! number of unrelated schemas. Identity is the plugin id.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::attribute::Attribute;
use crate::errors::{SchemaError, SchemaResult};
use crate::option::{OptionValue, ResolvedOptions};

/// Check contributed by a plugin. Receives only the options it declared.
pub type PluginCheckFn =
    Arc<dyn Fn(&mut Attribute, &ResolvedOptions) -> anyhow::Result<()> + Send + Sync>;

/// Helper callable on an attribute by name.
pub type HelperFn =
    Arc<dyn Fn(&mut Attribute, &[Value]) -> anyhow::Result<Value> + Send + Sync>;

/// Stable plugin identifier.
///
/// Format recommendations:
/// - lowercase ASCII
/// - segments separated by dots
/// - example: "builtin.required"
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PluginId(pub String);

impl PluginId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PluginOption {
    pub name: String,
    pub default: Option<OptionValue>,
}

#[derive(Clone)]
pub struct PluginCheck {
    requires: Vec<String>,
    func: PluginCheckFn,
}

impl PluginCheck {
    /// Option names this check wants to receive.
    pub fn requires(&self) -> &[String] {
        &self.requires
    }

    pub(crate) fn call(&self, attr: &mut Attribute, opts: &ResolvedOptions) -> anyhow::Result<()> {
        (self.func)(attr, opts)
    }
}

impl fmt::Debug for PluginCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginCheck")
            .field("requires", &self.requires)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct Plugin {
    id: PluginId,
    options: Vec<PluginOption>,
    checks: Vec<PluginCheck>,
    helpers: BTreeMap<String, HelperFn>,
}

impl Plugin {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: PluginId::new(id),
            options: Vec::new(),
            checks: Vec::new(),
            helpers: BTreeMap::new(),
        }
    }

    /// Declare an option without a default.
    pub fn option(self, name: impl Into<String>) -> Self {
        self.declare_option(name.into(), None)
    }

    /// Declare an option with a default. A `null` default counts as no default.
    pub fn option_with_default(self, name: impl Into<String>, default: impl Into<OptionValue>) -> Self {
        let default = default.into();
        let default = if default.is_null() { None } else { Some(default) };
        self.declare_option(name.into(), default)
    }

    fn declare_option(mut self, name: String, default: Option<OptionValue>) -> Self {
        match self.options.iter_mut().find(|o| o.name == name) {
            Some(existing) => existing.default = default,
            None => self.options.push(PluginOption { name, default }),
        }
        self
    }

    /// Append a check. `requires` lists the option names passed to it.
    pub fn check<I, S, F>(mut self, requires: I, f: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&mut Attribute, &ResolvedOptions) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.checks.push(PluginCheck {
            requires: requires.into_iter().map(Into::into).collect(),
            func: Arc::new(f),
        });
        self
    }

    pub fn helper<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Attribute, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.helpers.insert(name.into(), Arc::new(f));
        self
    }

    pub fn id(&self) -> &PluginId {
        &self.id
    }

    pub fn options(&self) -> &[PluginOption] {
        &self.options
    }

    pub fn option_names(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(|o| o.name.as_str())
    }

    pub fn declares_option(&self, name: &str) -> bool {
        self.options.iter().any(|o| o.name == name)
    }

    /// Options that carry a default, in declaration order.
    pub fn defaults(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.options
            .iter()
            .filter_map(|o| o.default.as_ref().map(|d| (o.name.as_str(), d)))
    }

    pub fn checks(&self) -> &[PluginCheck] {
        &self.checks
    }

    pub fn helper_fn(&self, name: &str) -> Option<&HelperFn> {
        self.helpers.get(name)
    }

    pub fn helper_names(&self) -> impl Iterator<Item = &str> {
        self.helpers.keys().map(String::as_str)
    }

    /// Validate basic quality constraints on the plugin id.
    pub fn validate(&self) -> SchemaResult<()> {
        let id = self.id.as_str();
        if id.trim().is_empty() {
            return Err(SchemaError::definition("plugin id is empty"));
        }
        if !id.is_ascii() {
            return Err(SchemaError::definition(format!("plugin id must be ASCII: {id}")));
        }
        Ok(())
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("id", &self.id)
            .field("options", &self.options)
            .field("checks", &self.checks.len())
            .field("helpers", &self.helpers.keys().collect::<Vec<_>>())
            .finish()
    }
}
