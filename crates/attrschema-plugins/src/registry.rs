//! Plugin registry and resolution.
//!
//! The registry stores plugin values next to their specs and resolves them by
//! id. Hosts use it to look plugins up by name when assembling schemas.
//!
//! Requirements:
//! - stable ordering for lookups and iteration
//! - clear errors for missing or duplicate plugins
//! - no global mutable state
//!
//! The registry never runs checks; it only stores metadata and shared values.

use std::collections::BTreeMap;
use std::sync::Arc;

use attrschema_core::plugin::Plugin;

use crate::spec::PluginSpec;

/// A plugin value plus its static spec.
#[derive(Debug, Clone)]
pub struct RegisteredPlugin {
    pub spec: PluginSpec,
    pub plugin: Arc<Plugin>,
}

/// A registry of plugins keyed by plugin id.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: BTreeMap<String, RegisteredPlugin>,
}

impl PluginRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns true if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Register a plugin value with its spec.
    ///
    /// Registration order does not affect iteration because the internal
    /// store is a `BTreeMap`.
    pub fn register(&mut self, spec: PluginSpec, plugin: Arc<Plugin>) -> anyhow::Result<()> {
        spec.validate()?;
        plugin.validate()?;

        if spec.id != plugin.id().as_str() {
            anyhow::bail!(
                "plugin spec id does not match plugin: spec={}, plugin={}",
                spec.id,
                plugin.id()
            );
        }
        if let Some(undeclared) = spec.options.iter().find(|o| !plugin.declares_option(o)) {
            anyhow::bail!(
                "plugin spec {} lists option `{undeclared}` the plugin does not declare",
                spec.id
            );
        }
        if self.plugins.contains_key(&spec.id) {
            anyhow::bail!("plugin id already registered: {}", spec.id);
        }

        tracing::debug!(plugin = %spec.id, version = %spec.version, "plugin registered");
        self.plugins
            .insert(spec.id.clone(), RegisteredPlugin { spec, plugin });
        Ok(())
    }

    /// Register a plugin, deriving its spec from the plugin value.
    pub fn register_plugin(
        &mut self,
        plugin: Arc<Plugin>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> anyhow::Result<()> {
        let spec = PluginSpec::new(plugin.id().as_str(), name, version).describe(&plugin);
        self.register(spec, plugin)
    }

    /// Get a registered plugin and its spec by id.
    pub fn get(&self, id: &str) -> Option<&RegisteredPlugin> {
        self.plugins.get(id)
    }

    /// Returns true if a plugin with this id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.plugins.contains_key(id)
    }

    /// Resolve a plugin by id, ready for adoption by a schema.
    pub fn resolve(&self, id: &str) -> anyhow::Result<Arc<Plugin>> {
        self.plugins
            .get(id)
            .map(|r| Arc::clone(&r.plugin))
            .ok_or_else(|| anyhow::anyhow!("plugin not found: {id}"))
    }

    /// Resolve several plugins, preserving the requested order.
    pub fn resolve_all<I, S>(&self, ids: I) -> anyhow::Result<Vec<Arc<Plugin>>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ids.into_iter().map(|id| self.resolve(id.as_ref())).collect()
    }

    /// Plugin ids in deterministic order.
    pub fn list_ids(&self) -> Vec<String> {
        self.plugins.keys().cloned().collect()
    }

    /// Plugin specs in deterministic id order.
    pub fn list(&self) -> Vec<PluginSpec> {
        self.plugins.values().map(|r| r.spec.clone()).collect()
    }

    /// Iterate over registered plugins in deterministic id order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &RegisteredPlugin)> {
        self.plugins.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plugin(id: &str) -> Arc<Plugin> {
        Plugin::new(id).option("flag").into_shared()
    }

    #[test]
    fn registry_register_and_resolve() {
        let mut reg = PluginRegistry::new();
        let spec = PluginSpec::new("test.one", "One", "0.1.0").option("flag");
        reg.register(spec, plugin("test.one")).unwrap();

        let p = reg.resolve("test.one").unwrap();
        assert_eq!(p.id().as_str(), "test.one");
        assert_eq!(reg.get("test.one").unwrap().spec.version, "0.1.0");
        assert!(reg.resolve("test.two").is_err());
        assert!(reg.contains("test.one"));
        assert!(!reg.contains("test.two"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut reg = PluginRegistry::new();
        reg.register_plugin(plugin("test.one"), "One", "0.1.0").unwrap();
        let err = reg
            .register_plugin(plugin("test.one"), "Again", "0.2.0")
            .unwrap_err();
        assert!(err.to_string().contains("already registered"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn spec_must_match_plugin() {
        let mut reg = PluginRegistry::new();
        let spec = PluginSpec::new("test.other", "Other", "0.1.0");
        assert!(reg.register(spec, plugin("test.one")).is_err());

        let spec = PluginSpec::new("test.one", "One", "0.1.0").option("nope");
        assert!(reg.register(spec, plugin("test.one")).is_err());
        assert!(reg.is_empty());
    }

    #[test]
    fn resolve_all_keeps_requested_order() {
        let mut reg = PluginRegistry::new();
        for id in ["test.b", "test.a", "test.c"] {
            reg.register_plugin(plugin(id), id, "0.1.0").unwrap();
        }
        let got = reg.resolve_all(["test.c", "test.a"]).unwrap();
        let ids: Vec<&str> = got.iter().map(|p| p.id().as_str()).collect();
        assert_eq!(ids, vec!["test.c", "test.a"]);
        assert_eq!(reg.list_ids(), vec!["test.a", "test.b", "test.c"]);
        assert!(reg.resolve_all(["test.a", "test.zzz"]).is_err());
    }
}
