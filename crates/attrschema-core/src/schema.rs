//! Schema declarations.
//!
//! A `Schema` describes one level of an attribute tree:
//! - ordered child slots, each holding its own `Schema`
//! - options (literal or computed), keyed by name
//! - attribute-local checks, run in declaration order
//! - adopted plugins, whose option defaults are merged in on adoption
//! - attribute-local helpers
//!
//! Schemas are declared through `SchemaBuilder` and frozen into an
//! `Arc<Schema>` by `build`. A built schema has no mutators, so every tree
//! materialized from it sees the same declaration.
//!
//! Derivation copies the base's plugins, options, child slots, checks and
//! helpers into a fresh builder. Later changes to the derived builder never
//! reach the base, and a built base can no longer change at all.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, OnceLock};

use serde_json::Value;

use crate::attribute::Attribute;
use crate::context::CheckContext;
use crate::errors::{SchemaError, SchemaResult};
use crate::option::{OptionValue, Options};
use crate::plugin::{HelperFn, Plugin};

/// Attribute-local check.
pub type CheckFn = Arc<dyn Fn(&mut Attribute) -> anyhow::Result<()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    /// Declared through a builder.
    Declared,
    /// Built-in schema for input keys with no declared slot.
    Unknown,
}

#[derive(Clone)]
pub struct Schema {
    kind: SchemaKind,
    plugins: Vec<Arc<Plugin>>,
    options: Options,
    children: Vec<(String, Arc<Schema>)>,
    checks: Vec<CheckFn>,
    helpers: BTreeMap<String, HelperFn>,
}

impl Schema {
    fn empty(kind: SchemaKind) -> Self {
        Self {
            kind,
            plugins: Vec::new(),
            options: Options::new(),
            children: Vec::new(),
            checks: Vec::new(),
            helpers: BTreeMap::new(),
        }
    }

    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Declare a schema from scratch.
    pub fn define<F>(body: F) -> SchemaResult<Arc<Schema>>
    where
        F: FnOnce(&mut SchemaBuilder),
    {
        let mut b = SchemaBuilder::new();
        body(&mut b);
        b.build()
    }

    /// Declare a schema derived from `base`.
    pub fn extend<F>(base: &Schema, body: F) -> SchemaResult<Arc<Schema>>
    where
        F: FnOnce(&mut SchemaBuilder),
    {
        let mut b = SchemaBuilder::derive(base)?;
        body(&mut b);
        b.build()
    }

    /// The shared zero-slot schema used for undeclared input keys.
    pub fn unknown() -> Arc<Schema> {
        static UNKNOWN: OnceLock<Arc<Schema>> = OnceLock::new();
        Arc::clone(UNKNOWN.get_or_init(|| Arc::new(Schema::empty(SchemaKind::Unknown))))
    }

    pub fn kind(&self) -> SchemaKind {
        self.kind
    }

    pub fn is_unknown(&self) -> bool {
        self.kind == SchemaKind::Unknown
    }

    /// Adopted plugins in adoption order.
    pub fn plugins(&self) -> &[Arc<Plugin>] {
        &self.plugins
    }

    pub fn has_plugin(&self, id: &str) -> bool {
        self.plugins.iter().any(|p| p.id().as_str() == id)
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.options.get(name)
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    pub fn literal_option(&self, name: &str) -> Option<&Value> {
        self.option(name).and_then(OptionValue::as_literal)
    }

    /// Child slots in declaration order.
    pub fn children(&self) -> impl Iterator<Item = (&str, &Arc<Schema>)> {
        self.children.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn child(&self, name: &str) -> Option<&Arc<Schema>> {
        self.children.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(|(n, _)| n.as_str())
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn checks(&self) -> &[CheckFn] {
        &self.checks
    }

    /// Look up a helper: this schema's own helpers first, then adopted plugins in order.
    pub fn helper(&self, name: &str) -> Option<&HelperFn> {
        self.helpers
            .get(name)
            .or_else(|| self.plugins.iter().find_map(|p| p.helper_fn(name)))
    }

    /// Build an attribute tree for `value`. No checks are run.
    pub fn materialize(self: &Arc<Self>, value: Value) -> Attribute {
        Attribute::materialize(self, value)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("kind", &self.kind)
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.id().as_str()).collect::<Vec<_>>(),
            )
            .field("options", &self.options)
            .field("children", &self.children)
            .field("checks", &self.checks.len())
            .field("helpers", &self.helpers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Parameters for declaring one child slot.
///
/// Without a base, the child is a fresh declaration that adopts every plugin
/// the parent has adopted so far. With a base, the child is derived from it and
/// keeps only the plugins the base was built with.
///
/// Options are applied before the body runs, so the body wins on conflicts.
pub struct AttributeDef<'a> {
    name: String,
    base: Option<Arc<Schema>>,
    options: Vec<(String, OptionValue)>,
    body: Option<Box<dyn FnOnce(&mut SchemaBuilder) + 'a>>,
}

impl<'a> AttributeDef<'a> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: None,
            options: Vec::new(),
            body: None,
        }
    }

    pub fn base(mut self, base: &Arc<Schema>) -> Self {
        self.base = Some(Arc::clone(base));
        self
    }

    pub fn option(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.options.push((name.into(), value.into()));
        self
    }

    pub fn body<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut SchemaBuilder) + 'a,
    {
        self.body = Some(Box::new(f));
        self
    }
}

/// Mutable declaration state for one schema.
///
/// Errors are deferred: the first declaration error is kept and returned by
/// `build`, and later declarations on the same builder are ignored.
#[derive(Default)]
pub struct SchemaBuilder {
    plugins: Vec<Arc<Plugin>>,
    options: Options,
    children: Vec<(String, Arc<Schema>)>,
    declared: BTreeSet<String>,
    checks: Vec<CheckFn>,
    helpers: BTreeMap<String, HelperFn>,
    error: Option<SchemaError>,
}

impl fmt::Debug for SchemaBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaBuilder")
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.id().as_str()).collect::<Vec<_>>(),
            )
            .field("options", &self.options)
            .field("children", &self.children)
            .field("checks", &self.checks.len())
            .field("helpers", &self.helpers.keys().collect::<Vec<_>>())
            .field("error", &self.error)
            .finish()
    }
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from independent copies of `base`'s declaration.
    pub fn derive(base: &Schema) -> SchemaResult<Self> {
        if base.is_unknown() {
            return Err(SchemaError::definition(
                "cannot derive from the unknown-attribute schema",
            ));
        }
        Ok(Self {
            plugins: base.plugins.clone(),
            options: base.options.clone(),
            children: base.children.clone(),
            declared: BTreeSet::new(),
            checks: base.checks.clone(),
            helpers: base.helpers.clone(),
            error: None,
        })
    }

    fn fail(&mut self, e: SchemaError) {
        if self.error.is_none() {
            self.error = Some(e);
        }
    }

    /// Adopt a plugin. Adopting the same plugin id twice is a no-op.
    pub fn plugin(&mut self, plugin: Arc<Plugin>) -> &mut Self {
        if let Err(e) = plugin.validate() {
            self.fail(e);
            return self;
        }
        if self.plugins.iter().any(|p| p.id() == plugin.id()) {
            return self;
        }
        for (name, default) in plugin.defaults() {
            self.options.insert(name.to_string(), default.clone());
        }
        self.plugins.push(plugin);
        self
    }

    pub fn plugins<I>(&mut self, plugins: I) -> &mut Self
    where
        I: IntoIterator<Item = Arc<Plugin>>,
    {
        for p in plugins {
            self.plugin(p);
        }
        self
    }

    /// Set an option. A `null` value is ignored and never clears an existing option.
    pub fn option(&mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> &mut Self {
        let value = value.into();
        if !value.is_null() {
            self.options.insert(name.into(), value);
        }
        self
    }

    pub fn option_fn<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&Attribute, &CheckContext) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.option(name, OptionValue::computed(f))
    }

    pub fn visible(&mut self, visible: bool) -> &mut Self {
        self.option(crate::options::VISIBLE, visible)
    }

    pub fn visible_if<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Attribute, &CheckContext) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        self.option_fn(crate::options::VISIBLE, move |attr, ctx| {
            f(attr, ctx).map(Value::Bool)
        })
    }

    pub fn check<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Attribute) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.checks.push(Arc::new(f));
        self
    }

    pub fn helper<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&mut Attribute, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.helpers.insert(name.into(), Arc::new(f));
        self
    }

    pub fn attribute(&mut self, name: impl Into<String>) -> &mut Self {
        self.define_attribute(AttributeDef::new(name))
    }

    pub fn attribute_with<F>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: FnOnce(&mut SchemaBuilder),
    {
        self.define_attribute(AttributeDef::new(name).body(body))
    }

    pub fn attribute_from(&mut self, name: impl Into<String>, base: &Arc<Schema>) -> &mut Self {
        self.define_attribute(AttributeDef::new(name).base(base))
    }

    /// Declare a child slot.
    ///
    /// Redeclaring a slot inherited from a base replaces it in place; declaring
    /// the same name twice in one builder is an error.
    pub fn define_attribute(&mut self, def: AttributeDef<'_>) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        match self.build_child(def) {
            Ok((name, schema)) => {
                match self.children.iter_mut().find(|(n, _)| *n == name) {
                    Some(slot) => slot.1 = schema,
                    None => self.children.push((name.clone(), schema)),
                }
                self.declared.insert(name);
            }
            Err(e) => self.fail(e),
        }
        self
    }

    fn build_child(&self, def: AttributeDef<'_>) -> SchemaResult<(String, Arc<Schema>)> {
        let AttributeDef {
            name,
            base,
            options,
            body,
        } = def;

        if name.trim().is_empty() {
            return Err(SchemaError::definition("attribute name is empty"));
        }
        if self.declared.contains(&name) {
            return Err(SchemaError::definition(format!(
                "attribute '{name}' is declared twice"
            )));
        }

        let mut child = match &base {
            Some(b) => SchemaBuilder::derive(b)
                .map_err(|e| SchemaError::definition(format!("attribute '{name}': {e}")))?,
            None => {
                let mut c = SchemaBuilder::new();
                c.plugins(self.plugins.iter().cloned());
                c
            }
        };

        for (k, v) in options {
            child.option(k, v);
        }
        if let Some(body) = body {
            body(&mut child);
        }

        let schema = child.build()?;
        Ok((name, schema))
    }

    pub fn build(self) -> SchemaResult<Arc<Schema>> {
        if let Some(e) = self.error {
            return Err(e);
        }
        Ok(Arc::new(Schema {
            kind: SchemaKind::Declared,
            plugins: self.plugins,
            options: self.options,
            children: self.children,
            checks: self.checks,
            helpers: self.helpers,
        }))
    }
}
