//! The check pipeline.
//!
//! Each attribute is checked at most once, in these stages:
//! 1. visibility: the `visible` option, literal or predicate
//! 2. plugin checks: per adopted plugin, in adoption order
//! 3. local checks: the schema's own checks, in declaration order
//! 4. children, each checked independently of this attribute's outcome
//!
//! A hidden attribute skips stages 2 and 3 but still recurses. A plugin check
//! that hides the attribute stops every remaining plugin and local check.
//!
//! A plugin whose declared options are all absent from the schema does not
//! apply. Plugins that declare no options always apply.
//!
//! Any error from stages 1-3 aborts the run and is reported as
//! `SchemaError::CheckFailed` for this attribute. Failures below propagate
//! unchanged, and siblings after a failing child are left unchecked.

use anyhow::Context as _;
use serde_json::Value;

use crate::attribute::Attribute;
use crate::context::CheckContext;
use crate::errors::{SchemaError, SchemaResult};
use crate::option::{truthy, OptionValue, ResolvedOptions};
use crate::schema::Schema;

impl Attribute {
    /// Check this attribute and its subtree with an empty context.
    pub fn check(&mut self) -> SchemaResult<()> {
        self.check_with(&CheckContext::default())
    }

    pub fn check_with(&mut self, ctx: &CheckContext) -> SchemaResult<()> {
        if self.checked {
            return Ok(());
        }
        self.checked = true;

        let schema = std::sync::Arc::clone(&self.schema);
        if let Err(e) = self.run_stages(&schema, ctx) {
            let path = self.display_path();
            tracing::warn!(path = %path, error = %format!("{e:#}"), "attribute check failed");
            return Err(SchemaError::check_failed(path, e));
        }

        for child in &mut self.children {
            child.check_with(ctx)?;
        }

        tracing::debug!(
            path = %self.display_path(),
            issues = self.issues.len(),
            visible = self.visible,
            "attribute checked"
        );
        Ok(())
    }

    fn run_stages(&mut self, schema: &Schema, ctx: &CheckContext) -> anyhow::Result<()> {
        self.resolve_visibility(schema, ctx)
            .context("visibility predicate failed")?;
        if !self.visible {
            tracing::debug!(path = %self.display_path(), "attribute hidden; skipping checks");
            return Ok(());
        }

        self.run_plugin_checks(schema, ctx)?;
        if !self.visible {
            return Ok(());
        }

        self.run_local_checks(schema)
    }

    fn resolve_visibility(&mut self, schema: &Schema, ctx: &CheckContext) -> anyhow::Result<()> {
        match schema.option(crate::options::VISIBLE) {
            Some(OptionValue::Literal(Value::Bool(visible))) => self.visible = *visible,
            Some(OptionValue::Computed(f)) => {
                let v = f(&*self, ctx)?;
                self.visible = truthy(&v);
            }
            _ => {}
        }
        Ok(())
    }

    fn run_plugin_checks(&mut self, schema: &Schema, ctx: &CheckContext) -> anyhow::Result<()> {
        for plugin in schema.plugins() {
            if !plugin.options().is_empty() && !plugin.option_names().any(|n| schema.has_option(n)) {
                tracing::trace!(
                    plugin = %plugin.id(),
                    path = %self.display_path(),
                    "no plugin options set; skipping plugin"
                );
                continue;
            }

            for check in plugin.checks() {
                if !self.visible {
                    return Ok(());
                }
                let opts = self
                    .resolve_options(schema, check.requires(), ctx)
                    .with_context(|| format!("resolving options for plugin '{}'", plugin.id()))?;
                check
                    .call(self, &opts)
                    .with_context(|| format!("check from plugin '{}' failed", plugin.id()))?;
            }
        }
        Ok(())
    }

    fn resolve_options(
        &self,
        schema: &Schema,
        names: &[String],
        ctx: &CheckContext,
    ) -> anyhow::Result<ResolvedOptions> {
        let mut out = ResolvedOptions::new();
        for name in names {
            if let Some(v) = schema.option(name) {
                out.insert(name.clone(), v.resolve(self, ctx)?);
            }
        }
        Ok(out)
    }

    fn run_local_checks(&mut self, schema: &Schema) -> anyhow::Result<()> {
        for (idx, check) in schema.checks().iter().enumerate() {
            check(&mut *self).with_context(|| format!("local check #{idx} failed"))?;
        }
        Ok(())
    }
}
