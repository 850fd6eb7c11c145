//! Built-in `required` plugin.
//!
//! Options:
//! - `required`: whether the attribute must carry a value (default from config)
//! - `required_message`: error template; `{full_path}` and `{name}` are substituted
//!
//! The check only looks at leaves. An attribute with children is a container
//! and is never flagged itself. A leaf is unset when its slot was missing from
//! the input or its value is `null`.

#![cfg(feature = "builtin")]

use std::sync::Arc;

use attrschema_core::attribute::Attribute;
use attrschema_core::plugin::Plugin;

use crate::builtin::config::RequiredConfig;
use crate::spec::PluginSpec;

pub const REQUIRED_PLUGIN_ID: &str = "builtin.required";

pub const OPT_REQUIRED: &str = "required";
pub const OPT_REQUIRED_MESSAGE: &str = "required_message";

/// The plugin under the default configuration.
pub fn required_plugin() -> Arc<Plugin> {
    required_plugin_with(&RequiredConfig::default())
}

pub fn required_plugin_with(config: &RequiredConfig) -> Arc<Plugin> {
    let fallback = config.message.clone();
    Plugin::new(REQUIRED_PLUGIN_ID)
        .option_with_default(OPT_REQUIRED, config.default_required)
        .option_with_default(OPT_REQUIRED_MESSAGE, config.message.as_str())
        .check([OPT_REQUIRED, OPT_REQUIRED_MESSAGE], move |attr, opts| {
            if !opts.flag(OPT_REQUIRED) || attr.has_children() || is_set(attr) {
                return Ok(());
            }
            let template = opts.str(OPT_REQUIRED_MESSAGE).unwrap_or(&fallback);
            let message = render_message(template, attr);
            tracing::trace!(path = %attr.display_path(), "required value missing");
            attr.add_error(message);
            Ok(())
        })
        .into_shared()
}

pub(crate) fn spec(plugin: &Plugin) -> PluginSpec {
    PluginSpec::new(REQUIRED_PLUGIN_ID, "Required value", super::BUILTIN_VERSION)
        .describe(plugin)
        .meta("category", "presence")
}

fn is_set(attr: &Attribute) -> bool {
    !attr.is_missing() && !attr.value().is_null()
}

fn render_message(template: &str, attr: &Attribute) -> String {
    template
        .replace("{full_path}", &attr.full_path())
        .replace("{name}", attr.name().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use attrschema_core::schema::{AttributeDef, Schema};
    use serde_json::json;

    fn errors(attr: &Attribute) -> Vec<&str> {
        attr.issues()
            .iter()
            .filter(|i| i.is_error())
            .map(|i| i.message.as_str())
            .collect()
    }

    #[test]
    fn missing_leaf_gets_an_error() {
        let d = Schema::define(|s| {
            s.plugin(required_plugin());
            s.attribute("name");
        })
        .unwrap();
        let mut tree = d.materialize(json!({}));
        tree.check().unwrap();

        assert_eq!(errors(&tree["name"]), vec!["Required value for 'name' is not set."]);
        assert!(errors(&tree).is_empty());
        assert!(!tree.is_valid());
    }

    #[test]
    fn null_leaf_gets_an_error_and_set_leaf_does_not() {
        let d = Schema::define(|s| {
            s.plugin(required_plugin());
            s.attribute("a");
            s.attribute("b");
        })
        .unwrap();
        let mut tree = d.materialize(json!({ "a": null, "b": false }));
        tree.check().unwrap();
        assert_eq!(errors(&tree["a"]).len(), 1);
        assert!(errors(&tree["b"]).is_empty());
    }

    #[test]
    fn optional_and_container_attributes_are_skipped() {
        let d = Schema::define(|s| {
            s.plugin(required_plugin());
            s.define_attribute(AttributeDef::new("nickname").option(OPT_REQUIRED, false));
            s.attribute_with("address", |a| {
                a.attribute("street");
            });
        })
        .unwrap();
        let mut tree = d.materialize(json!({}));
        tree.check().unwrap();

        assert!(errors(&tree["nickname"]).is_empty());
        assert!(errors(&tree["address"]).is_empty());
        assert_eq!(
            errors(&tree["address"]["street"]),
            vec!["Required value for 'address.street' is not set."]
        );
    }

    #[test]
    fn custom_message_template() {
        let d = Schema::define(|s| {
            s.plugin(required_plugin());
            s.define_attribute(
                AttributeDef::new("port").option(OPT_REQUIRED_MESSAGE, "{name} missing at {full_path}"),
            );
        })
        .unwrap();
        let mut tree = d.materialize(json!({}));
        tree.check().unwrap();
        assert_eq!(errors(&tree["port"]), vec!["port missing at port"]);
    }

    #[test]
    fn config_controls_defaults() {
        let cfg = RequiredConfig {
            default_required: false,
            message: "missing: {full_path}".to_string(),
        };
        let d = Schema::define(|s| {
            s.plugin(required_plugin_with(&cfg));
            s.attribute("a");
            s.define_attribute(AttributeDef::new("b").option(OPT_REQUIRED, true));
        })
        .unwrap();
        let mut tree = d.materialize(json!({}));
        tree.check().unwrap();
        assert!(errors(&tree["a"]).is_empty());
        assert_eq!(errors(&tree["b"]), vec!["missing: b"]);
    }

    #[test]
    fn spec_lists_declared_options() {
        let s = spec(&required_plugin());
        assert_eq!(s.id, REQUIRED_PLUGIN_ID);
        assert_eq!(s.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(s.options, vec![OPT_REQUIRED, OPT_REQUIRED_MESSAGE]);
        s.validate().unwrap();
    }
}
