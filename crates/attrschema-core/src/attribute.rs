//! Attribute trees.
//!
//! An `Attribute` is one node of a tree materialized from a schema and an
//! input value. Materialization is eager and pure: every declared slot gets a
//! node, and so does every input key without a declared slot (those use the
//! built-in unknown schema and never grow children of their own).
//!
//! Child order is declared slots first, in declaration order, followed by the
//! remaining input keys in input order. Keys are plain strings.
//!
//! Nothing is checked during materialization. Issues and visibility only
//! change when `check` runs (see `crate::check`).

use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};
use std::sync::Arc;

use anyhow::anyhow;
use serde_json::{Map, Value};

use crate::issue::{Issue, IssueKind};
use crate::option::OptionValue;
use crate::schema::Schema;
use crate::{PATH_SEPARATOR, ROOT_MARKER};

pub struct Attribute {
    pub(crate) schema: Arc<Schema>,
    pub(crate) path: Vec<String>,
    pub(crate) value: Value,
    pub(crate) missing: bool,
    pub(crate) children: Vec<Attribute>,
    pub(crate) visible: bool,
    pub(crate) issues: Vec<Issue>,
    pub(crate) checked: bool,
}

impl Attribute {
    /// Build the tree for `value` rooted at an empty path.
    pub fn materialize(schema: &Arc<Schema>, value: Value) -> Self {
        Self::build(schema, value, Vec::new(), false)
    }

    fn build(schema: &Arc<Schema>, value: Value, path: Vec<String>, missing: bool) -> Self {
        let mut children = Vec::new();

        if schema.has_children() {
            let input = value.as_object();

            for (name, child_schema) in schema.children() {
                let (child_value, child_missing) = match input.and_then(|m| m.get(name)) {
                    Some(v) => (v.clone(), false),
                    None => (Value::Object(Map::new()), true),
                };
                children.push(Self::build(
                    child_schema,
                    child_value,
                    child_path(&path, name),
                    child_missing,
                ));
            }

            if let Some(map) = input {
                let unknown = Schema::unknown();
                for (key, v) in map.iter().filter(|(k, _)| schema.child(k).is_none()) {
                    children.push(Self::build(&unknown, v.clone(), child_path(&path, key), false));
                }
            }

            tracing::trace!(
                path = %display_path(&path),
                children = children.len(),
                "materialized attribute"
            );
        }

        Self {
            schema: Arc::clone(schema),
            path,
            value,
            missing,
            children,
            visible: true,
            issues: Vec::new(),
            checked: false,
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Name segments from the root. Empty for the root.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Last path segment; `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }

    pub fn full_path(&self) -> String {
        self.path.join(PATH_SEPARATOR)
    }

    /// `full_path`, or the root marker for the root.
    pub fn display_path(&self) -> String {
        display_path(&self.path)
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// True when the slot was declared but the input had no such key.
    pub fn is_missing(&self) -> bool {
        self.missing
    }

    pub fn is_unknown(&self) -> bool {
        self.schema.is_unknown()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.schema.option(name)
    }

    pub fn children(&self) -> impl Iterator<Item = &Attribute> {
        self.children.iter()
    }

    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.children.iter().filter_map(Attribute::name)
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.children.iter().find(|c| c.name() == Some(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.children.iter_mut().find(|c| c.name() == Some(name))
    }

    /// Walk down through nested children.
    pub fn get_path(&self, names: &[&str]) -> Option<&Attribute> {
        names.iter().try_fold(self, |node, name| node.get(name))
    }

    /// Children keyed by name.
    pub fn fields(&self) -> BTreeMap<&str, &Attribute> {
        self.children
            .iter()
            .filter_map(|c| c.name().map(|n| (n, c)))
            .collect()
    }

    /// Children for the requested keys, or all children when `keys` is `None`.
    /// Requested keys without a child map to `None`.
    pub fn deconstruct_keys(&self, keys: Option<&[&str]>) -> BTreeMap<String, Option<&Attribute>> {
        match keys {
            Some(keys) => keys.iter().map(|k| (k.to_string(), self.get(k))).collect(),
            None => self
                .fields()
                .into_iter()
                .map(|(k, v)| (k.to_string(), Some(v)))
                .collect(),
        }
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn add_issue(&mut self, kind: IssueKind, message: impl Into<String>) {
        let name = self.name().map(str::to_string);
        self.issues.push(Issue::new(kind, name, message));
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.add_issue(IssueKind::Error, message);
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.add_issue(IssueKind::Warning, message);
    }

    pub fn add_note(&mut self, message: impl Into<String>) {
        self.add_issue(IssueKind::Note, message);
    }

    fn has_kind(&self, kind: IssueKind) -> bool {
        self.visible && self.issues.iter().any(|i| i.kind == kind)
    }

    /// No errors here and, when visible, none anywhere below.
    /// Hidden attributes are always valid.
    pub fn is_valid(&self) -> bool {
        if !self.visible {
            return true;
        }
        if self.issues.iter().any(Issue::is_error) {
            return false;
        }
        self.children.iter().all(Attribute::is_valid)
    }

    pub fn has_errors(&self) -> bool {
        self.has_kind(IssueKind::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.has_kind(IssueKind::Warning)
    }

    pub fn has_notes(&self) -> bool {
        self.has_kind(IssueKind::Note)
    }

    pub fn has_issues(&self) -> bool {
        self.visible && !self.issues.is_empty()
    }

    /// Call a helper declared on this attribute's schema or one of its plugins.
    pub fn call_helper(&mut self, name: &str, args: &[Value]) -> anyhow::Result<Value> {
        let schema = Arc::clone(&self.schema);
        let helper = schema.helper(name).ok_or_else(|| {
            anyhow!("no helper `{name}` on attribute '{}'", self.display_path())
        })?;
        helper(self, args)
    }
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("path", &self.path)
            .field("value", &self.value)
            .field("unknown", &self.is_unknown())
            .field("visible", &self.visible)
            .field("issues", &self.issues)
            .field("children", &self.children)
            .finish()
    }
}

impl Index<&str> for Attribute {
    type Output = Attribute;

    fn index(&self, name: &str) -> &Attribute {
        match self.get(name) {
            Some(child) => child,
            None => panic!("no attribute '{name}' under '{}'", self.display_path()),
        }
    }
}

impl IndexMut<&str> for Attribute {
    fn index_mut(&mut self, name: &str) -> &mut Attribute {
        let parent = self.display_path();
        match self.get_mut(name) {
            Some(child) => child,
            None => panic!("no attribute '{name}' under '{parent}'"),
        }
    }
}

fn child_path(parent: &[String], name: &str) -> Vec<String> {
    let mut p = Vec::with_capacity(parent.len() + 1);
    p.extend_from_slice(parent);
    p.push(name.to_string());
    p
}

fn display_path(path: &[String]) -> String {
    if path.is_empty() {
        ROOT_MARKER.to_string()
    } else {
        path.join(PATH_SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn schema() -> Arc<Schema> {
        Schema::define(|s| {
            s.attribute("symbol_key");
            s.attribute_with("nested_section", |a| {
                a.attribute("nested_key");
            });
        })
        .unwrap()
    }

    #[test]
    fn path_of_attribute() {
        let tree = schema().materialize(json!({}));
        assert_eq!(tree["symbol_key"].path(), ["symbol_key".to_string()]);
        assert_eq!(
            tree["nested_section"]["nested_key"].path(),
            ["nested_section".to_string(), "nested_key".to_string()]
        );
    }

    #[test]
    fn full_path_and_name() {
        let tree = schema().materialize(json!({}));
        let nested = &tree["nested_section"]["nested_key"];
        assert_eq!(nested.full_path(), "nested_section.nested_key");
        assert_eq!(nested.name(), Some("nested_key"));
        assert_eq!(tree["symbol_key"].full_path(), "symbol_key");
    }

    #[test]
    fn root_has_no_name() {
        let tree = schema().materialize(json!({}));
        assert!(tree.is_root());
        assert_eq!(tree.name(), None);
        assert_eq!(tree.full_path(), "");
        assert_eq!(tree.display_path(), ROOT_MARKER);
    }

    #[test]
    fn missing_slots_get_empty_mapping() {
        let tree = schema().materialize(json!({ "symbol_key": null }));
        let symbol = &tree["symbol_key"];
        assert_eq!(symbol.value(), &Value::Null);
        assert!(!symbol.is_missing());

        let section = &tree["nested_section"];
        assert_eq!(section.value(), &json!({}));
        assert!(section.is_missing());
        assert!(section["nested_key"].is_missing());
    }

    #[test]
    fn unknown_keys_become_unknown_attributes() {
        let tree = schema().materialize(json!({
            "symbol_key": "symbol value",
            "unknown_key": "some value",
            "unknown_section": {
                "unknown_nested_key": "other value",
                "unknown_nested_section": { "k": "other value" }
            }
        }));

        assert!(!tree["symbol_key"].is_unknown());
        let unknown = &tree["unknown_key"];
        assert!(unknown.is_unknown());
        assert_eq!(unknown.value(), &json!("some value"));

        let section = &tree["unknown_section"];
        assert!(section.is_unknown());
        assert!(!section.has_children());
        assert_eq!(section.value()["unknown_nested_section"]["k"], "other value");
    }

    #[test]
    fn children_follow_declaration_then_input_order() {
        let tree = schema().materialize(json!({
            "zeta": 1,
            "nested_section": {},
            "alpha": 2
        }));
        let names: Vec<&str> = tree.child_names().collect();
        assert_eq!(names, vec!["symbol_key", "nested_section", "zeta", "alpha"]);
    }

    #[test]
    fn scalar_under_container_keeps_raw_value() {
        let tree = schema().materialize(json!({ "nested_section": 5 }));
        let section = &tree["nested_section"];
        assert_eq!(section.value(), &json!(5));
        assert!(section["nested_key"].is_missing());
    }

    #[test]
    fn nested_values_follow_input_shape() {
        let d = Schema::define(|s| {
            s.attribute_with("a", |a| {
                a.attribute_with("b", |b| {
                    b.attribute("c");
                });
            });
        })
        .unwrap();
        let tree = d.materialize(json!({ "a": { "b": { "c": "v" } } }));
        let c = tree.get_path(&["a", "b", "c"]).unwrap();
        assert_eq!(c.full_path(), "a.b.c");
        assert_eq!(c.value(), &json!("v"));
        assert_eq!(tree["a"].value(), &json!({ "b": { "c": "v" } }));
    }

    #[test]
    fn deconstruct_keys_exposes_children() {
        let tree = schema().materialize(json!({ "symbol_key": "s", "other": 1 }));

        let all = tree.deconstruct_keys(None);
        assert_eq!(all.len(), 3);
        assert_eq!(all["symbol_key"].map(Attribute::value), Some(&json!("s")));

        let some = tree.deconstruct_keys(Some(&["other", "absent"]));
        assert_eq!(some["other"].map(Attribute::value), Some(&json!(1)));
        assert!(some["absent"].is_none());

        let fields = tree.fields();
        assert!(fields["other"].is_unknown());
    }

    #[test]
    fn fresh_tree_has_default_state() {
        let tree = schema().materialize(json!({}));
        assert!(tree.is_visible());
        assert!(!tree.is_checked());
        assert!(tree.issues().is_empty());
        assert!(tree.is_valid());
        assert!(!tree.has_issues());
    }

    #[test]
    fn issue_queries_respect_visibility() {
        let mut tree = schema().materialize(json!({}));
        let attr = &mut tree["symbol_key"];
        attr.add_error("bad");
        attr.add_warning("meh");
        attr.add_note("fyi");
        assert!(attr.has_errors() && attr.has_warnings() && attr.has_notes());
        assert_eq!(attr.issues()[0].name.as_deref(), Some("symbol_key"));
        assert!(!tree.is_valid());

        tree["symbol_key"].set_visible(false);
        let attr = &tree["symbol_key"];
        assert!(attr.is_valid());
        assert!(!attr.has_errors() && !attr.has_warnings() && !attr.has_notes());
        assert!(!attr.has_issues());
        assert!(tree.is_valid());
    }

    #[test]
    fn missing_helper_is_an_error() {
        let mut tree = schema().materialize(json!({}));
        let err = tree["symbol_key"].call_helper("nope", &[]).unwrap_err();
        assert!(err.to_string().contains("symbol_key"));
    }

    #[test]
    #[should_panic(expected = "no attribute 'nope'")]
    fn index_panics_on_missing_child() {
        let tree = schema().materialize(json!({}));
        let _ = &tree["nope"];
    }

    proptest! {
        #[test]
        fn children_are_union_of_slots_and_input_keys(
            declared in proptest::collection::btree_set("[a-e]{1,2}", 0..5),
            input in proptest::collection::btree_map("[a-g]{1,2}", any::<i64>(), 0..6),
        ) {
            let d = Schema::define(|s| {
                s.attribute("__anchor");
                for name in &declared {
                    s.attribute(name.clone());
                }
            })
            .unwrap();

            let value: Map<String, Value> =
                input.iter().map(|(k, v)| (k.clone(), json!(v))).collect();
            let tree = d.materialize(Value::Object(value));

            let mut expected: Vec<String> = vec!["__anchor".to_string()];
            expected.extend(declared.iter().cloned());
            expected.extend(input.keys().filter(|k| !declared.contains(*k)).cloned());

            let names: Vec<String> = tree.child_names().map(str::to_string).collect();
            prop_assert_eq!(names, expected);

            for (k, v) in &input {
                prop_assert_eq!(tree[k.as_str()].value(), &json!(v));
                prop_assert_eq!(tree[k.as_str()].is_unknown(), !declared.contains(k));
            }
        }
    }
}
