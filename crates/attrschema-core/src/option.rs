//! Option values configured on schemas and plugins.
//!
//! An option is either a literal JSON value or a function computed against the
//! attribute being checked. Options are stored by name in an ordered map so
//! iteration over a schema's options is deterministic.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::attribute::Attribute;
use crate::context::CheckContext;

/// Function producing an option value for a given attribute.
pub type ComputeFn =
    Arc<dyn Fn(&Attribute, &CheckContext) -> anyhow::Result<Value> + Send + Sync>;

/// Options keyed by name.
pub type Options = BTreeMap<String, OptionValue>;

#[derive(Clone)]
pub enum OptionValue {
    Literal(Value),
    Computed(ComputeFn),
}

impl OptionValue {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Attribute, &CheckContext) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::Computed(Arc::new(f))
    }

    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Self::Literal(v) => Some(v),
            Self::Computed(_) => None,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Self::Computed(_))
    }

    /// A literal `null` carries no value. Declaring it never sets or clears an option.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Literal(Value::Null))
    }

    /// Evaluate the option for `attr`.
    pub fn resolve(&self, attr: &Attribute, ctx: &CheckContext) -> anyhow::Result<Value> {
        match self {
            Self::Literal(v) => Ok(v.clone()),
            Self::Computed(f) => f(attr, ctx),
        }
    }
}

impl fmt::Debug for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            Self::Computed(_) => f.write_str("Computed(<fn>)"),
        }
    }
}

/// Literals compare by value, computed options by function identity.
impl PartialEq for OptionValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::Computed(a), Self::Computed(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Value> for OptionValue {
    fn from(v: Value) -> Self {
        Self::Literal(v)
    }
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        Self::Literal(Value::Bool(v))
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        Self::Literal(Value::from(v))
    }
}

impl From<i32> for OptionValue {
    fn from(v: i32) -> Self {
        Self::Literal(Value::from(v))
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        Self::Literal(Value::from(v))
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        Self::Literal(Value::from(v))
    }
}

/// Only `null` and `false` are falsy.
pub(crate) fn truthy(v: &Value) -> bool {
    !matches!(v, Value::Null | Value::Bool(false))
}

/// Option values handed to a plugin check.
///
/// Only the option names the check declared are present. A declared name with
/// no configured option on the schema is simply absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedOptions {
    values: BTreeMap<String, Value>,
}

impl ResolvedOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Truthiness of an option; absent options read as `false`.
    pub fn flag(&self, name: &str) -> bool {
        self.values.get(name).map(truthy).unwrap_or(false)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
