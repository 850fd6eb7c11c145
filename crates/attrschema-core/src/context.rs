//! Caller-provided context for a check run.
//!
//! Visibility predicates and computed options receive this context alongside
//! the attribute being checked. The core never reads the environment; anything
//! a predicate depends on must be placed here by the host.

use std::collections::BTreeMap;

use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckContext {
    params: BTreeMap<String, Value>,
}

impl CheckContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_param(&mut self, k: impl Into<String>, v: impl Into<Value>) -> &mut Self {
        self.params.insert(k.into(), v.into());
        self
    }

    pub fn get_param(&self, k: &str) -> Option<&Value> {
        self.params.get(k)
    }

    /// Boolean parameter; absent or non-boolean values read as `false`.
    pub fn flag(&self, k: &str) -> bool {
        self.params.get(k).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn params(&self) -> &BTreeMap<String, Value> {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_roundtrip() {
        let mut ctx = CheckContext::new();
        ctx.set_param("env", "prod").set_param("strict", true);
        assert_eq!(ctx.get_param("env"), Some(&Value::from("prod")));
        assert!(ctx.flag("strict"));
        assert!(!ctx.flag("env"));
        assert!(!ctx.flag("missing"));
    }
}
