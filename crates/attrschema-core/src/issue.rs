//! Issue records collected while checking an attribute tree.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Error,
    Warning,
    Note,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Note => "note",
        }
    }
}

/// A single validation outcome attached to an attribute.
///
/// `name` is the last segment of the originating attribute's path, or `None`
/// when the issue was recorded on the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub name: Option<String>,
    pub message: String,
}

impl Issue {
    pub fn new(kind: IssueKind, name: Option<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            name,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == IssueKind::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_kind_lowercase() {
        let i = Issue::new(IssueKind::Warning, Some("port".to_string()), "low");
        let v = serde_json::to_value(&i).unwrap();
        assert_eq!(v["kind"], "warning");
        assert_eq!(v["name"], "port");
        assert_eq!(v["message"], "low");
    }
}
