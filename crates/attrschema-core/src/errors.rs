//! Error types for attrschema-core.
//!
//! Two failure classes exist:
//! - declaration-time errors (`Definition`), surfaced when a schema is built
//! - check-time errors (`CheckFailed`), surfaced when a check, a visibility
//!   predicate or a computed option fails while a tree is being checked
//!
//! Validation findings are not errors. They are recorded as `Issue`s on the
//! attribute they concern.

use thiserror::Error;

/// Result alias used across the crate.
pub type SchemaResult<T> = Result<T, SchemaError>;

#[derive(Debug, Error)]
pub enum SchemaError {
    /// A schema declaration is malformed.
    #[error("schema definition error: {0}")]
    Definition(String),

    /// A check raised an error while checking the attribute at `path`.
    #[error("attribute check failed for '{path}'")]
    CheckFailed {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

impl SchemaError {
    pub fn definition(msg: impl Into<String>) -> Self {
        Self::Definition(msg.into())
    }

    pub fn check_failed(path: impl Into<String>, source: anyhow::Error) -> Self {
        Self::CheckFailed {
            path: path.into(),
            source,
        }
    }

    /// Display path of the failing attribute, if this is a check failure.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::CheckFailed { path, .. } => Some(path.as_str()),
            Self::Definition(_) => None,
        }
    }
}
