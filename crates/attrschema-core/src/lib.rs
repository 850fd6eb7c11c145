//! attrschema-core
//!
//! Core primitives for attrschema:
//! - Schema declarations (child slots, options, checks, adopted plugins)
//! - Plugin capability values (options, defaults, checks, helpers)
//! - Instance trees materialized from nested JSON-like mappings
//! - The staged check pipeline and its issue records
//!
//! The flow is one-directional: a `Schema` is declared once, materialized
//! against any number of inputs into `Attribute` trees, and each tree is then
//! checked in place.

pub mod attribute;
pub mod check;
pub mod context;
pub mod errors;
pub mod issue;
pub mod option;
pub mod plugin;
pub mod schema;

pub use crate::errors::{SchemaError, SchemaResult};

/// Marker used in place of a path when the failing attribute is the tree root.
pub const ROOT_MARKER: &str = "__root__";

/// Separator used when joining attribute paths for display.
pub const PATH_SEPARATOR: &str = ".";

/// Option names understood by the core itself.
pub mod options {
    /// Literal boolean or predicate controlling whether an attribute is checked.
    pub const VISIBLE: &str = "visible";
}

/// Convenience re-exports.
pub mod prelude {
    pub use crate::attribute::Attribute;
    pub use crate::context::CheckContext;
    pub use crate::issue::{Issue, IssueKind};
    pub use crate::option::{OptionValue, Options, ResolvedOptions};
    pub use crate::plugin::{Plugin, PluginId};
    pub use crate::schema::{AttributeDef, Schema, SchemaBuilder};
    pub use crate::{SchemaError, SchemaResult};
}
