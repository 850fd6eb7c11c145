//! attrschema-plugins
//!
//! Plugin catalog and built-in plugins for attrschema:
//! - `spec`: serializable plugin metadata (id, name, version, option names)
//! - `registry`: deterministic id-keyed catalog of plugin values
//! - `builtin`: plugins shipped with the crate and their configuration
//!
//! Plugins themselves are `attrschema_core::plugin::Plugin` values. This crate
//! only stores and describes them; checks run inside the core pipeline.

pub mod registry;
pub mod spec;

#[cfg(feature = "builtin")]
pub mod builtin;

pub use crate::registry::PluginRegistry;
pub use crate::spec::PluginSpec;
