//! Locale resources: kinds, the shared line format and built-in fallbacks.

mod builtin;
mod kind;

pub use builtin::core_resource;
pub use kind::{parse_resource_lines, ResourceKind};
