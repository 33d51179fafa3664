//! Domain layer containing the pure types and algorithms of the converse
//! runtime.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, bus message, errors, state machine)
//! - `session` - Per-conversation state and response-mode ownership
//! - `language` - Language tag parsing and distance
//! - `text` - Normalization and sample template expansion
//! - `vocabulary` - Whole-word vocabulary matching
//! - `dialog` - Dialog rendering, list joining and small numbers
//! - `resources` - Resource kinds and built-in core resources
//! - `intent` - Per-language converse intent matchers
//! - `response` - Response collection mailboxes, lifecycle and retry rules
//! - `settings` - Skill settings with change tracking

pub mod dialog;
pub mod foundation;
pub mod intent;
pub mod language;
pub mod resources;
pub mod response;
pub mod session;
pub mod settings;
pub mod text;
pub mod vocabulary;
