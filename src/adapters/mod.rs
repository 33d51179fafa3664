//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the runtime to its collaborators:
//! - `bus` - In-process message bus
//! - `session` - In-memory session registry
//! - `resources` - Locale resources from memory or a `locale/` directory
//! - `settings` - Skill settings in memory or as JSON files

pub mod bus;
pub mod resources;
pub mod session;
pub mod settings;

pub use bus::InMemoryMessageBus;
pub use resources::{FileResourceLoader, InMemoryResourceLoader};
pub use session::{InMemorySessionRegistry, AUDIO_OUTPUT_END};
pub use settings::{FileSettingsStore, InMemorySettingsStore};
