//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the skill runtime and the outside world. Adapters implement these ports.
//!
//! ## Bus Ports
//!
//! - `MessageBus` - Emit messages and subscribe to message types
//! - `MessageHandler` - Handler that processes incoming messages
//!
//! ## Collaborator Ports
//!
//! - `SessionRegistry` - Per-conversation session state and response mode
//! - `ResourceLoader` - Locale resources (intents, vocabularies, dialogs)
//! - `SettingsStore` - Persistence of skill settings

mod message_bus;
mod resource_loader;
mod session_registry;
mod settings_store;

pub use message_bus::{MessageBus, MessageHandler, SubscriptionId};
pub use resource_loader::{ResourceError, ResourceLoader};
pub use session_registry::SessionRegistry;
pub use settings_store::{SettingsError, SettingsStore};
