//! Settings store adapters.

mod file_store;
mod in_memory;

pub use file_store::FileSettingsStore;
pub use in_memory::InMemorySettingsStore;
