//! Session registry adapters.

mod in_memory;

pub use in_memory::{InMemorySessionRegistry, AUDIO_OUTPUT_END};
