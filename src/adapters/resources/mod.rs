//! Resource loader adapters.

mod file_loader;
mod in_memory;

pub use file_loader::FileResourceLoader;
pub use in_memory::InMemoryResourceLoader;
