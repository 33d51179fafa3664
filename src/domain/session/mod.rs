//! Session domain module.
//!
//! Sessions are owned by an external registry; the converse runtime reads
//! them from message context and toggles response mode while collecting a
//! reply.

mod aggregate;

pub use aggregate::Session;
