//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, the bus message envelope, the state machine trait
//! and the error types that form the vocabulary of the converse runtime.

mod errors;
mod ids;
mod message;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{SessionId, SkillId};
pub use message::{Message, MessageId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
