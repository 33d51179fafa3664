//! Response collection domain: per-session mailboxes, lifecycle and
//! validation rules.

mod mailbox;
mod state;
mod validation;

pub use mailbox::{PendingSlot, ResponseMailboxes, ValidatedSlot};
pub use state::CollectionState;
pub use validation::{RepromptFn, RetryBudget, Validation, Validator, UNLIMITED_EMPTY_TIMEOUTS};
