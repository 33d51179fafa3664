//! CollectionState - lifecycle of one response collection.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Per-session state of a response collection.
///
/// ```text
/// Idle -> Waiting -> (Retry -> Waiting)* -> Resolved | Rejected | Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CollectionState {
    #[default]
    Idle,
    Waiting,
    Retry,
    Resolved,
    Rejected,
    Aborted,
}

impl CollectionState {
    /// Whether the caller receives a value in this state.
    pub fn has_answer(&self) -> bool {
        matches!(self, CollectionState::Resolved)
    }
}

impl StateMachine for CollectionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use CollectionState::*;
        match self {
            Idle => vec![Waiting],
            Waiting => vec![Retry, Resolved, Rejected, Aborted],
            Retry => vec![Waiting, Rejected, Aborted],
            Resolved | Rejected | Aborted => vec![],
        }
    }
}

impl fmt::Display for CollectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CollectionState::Idle => "Idle",
            CollectionState::Waiting => "Waiting",
            CollectionState::Retry => "Retry",
            CollectionState::Resolved => "Resolved",
            CollectionState::Rejected => "Rejected",
            CollectionState::Aborted => "Aborted",
        };
        write!(f, "{}", s)
    }
}
