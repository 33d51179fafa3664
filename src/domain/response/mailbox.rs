//! Session-keyed mailboxes shared by the caller and the collector worker.
//!
//! Every operation is keyed by exact session id, so clearing one session
//! never touches another; only [`ResponseMailboxes::cancel_all`] spans
//! sessions.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::domain::foundation::{DomainError, ErrorCode, SessionId};

/// Raw input for the current wait cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingSlot {
    Empty,
    HasUtterances(Vec<String>),
    Cancelled,
}

/// Final outcome read by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedSlot {
    Pending,
    Value(String),
    Rejected,
}

impl ValidatedSlot {
    pub fn is_settled(&self) -> bool {
        !matches!(self, ValidatedSlot::Pending)
    }

    pub fn into_value(self) -> Option<String> {
        match self {
            ValidatedSlot::Value(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct ResponseMailboxes {
    pending: DashMap<SessionId, PendingSlot>,
    validated: DashMap<SessionId, ValidatedSlot>,
}

impl ResponseMailboxes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens both mailboxes for a session.
    ///
    /// # Errors
    ///
    /// `CollectionInProgress` if the session already has an open collection.
    pub fn begin(&self, session: &SessionId) -> Result<(), DomainError> {
        match self.pending.entry(session.clone()) {
            Entry::Occupied(_) => Err(DomainError::new(
                ErrorCode::CollectionInProgress,
                format!("a response is already being collected for session '{}'", session),
            )
            .with_detail("session_id", session.as_str())),
            Entry::Vacant(slot) => {
                slot.insert(PendingSlot::Empty);
                self.validated.insert(session.clone(), ValidatedSlot::Pending);
                Ok(())
            }
        }
    }

    pub fn is_open(&self, session: &SessionId) -> bool {
        self.pending.contains_key(session)
    }

    /// Stores utterances if the session is waiting for input. Later arrivals
    /// in the same cycle are dropped.
    pub fn deliver(&self, session: &SessionId, utterances: Vec<String>) -> bool {
        if utterances.is_empty() {
            return false;
        }
        match self.pending.get_mut(session) {
            Some(mut slot) if *slot == PendingSlot::Empty => {
                *slot = PendingSlot::HasUtterances(utterances);
                true
            }
            _ => false,
        }
    }

    /// Snapshot of the pending slot; `None` once the collection is finished.
    pub fn pending(&self, session: &SessionId) -> Option<PendingSlot> {
        self.pending.get(session).map(|slot| slot.clone())
    }

    /// Starts a new wait cycle after a reprompt.
    pub fn rearm(&self, session: &SessionId) {
        if let Some(mut slot) = self.pending.get_mut(session) {
            if matches!(*slot, PendingSlot::HasUtterances(_)) {
                *slot = PendingSlot::Empty;
            }
        }
    }

    /// Records the accepted value and stops the wait loop.
    pub fn resolve(&self, session: &SessionId, value: String) {
        if let Some(mut slot) = self.validated.get_mut(session) {
            if *slot == ValidatedSlot::Pending {
                *slot = ValidatedSlot::Value(value);
            }
        }
        self.close_pending(session);
    }

    /// Records "no answer" and stops the wait loop.
    pub fn reject(&self, session: &SessionId) {
        if let Some(mut slot) = self.validated.get_mut(session) {
            if *slot == ValidatedSlot::Pending {
                *slot = ValidatedSlot::Rejected;
            }
        }
        self.close_pending(session);
    }

    /// External abort for one session; true if it had an open collection.
    pub fn cancel(&self, session: &SessionId) -> bool {
        let open = self.is_open(session);
        if open {
            self.reject(session);
        }
        open
    }

    /// External abort for every session; returns the sessions affected.
    pub fn cancel_all(&self) -> Vec<SessionId> {
        let sessions: Vec<SessionId> = self.pending.iter().map(|e| e.key().clone()).collect();
        for session in &sessions {
            self.reject(session);
        }
        sessions
    }

    pub fn outcome(&self, session: &SessionId) -> Option<ValidatedSlot> {
        self.validated.get(session).map(|slot| slot.clone())
    }

    /// Removes both mailboxes, returning the last outcome.
    pub fn finish(&self, session: &SessionId) -> Option<ValidatedSlot> {
        self.pending.remove(session);
        self.validated.remove(session).map(|(_, slot)| slot)
    }

    pub fn open_sessions(&self) -> Vec<SessionId> {
        self.pending.iter().map(|e| e.key().clone()).collect()
    }

    fn close_pending(&self, session: &SessionId) {
        if let Some(mut slot) = self.pending.get_mut(session) {
            *slot = PendingSlot::Cancelled;
        }
    }
}
