//! SessionRegistry port - Interface to per-conversation session state.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::foundation::{DomainError, Message, SessionId, SkillId};
use crate::domain::session::Session;

/// Port for looking up and mutating [`Session`]s.
///
/// Sessions are owned by the registry; callers receive snapshots and write
/// changes back through the mutating methods.
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Session referenced by a message, created on first use.
    fn get(&self, message: &Message) -> Session;

    /// Session by id, if known.
    fn find(&self, session_id: &SessionId) -> Option<Session>;

    /// Stores a session snapshot.
    fn update(&self, session: Session);

    /// Marks `skill_id` as owning response collection for the session.
    ///
    /// # Errors
    ///
    /// `ResponseModeConflict` if the session already has an owner.
    fn enable_response_mode(
        &self,
        session_id: &SessionId,
        skill_id: &SkillId,
    ) -> Result<Session, DomainError>;

    /// Releases response mode if `skill_id` owns it.
    fn disable_response_mode(&self, session_id: &SessionId, skill_id: &SkillId) -> Option<Session>;

    fn set_speaking(&self, session_id: &SessionId, speaking: bool);

    /// Waits until the session stops speaking.
    ///
    /// Returns false if it was still speaking when `timeout` elapsed.
    async fn wait_while_speaking(&self, session_id: &SessionId, timeout: Duration) -> bool;
}
