//! ConverseSkill - the behavior a concrete skill plugs into the runtime.

use async_trait::async_trait;

use super::errors::HandlerError;
use super::runtime::SkillRuntime;
use crate::domain::foundation::Message;
use crate::domain::session::Session;

/// A skill that can converse while active.
///
/// The runtime owns the bus wiring; implementors only supply behavior.
/// Every hook runs inside the dispatch wrapper, so returning
/// [`HandlerError::Aborted`] is a clean stop.
#[async_trait]
pub trait ConverseSkill: Send + Sync + 'static {
    /// Display name used in spoken error messages, e.g. `"FlightBookingSkill"`.
    /// Defaults to the skill id.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Free-form handling of utterances while the skill is active.
    ///
    /// Returns true if the utterance was consumed and intent parsing
    /// should not run.
    async fn converse(
        &self,
        runtime: &SkillRuntime,
        message: &Message,
        utterances: &[String],
        lang: &str,
    ) -> Result<bool, HandlerError>;

    /// The intent service made this skill active.
    async fn handle_activate(
        &self,
        runtime: &SkillRuntime,
        message: &Message,
    ) -> Result<(), HandlerError>;

    /// The skill left the active set.
    async fn handle_deactivate(
        &self,
        runtime: &SkillRuntime,
        message: &Message,
    ) -> Result<(), HandlerError>;

    /// Whether the skill has something to stop; answered on stop pings.
    fn can_stop(&self, _message: &Message) -> bool {
        false
    }

    /// Stops activity related to one session. Runs before [`stop`](Self::stop);
    /// returning true skips the global stop.
    async fn stop_session(
        &self,
        _runtime: &SkillRuntime,
        _session: &Session,
    ) -> Result<bool, HandlerError> {
        Ok(false)
    }

    /// Stops any ongoing activity.
    async fn stop(&self, _runtime: &SkillRuntime) -> Result<bool, HandlerError> {
        Ok(false)
    }
}
