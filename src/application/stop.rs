//! Stop requests.

use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use super::errors::HandlerError;
use super::runtime::SkillRuntime;
use crate::domain::foundation::{DomainError, Message};

/// Stop everything; also aborts every response collection.
pub const GLOBAL_STOP: &str = "mycroft.stop";
pub const STOP_PONG: &str = "skill.stop.pong";

impl SkillRuntime {
    /// `<skill>.stop.ping`: tells the stop service whether this skill has
    /// anything to stop.
    pub(super) async fn handle_stop_ping(&self, message: &Message) -> Result<(), DomainError> {
        let skill_id = self.inner.skill_id.as_str();
        let can_handle = self.inner.skill.can_stop(message);
        let pong = message
            .reply(STOP_PONG, json!({ "skill_id": skill_id, "can_handle": can_handle }))
            .with_context("skill_id", json!(skill_id));
        self.inner.ports.bus.emit(pong).await
    }

    /// `<skill>.stop` and `mycroft.stop`: session-aware stop first, then the
    /// global one. A successful stop aborts the session's response collection.
    pub(super) async fn handle_session_stop(&self, message: Message) -> Result<(), HandlerError> {
        let inner = &self.inner;
        let message = message.with_context("skill_id", json!(inner.skill_id.as_str()));
        let session = inner.ports.sessions.get(&message);
        let skill = Arc::clone(&inner.skill);

        let result = match skill.stop_session(self, &session).await {
            Ok(true) => Ok(true),
            Ok(false) => skill.stop(self).await,
            Err(e) => Err(e),
        };

        let mut data = json!({ "skill_id": inner.skill_id.as_str(), "result": false });
        match result {
            Ok(stopped) => {
                data["result"] = json!(stopped);
                if stopped {
                    info!(skill_id = %inner.skill_id, session_id = %session.session_id, "Skill stopped");
                    self.abort_collections(Some(&session.session_id));
                }
            }
            Err(e) => {
                error!(skill_id = %inner.skill_id, error = %e, "Failed to stop skill");
                data["error"] = json!(e.to_string());
            }
        }

        inner
            .ports
            .bus
            .emit(message.reply(inner.skill_id.scoped("stop.response"), data))
            .await?;
        Ok(())
    }
}
