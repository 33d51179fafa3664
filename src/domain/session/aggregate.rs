//! Session - per-conversation state referenced by id.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::foundation::{DomainError, ErrorCode, Message, SessionId, SkillId};
use crate::domain::language::standardize_lang_tag;

/// Conversational context: a user, device, or device class.
///
/// Invariant: at most one skill owns response mode at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,

    /// BCP-47 language tag, standardized.
    pub lang: String,

    /// Skill currently collecting a response in this session.
    #[serde(default)]
    pub response_mode: Option<SkillId>,

    /// True while text-to-speech output is playing for this session.
    #[serde(default)]
    pub is_speaking: bool,
}

impl Session {
    pub fn new(session_id: SessionId, lang: &str) -> Self {
        Self {
            session_id,
            lang: standardize_lang_tag(lang),
            response_mode: None,
            is_speaking: false,
        }
    }

    /// Marks `skill_id` as the owner of response collection for this session.
    ///
    /// # Errors
    ///
    /// `ResponseModeConflict` if the session already has an owner, the same
    /// skill included.
    pub fn enable_response_mode(&mut self, skill_id: &SkillId) -> Result<(), DomainError> {
        if let Some(owner) = &self.response_mode {
            return Err(DomainError::new(
                ErrorCode::ResponseModeConflict,
                format!(
                    "session '{}' is already in response mode for '{}'",
                    self.session_id, owner
                ),
            )
            .with_detail("session_id", self.session_id.as_str())
            .with_detail("owner", owner.as_str())
            .with_detail("requested_by", skill_id.as_str()));
        }
        self.response_mode = Some(skill_id.clone());
        Ok(())
    }

    /// Releases response mode; a no-op unless `skill_id` is the owner.
    pub fn disable_response_mode(&mut self, skill_id: &SkillId) {
        if self.response_mode.as_ref() == Some(skill_id) {
            self.response_mode = None;
        }
    }

    pub fn is_in_response_mode(&self, skill_id: &SkillId) -> bool {
        self.response_mode.as_ref() == Some(skill_id)
    }

    /// Serialized form stored under `context.session` of outgoing messages.
    pub fn to_context(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }

    /// Session id referenced by a message, `"default"` when absent.
    pub fn id_from_message(message: &Message) -> SessionId {
        message
            .context
            .get("session")
            .and_then(|s| s.get("session_id"))
            .and_then(JsonValue::as_str)
            .map(SessionId::from_string)
            .unwrap_or_default()
    }

    /// Language requested by a message: `data.lang`, then `context.session.lang`.
    pub fn lang_from_message(message: &Message) -> Option<String> {
        message
            .data_str("lang")
            .or_else(|| {
                message
                    .context
                    .get("session")
                    .and_then(|s| s.get("lang"))
                    .and_then(JsonValue::as_str)
            })
            .map(standardize_lang_tag)
    }
}
