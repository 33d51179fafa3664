//! In-memory session registry.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::domain::foundation::{DomainError, Message, SessionId, SkillId};
use crate::domain::session::Session;
use crate::ports::{MessageBus, MessageHandler, SessionRegistry, SubscriptionId};

/// Poll interval of [`SessionRegistry::wait_while_speaking`].
const SPEAKING_POLL: Duration = Duration::from_millis(50);

/// Message that ends the speaking state of a session.
pub const AUDIO_OUTPUT_END: &str = "recognizer_loop:audio_output_end";

/// Sessions kept in a concurrent map, keyed by id.
#[derive(Debug)]
pub struct InMemorySessionRegistry {
    sessions: DashMap<SessionId, Session>,
    default_lang: String,
}

impl InMemorySessionRegistry {
    pub fn new(default_lang: impl Into<String>) -> Self {
        Self {
            sessions: DashMap::new(),
            default_lang: default_lang.into(),
        }
    }

    pub fn default_lang(&self) -> &str {
        &self.default_lang
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Clears `is_speaking` whenever audio output ends.
    pub fn attach(self: &Arc<Self>, bus: &dyn MessageBus) -> SubscriptionId {
        bus.on(
            AUDIO_OUTPUT_END,
            Arc::new(AudioOutputEndHandler {
                registry: Arc::clone(self),
            }),
        )
    }
}

#[async_trait]
impl SessionRegistry for InMemorySessionRegistry {
    fn get(&self, message: &Message) -> Session {
        let id = Session::id_from_message(message);
        let lang = Session::lang_from_message(message);
        let mut entry = self
            .sessions
            .entry(id.clone())
            .or_insert_with(|| Session::new(id, lang.as_deref().unwrap_or(&self.default_lang)));
        if let Some(lang) = lang {
            entry.lang = lang;
        }
        entry.clone()
    }

    fn find(&self, session_id: &SessionId) -> Option<Session> {
        self.sessions.get(session_id).map(|s| s.clone())
    }

    fn update(&self, session: Session) {
        self.sessions.insert(session.session_id.clone(), session);
    }

    fn enable_response_mode(
        &self,
        session_id: &SessionId,
        skill_id: &SkillId,
    ) -> Result<Session, DomainError> {
        let mut entry = self
            .sessions
            .entry(session_id.clone())
            .or_insert_with(|| Session::new(session_id.clone(), &self.default_lang));
        entry.enable_response_mode(skill_id)?;
        Ok(entry.clone())
    }

    fn disable_response_mode(&self, session_id: &SessionId, skill_id: &SkillId) -> Option<Session> {
        self.sessions.get_mut(session_id).map(|mut session| {
            session.disable_response_mode(skill_id);
            session.clone()
        })
    }

    fn set_speaking(&self, session_id: &SessionId, speaking: bool) {
        if let Some(mut session) = self.sessions.get_mut(session_id) {
            session.is_speaking = speaking;
        }
    }

    async fn wait_while_speaking(&self, session_id: &SessionId, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let speaking = self
                .sessions
                .get(session_id)
                .map_or(false, |s| s.is_speaking);
            if !speaking {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                debug!(session_id = %session_id, "Gave up waiting for speech to end");
                return false;
            }
            tokio::time::sleep(SPEAKING_POLL).await;
        }
    }
}

struct AudioOutputEndHandler {
    registry: Arc<InMemorySessionRegistry>,
}

#[async_trait]
impl MessageHandler for AudioOutputEndHandler {
    async fn handle(&self, message: Message) -> Result<(), DomainError> {
        let id = Session::id_from_message(&message);
        self.registry.set_speaking(&id, false);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "AudioOutputEndHandler"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryMessageBus;
    use serde_json::json;

    fn message_for(session: &str, lang: Option<&str>) -> Message {
        let mut ctx = json!({"session_id": session});
        if let Some(lang) = lang {
            ctx["lang"] = json!(lang);
        }
        Message::new("test", json!({})).with_context("session", ctx)
    }

    fn skill(id: &str) -> SkillId {
        SkillId::new(id).unwrap()
    }

    #[test]
    fn get_creates_session_with_default_lang() {
        let registry = InMemorySessionRegistry::new("en-US");
        let session = registry.get(&Message::new("test", json!({})));
        assert_eq!(session.session_id.as_str(), SessionId::DEFAULT);
        assert_eq!(session.lang, "en-US");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn message_lang_updates_session() {
        let registry = InMemorySessionRegistry::new("en-US");
        registry.get(&message_for("a", None));
        let session = registry.get(&message_for("a", Some("pt-pt")));
        assert_eq!(session.lang, "pt-PT");
    }

    #[test]
    fn response_mode_is_exclusive() {
        let registry = InMemorySessionRegistry::new("en-US");
        let id = SessionId::from_string("a");
        registry.enable_response_mode(&id, &skill("one")).unwrap();
        assert!(registry.enable_response_mode(&id, &skill("two")).is_err());

        registry.disable_response_mode(&id, &skill("two"));
        assert!(registry.find(&id).unwrap().is_in_response_mode(&skill("one")));

        registry.disable_response_mode(&id, &skill("one"));
        assert!(registry.find(&id).unwrap().response_mode.is_none());
    }

    #[tokio::test]
    async fn wait_returns_immediately_when_not_speaking() {
        let registry = InMemorySessionRegistry::new("en-US");
        assert!(
            registry
                .wait_while_speaking(&SessionId::from_string("x"), Duration::from_millis(10))
                .await
        );
    }

    #[tokio::test]
    async fn wait_gives_up_after_timeout() {
        let registry = InMemorySessionRegistry::new("en-US");
        let session = registry.get(&message_for("a", None));
        registry.set_speaking(&session.session_id, true);
        assert!(
            !registry
                .wait_while_speaking(&session.session_id, Duration::from_millis(60))
                .await
        );
    }

    #[tokio::test]
    async fn audio_output_end_stops_speaking() {
        let bus = InMemoryMessageBus::new();
        let registry = Arc::new(InMemorySessionRegistry::new("en-US"));
        registry.attach(&bus);

        let session = registry.get(&message_for("a", None));
        registry.set_speaking(&session.session_id, true);

        let mut end = message_for("a", None);
        end.msg_type = AUDIO_OUTPUT_END.to_string();
        bus.emit(end).await.unwrap();

        assert!(!registry.find(&session.session_id).unwrap().is_speaking);
    }
}
