//! Asks the intent service which intent an utterance would trigger.
//!
//! Converse handlers use this to let normal intent parsing win for
//! utterances that belong to another intent. Converse, common query and
//! fallback handlers are not part of the answer.

use serde_json::{json, Value as JsonValue};
use std::time::Duration;
use tracing::debug;

use super::errors::HandlerError;
use super::runtime::SkillRuntime;
use crate::domain::foundation::{Message, SkillId};

pub const INTENT_GET: &str = "intent.service.intent.get";
pub const INTENT_REPLY: &str = "intent.service.intent.reply";

impl SkillRuntime {
    /// Intent the intent service would select, or `None` when it does not
    /// answer within `timeout` (configured default when `None`).
    pub async fn calc_intent(
        &self,
        utterance: &str,
        lang: &str,
        timeout: Option<Duration>,
    ) -> Result<Option<JsonValue>, HandlerError> {
        let timeout = timeout.unwrap_or_else(|| self.inner.config.converse.intent_probe_timeout());
        let request = Message::new(INTENT_GET, json!({ "utterance": utterance, "lang": lang }));

        let reply = self
            .inner
            .ports
            .bus
            .wait_for_response(request, INTENT_REPLY, timeout)
            .await?;
        Ok(reply
            .and_then(|reply| reply.data.get("intent").cloned())
            .filter(|intent| !intent.is_null()))
    }

    /// Whether `utterance` would trigger an intent of `skill_id` (this skill
    /// when `None`).
    pub async fn skill_will_trigger(
        &self,
        utterance: &str,
        lang: &str,
        skill_id: Option<&SkillId>,
        timeout: Option<Duration>,
    ) -> Result<bool, HandlerError> {
        let expected = skill_id.unwrap_or(&self.inner.skill_id);
        let timeout =
            timeout.unwrap_or_else(|| self.inner.config.converse.skill_will_trigger_timeout());

        let Some(intent) = self.calc_intent(utterance, lang, Some(timeout)).await? else {
            debug!(utterance = %utterance, "Intent service gave no answer");
            return Ok(false);
        };
        let owner = intent.get("skill_id").and_then(JsonValue::as_str);
        Ok(owner == Some(expected.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryMessageBus;
    use crate::application::testing::{harness, TestSkill};
    use crate::domain::foundation::DomainError;
    use crate::ports::{MessageBus, MessageHandler};
    use async_trait::async_trait;
    use std::sync::Arc;

    /// Answers every intent probe with an intent of `skill_id`.
    struct IntentService {
        bus: Arc<InMemoryMessageBus>,
        skill_id: &'static str,
    }

    #[async_trait]
    impl MessageHandler for IntentService {
        async fn handle(&self, message: Message) -> Result<(), DomainError> {
            let intent = json!({ "skill_id": self.skill_id, "intent_name": "weather" });
            self.bus
                .emit(message.reply(INTENT_REPLY, json!({ "intent": intent })))
                .await
        }

        fn name(&self) -> &'static str {
            "IntentService"
        }
    }

    #[tokio::test]
    async fn probe_returns_the_selected_intent() {
        let h = harness(TestSkill::default()).await;
        h.bus.on(
            INTENT_GET,
            Arc::new(IntentService {
                bus: h.bus.clone(),
                skill_id: "weather.skill",
            }),
        );

        let intent = h
            .runtime
            .calc_intent("will it rain", "en-US", None)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(intent["intent_name"], "weather");
        let probe = &h.bus.messages_of_type(INTENT_GET)[0];
        assert_eq!(probe.data, json!({ "utterance": "will it rain", "lang": "en-US" }));
    }

    #[tokio::test]
    async fn will_trigger_compares_skill_ids() {
        let h = harness(TestSkill::default()).await;
        h.bus.on(
            INTENT_GET,
            Arc::new(IntentService {
                bus: h.bus.clone(),
                skill_id: "weather.skill",
            }),
        );
        let weather = SkillId::new("weather.skill").unwrap();

        assert!(!h.runtime.skill_will_trigger("will it rain", "en-US", None, None).await.unwrap());
        assert!(h
            .runtime
            .skill_will_trigger("will it rain", "en-US", Some(&weather), None)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn silent_intent_service_means_unknown() {
        let h = harness(TestSkill::default()).await;
        let probe = h
            .runtime
            .calc_intent("hello", "en-US", Some(Duration::from_millis(50)))
            .await
            .unwrap();
        assert!(probe.is_none());
        assert!(!h
            .runtime
            .skill_will_trigger("hello", "en-US", None, Some(Duration::from_millis(50)))
            .await
            .unwrap());
    }
}
