//! Converse requests and converse intents.
//!
//! While a skill is active the intent service forwards raw utterances as
//! `<skill>.converse.request`. Registered converse intents get the first
//! chance; when none matches, [`ConverseSkill::converse`] decides.
//!
//! [`ConverseSkill::converse`]: super::ConverseSkill::converse

use serde_json::{json, Map, Value as JsonValue};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::errors::HandlerError;
use super::handler::{HandlerOptions, SkillHandler};
use super::runtime::SkillRuntime;
use crate::domain::foundation::{DomainError, Message};
use crate::domain::intent::IntentMatch;
use crate::domain::language::standardize_lang_tag;
use crate::domain::resources::ResourceKind;
use crate::ports::{ResourceError, SubscriptionId};

pub const CONVERSE_PONG: &str = "skill.converse.pong";
pub const CONVERSE_RESPONSE: &str = "skill.converse.response";

/// Kills in-flight converse handling of `{skill_id}`.
pub const FORCE_TIMEOUT: &str = "ovos.skills.converse.force_timeout";

impl SkillRuntime {
    /// Registers converse intent `intent_file` in every language that has
    /// the resource, and routes its matches to `handler`.
    ///
    /// Intent messages are named `<skill_id>.converse:<intent_file>`.
    ///
    /// # Errors
    ///
    /// `Resource(NotFound)` if no language provides the intent samples.
    pub async fn register_converse_intent(
        &self,
        intent_file: &str,
        handler: Arc<dyn SkillHandler>,
    ) -> Result<SubscriptionId, HandlerError> {
        let inner = &self.inner;
        let name = inner.skill_id.scoped(&format!("converse:{}", intent_file));

        let mut langs = inner.ports.resources.languages().await;
        langs.push(standardize_lang_tag(&inner.config.skill.lang));
        langs.sort();
        langs.dedup();

        let mut registered = 0;
        for lang in &langs {
            match inner
                .ports
                .resources
                .load(lang, ResourceKind::Intent, intent_file)
                .await
            {
                Ok(samples) => {
                    inner.matchers.write().await.register(&name, &samples, lang);
                    registered += 1;
                }
                Err(e) => debug!(intent = %name, lang = %lang, error = %e, "Skipping converse intent language"),
            }
        }

        if registered == 0 {
            error!(skill_id = %inner.skill_id, intent = %intent_file, "Unable to find converse intent");
            return Err(ResourceError::NotFound {
                lang: inner.config.skill.lang.clone(),
                kind: ResourceKind::Intent,
                name: intent_file.to_string(),
            }
            .into());
        }

        info!(skill_id = %inner.skill_id, intent = %name, languages = registered, "Registered converse intent");
        Ok(self.add_event(&name, handler, HandlerOptions::intent()))
    }

    /// Best converse intent for the utterances, using the skill's
    /// `min_intent_conf` and `strict_intents` settings.
    pub async fn match_converse_intent(&self, utterances: &[String], lang: &str) -> Option<IntentMatch> {
        let min_conf = self.min_intent_conf().await;
        let strict = self.strict_intents().await;
        self.inner
            .matchers
            .read()
            .await
            .match_utterances(utterances, lang, min_conf, strict)
    }

    pub(super) async fn handle_converse_ping(&self, message: &Message) -> Result<(), DomainError> {
        let skill_id = self.inner.skill_id.as_str();
        let pong = message
            .reply(CONVERSE_PONG, json!({ "skill_id": skill_id, "can_handle": true }))
            .with_context("skill_id", json!(skill_id));
        self.inner.ports.bus.emit(pong).await
    }

    /// `<skill>.converse.request {utterances, lang}`; always answers with
    /// `skill.converse.response`.
    pub(super) async fn handle_converse_request(&self, message: Message) -> Result<(), HandlerError> {
        let inner = &self.inner;
        let worker_id = inner.next_worker.fetch_add(1, Ordering::SeqCst);
        let token = CancellationToken::new();
        inner.converse_workers.insert(worker_id, token.clone());

        let outcome = tokio::select! {
            _ = token.cancelled() => Err(HandlerError::Aborted),
            result = self.run_converse(&message) => result,
        };
        inner.converse_workers.remove(&worker_id);

        let mut data = json!({ "skill_id": inner.skill_id.as_str(), "result": false });
        let killed = match outcome {
            Ok(result) => {
                data["result"] = json!(result);
                false
            }
            Err(HandlerError::Aborted) => {
                data["error"] = json!("killed");
                true
            }
            Err(e) => {
                error!(skill_id = %inner.skill_id, error = %e, "Converse failed");
                data["error"] = json!(format!("{:?}", e));
                false
            }
        };
        inner
            .ports
            .bus
            .emit(message.reply(CONVERSE_RESPONSE, data))
            .await?;

        if killed {
            self.publish(message.forward(
                inner.skill_id.scoped("converse.killed"),
                json!({ "error": "timed out" }),
            ))
            .await;
        }
        Ok(())
    }

    async fn run_converse(&self, message: &Message) -> Result<bool, HandlerError> {
        let utterances = message.data_strings("utterances");
        let lang = self.inner.ports.sessions.get(message).lang;

        if self.handle_converse_intents(message, &utterances, &lang).await? {
            return Ok(true);
        }

        let skill = Arc::clone(&self.inner.skill);
        skill.converse(self, message, &utterances, &lang).await
    }

    /// Emits the matched converse intent, if any.
    async fn handle_converse_intents(
        &self,
        message: &Message,
        utterances: &[String],
        lang: &str,
    ) -> Result<bool, DomainError> {
        let Some(matched) = self.match_converse_intent(utterances, lang).await else {
            return Ok(false);
        };
        debug!(
            skill_id = %self.inner.skill_id,
            intent = %matched.name,
            confidence = matched.confidence,
            "Converse intent matched"
        );
        let slots: Map<String, JsonValue> = matched
            .slots
            .into_iter()
            .map(|(slot, value)| (slot, JsonValue::String(value)))
            .collect();
        self.inner
            .ports
            .bus
            .emit(message.forward(matched.name, JsonValue::Object(slots)))
            .await?;
        Ok(true)
    }

    pub(super) fn handle_force_timeout(&self, message: &Message) {
        if message.data_str("skill_id") != Some(self.inner.skill_id.as_str()) {
            return;
        }
        let mut killed = 0;
        for worker in self.inner.converse_workers.iter() {
            worker.value().cancel();
            killed += 1;
        }
        if killed > 0 {
            warn!(skill_id = %self.inner.skill_id, workers = killed, "Converse timed out");
        }
    }
}
