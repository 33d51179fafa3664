//! Speech output and locale resource lookup for skills.

use serde_json::{json, Map, Value as JsonValue};
use tracing::{debug, warn};

use super::errors::HandlerError;
use super::runtime::SkillRuntime;
use crate::domain::dialog::render_template;
use crate::domain::foundation::Message;
use crate::domain::language::standardize_lang_tag;
use crate::domain::resources::{core_resource, ResourceKind};
use crate::domain::vocabulary::Vocabulary;
use crate::ports::ResourceError;

pub const SPEAK: &str = "speak";
pub const PLAY_SOUND: &str = "mycroft.audio.play_sound";
pub const ACKNOWLEDGE_SOUND: &str = "snd/acknowledge.mp3";

impl SkillRuntime {
    /// Speaks `utterance` in the session of `source`.
    ///
    /// With `wait`, returns once the session stops speaking or the configured
    /// speak wait elapses.
    pub async fn speak(
        &self,
        source: &Message,
        utterance: &str,
        expect_response: bool,
        wait: bool,
    ) -> Result<(), HandlerError> {
        self.emit_speech(source, utterance, expect_response, wait, json!({}))
            .await
    }

    /// Renders dialog `key` with `data` and speaks it.
    pub async fn speak_dialog(
        &self,
        source: &Message,
        key: &str,
        data: Option<&Map<String, JsonValue>>,
        expect_response: bool,
        wait: bool,
    ) -> Result<(), HandlerError> {
        let empty = Map::new();
        let data = data.unwrap_or(&empty);
        let lang = self.inner.ports.sessions.get(source).lang;
        let utterance = self.render_dialog(&lang, key, data).await;
        let meta = json!({ "dialog": key, "data": data });
        self.emit_speech(source, &utterance, expect_response, wait, meta)
            .await
    }

    async fn emit_speech(
        &self,
        source: &Message,
        utterance: &str,
        expect_response: bool,
        wait: bool,
        mut meta: JsonValue,
    ) -> Result<(), HandlerError> {
        let sessions = &self.inner.ports.sessions;
        let session = sessions.get(source);
        meta["skill"] = json!(self.inner.skill_id.as_str());

        let message = source
            .forward(
                SPEAK,
                json!({
                    "utterance": utterance,
                    "expect_response": expect_response,
                    "meta": meta,
                    "lang": session.lang,
                }),
            )
            .with_context("skill_id", json!(self.inner.skill_id.as_str()));

        if wait {
            sessions.set_speaking(&session.session_id, true);
        }
        self.inner.ports.bus.emit(message).await?;

        if wait {
            let speak_wait = self.inner.config.response.speak_wait();
            if !sessions
                .wait_while_speaking(&session.session_id, speak_wait)
                .await
            {
                debug!(session_id = %session.session_id, "Stopped waiting for speech");
            }
        }
        Ok(())
    }

    /// Plays the acknowledge sound.
    pub async fn acknowledge(&self, source: &Message) -> Result<(), HandlerError> {
        self.inner
            .ports
            .bus
            .emit(source.forward(PLAY_SOUND, json!({ "uri": ACKNOWLEDGE_SOUND })))
            .await?;
        Ok(())
    }

    /// First line of dialog `key` rendered with `data`. Unknown keys are
    /// spoken literally.
    pub async fn render_dialog(&self, lang: &str, key: &str, data: &Map<String, JsonValue>) -> String {
        let template = self
            .resource_lines(lang, ResourceKind::Dialog, key)
            .await
            .and_then(|lines| lines.into_iter().next())
            .unwrap_or_else(|| key.to_string());
        render_template(&template, data)
    }

    /// Vocabulary `name` for `lang`, loaded once and cached.
    pub async fn vocabulary(&self, lang: &str, name: &str) -> Vocabulary {
        let key = (standardize_lang_tag(lang), name.to_string());
        if let Some(cached) = self.inner.vocabularies.get(&key) {
            return cached.clone();
        }

        let vocabulary = match self.resource_lines(&key.0, ResourceKind::Vocabulary, name).await {
            Some(lines) => Vocabulary::from_lines(&lines),
            None => {
                warn!(skill_id = %self.inner.skill_id, lang = %key.0, vocabulary = %name, "Vocabulary not found");
                Vocabulary::default()
            }
        };
        self.inner.vocabularies.insert(key, vocabulary.clone());
        vocabulary
    }

    /// Whether `utterance` contains (or with `exact`, equals) a phrase of
    /// vocabulary `voc`. Defaults to the configured language.
    pub async fn voc_match(&self, utterance: &str, voc: &str, lang: Option<&str>, exact: bool) -> bool {
        let lang = lang.unwrap_or(&self.inner.config.skill.lang);
        self.vocabulary(lang, voc).await.matches(utterance, exact)
    }

    /// `utterance` with every phrase of vocabulary `voc` removed.
    pub async fn remove_voc(&self, utterance: &str, voc: &str, lang: Option<&str>) -> String {
        let lang = lang.unwrap_or(&self.inner.config.skill.lang);
        self.vocabulary(lang, voc).await.remove_from(utterance)
    }

    /// Single word resource such as the `or` list connector.
    pub async fn word(&self, lang: &str, name: &str) -> Option<String> {
        self.resource_lines(lang, ResourceKind::Word, name)
            .await
            .and_then(|lines| lines.into_iter().next())
    }

    /// Skill resource, falling back to the built-in core resources.
    async fn resource_lines(&self, lang: &str, kind: ResourceKind, name: &str) -> Option<Vec<String>> {
        match self.inner.ports.resources.load(lang, kind, name).await {
            Ok(lines) if !lines.is_empty() => return Some(lines),
            Ok(_) | Err(ResourceError::NotFound { .. }) => {}
            Err(e) => warn!(skill_id = %self.inner.skill_id, error = %e, "Failed to load resource"),
        }
        core_resource(lang, kind, name)
    }
}
