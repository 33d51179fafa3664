//! Shared fixtures for application unit tests.

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::errors::HandlerError;
use super::runtime::{SkillPorts, SkillRuntime};
use super::skill::ConverseSkill;
use crate::adapters::{
    InMemoryMessageBus, InMemoryResourceLoader, InMemorySessionRegistry, InMemorySettingsStore,
    AUDIO_OUTPUT_END,
};
use crate::config::AppConfig;
use crate::domain::foundation::{DomainError, Message, SkillId};
use crate::domain::resources::ResourceKind;
use crate::domain::session::Session;
use crate::ports::{MessageBus, MessageHandler};

pub const SKILL_ID: &str = "test.skill";

#[derive(Default)]
pub struct TestSkill {
    pub display_name: Option<String>,
    pub converse_result: bool,
    pub stop_result: bool,
    pub activations: AtomicUsize,
    pub deactivations: AtomicUsize,
    pub stopped: AtomicBool,
}

impl TestSkill {
    pub fn named(name: &str) -> Self {
        Self {
            display_name: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn stoppable() -> Self {
        Self {
            stop_result: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ConverseSkill for TestSkill {
    fn name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    async fn converse(
        &self,
        _runtime: &SkillRuntime,
        _message: &Message,
        _utterances: &[String],
        _lang: &str,
    ) -> Result<bool, HandlerError> {
        Ok(self.converse_result)
    }

    async fn handle_activate(
        &self,
        _runtime: &SkillRuntime,
        _message: &Message,
    ) -> Result<(), HandlerError> {
        self.activations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn handle_deactivate(
        &self,
        _runtime: &SkillRuntime,
        _message: &Message,
    ) -> Result<(), HandlerError> {
        self.deactivations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn can_stop(&self, _message: &Message) -> bool {
        self.stop_result
    }

    async fn stop(&self, _runtime: &SkillRuntime) -> Result<bool, HandlerError> {
        self.stopped.store(true, Ordering::SeqCst);
        Ok(self.stop_result)
    }
}

/// Ends speech as soon as it starts.
struct InstantSpeech {
    bus: Arc<InMemoryMessageBus>,
}

#[async_trait]
impl MessageHandler for InstantSpeech {
    async fn handle(&self, message: Message) -> Result<(), DomainError> {
        self.bus
            .emit(message.forward(AUDIO_OUTPUT_END, json!({})))
            .await
    }

    fn name(&self) -> &'static str {
        "InstantSpeech"
    }
}

pub struct Harness {
    pub runtime: SkillRuntime,
    pub skill: Arc<TestSkill>,
    pub bus: Arc<InMemoryMessageBus>,
    pub sessions: Arc<InMemorySessionRegistry>,
    pub resources: Arc<InMemoryResourceLoader>,
    pub settings: Arc<InMemorySettingsStore>,
}

/// Config with the shortest waits the collector accepts.
pub fn fast_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.response.timeout_secs = 1;
    config.response.speak_wait_secs = 1;
    config.response.poll_interval_ms = 20;
    config
}

pub async fn harness(skill: TestSkill) -> Harness {
    harness_with(skill, InMemoryResourceLoader::new()).await
}

pub async fn harness_with(skill: TestSkill, resources: InMemoryResourceLoader) -> Harness {
    let bus = Arc::new(InMemoryMessageBus::new());
    let sessions = Arc::new(InMemorySessionRegistry::new("en-US"));
    sessions.attach(bus.as_ref());
    bus.on(
        "speak",
        Arc::new(InstantSpeech {
            bus: Arc::clone(&bus),
        }),
    );
    let resources = Arc::new(resources);
    let settings = Arc::new(InMemorySettingsStore::new());
    let skill = Arc::new(skill);

    let ports = SkillPorts {
        bus: bus.clone(),
        sessions: sessions.clone(),
        resources: resources.clone(),
        settings: settings.clone(),
    };
    let runtime = SkillRuntime::start(
        SkillId::new(SKILL_ID).unwrap(),
        skill.clone(),
        ports,
        fast_config(),
    )
    .await
    .unwrap();

    Harness {
        runtime,
        skill,
        bus,
        sessions,
        resources,
        settings,
    }
}

/// Flight booking intent samples in English.
pub fn flight_resources() -> InMemoryResourceLoader {
    InMemoryResourceLoader::new()
        .with(
            "en-US",
            ResourceKind::Intent,
            "book_flight",
            "book me a flight\nI want to fly",
        )
        .with(
            "en-US",
            ResourceKind::Dialog,
            "ask.destination",
            "Where do you want to fly to?",
        )
}

/// Message in session `session_id`.
pub fn in_session(msg_type: &str, data: serde_json::Value, session_id: &str) -> Message {
    Message::new(msg_type, data).with_context(
        "session",
        Session::new(session_id.into(), "en-US").to_context(),
    )
}

/// Polls until `check` holds or a second passes.
pub async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
