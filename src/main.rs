//! Interactive console for a demo travel skill.
//!
//! Lines typed on stdin go to the skill as converse requests, or as the
//! answer to a pending question. `stop` sends a global stop, `quit` exits.

use async_trait::async_trait;
use serde_json::{json, Map};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use skill_converse::adapters::{
    InMemoryMessageBus, InMemoryResourceLoader, InMemorySessionRegistry, InMemorySettingsStore,
    AUDIO_OUTPUT_END,
};
use skill_converse::application::{
    handler_fn, ConverseSkill, HandlerError, ResponseRequest, SkillPorts, SkillRuntime,
    CONVERSE_RESPONSE, GLOBAL_STOP, SPEAK,
};
use skill_converse::config::AppConfig;
use skill_converse::domain::foundation::{DomainError, Message, SessionId, SkillId};
use skill_converse::domain::resources::ResourceKind;
use skill_converse::domain::response::Validation;
use skill_converse::logging::init_tracing;
use skill_converse::ports::{MessageBus, MessageHandler, SessionRegistry};

const SKILL_ID: &str = "travel.demo";

struct TravelSkill;

#[async_trait]
impl ConverseSkill for TravelSkill {
    fn name(&self) -> Option<&str> {
        Some("TravelSkill")
    }

    async fn converse(
        &self,
        runtime: &SkillRuntime,
        message: &Message,
        utterances: &[String],
        lang: &str,
    ) -> Result<bool, HandlerError> {
        let Some(utterance) = utterances.first() else {
            return Ok(false);
        };
        if runtime.voc_match(utterance, "thanks", Some(lang), false).await {
            runtime
                .speak_dialog(message, "you.are.welcome", None, false, false)
                .await?;
            return Ok(true);
        }
        Ok(false)
    }

    async fn handle_activate(&self, _runtime: &SkillRuntime, _message: &Message) -> Result<(), HandlerError> {
        info!("Travel skill is active");
        Ok(())
    }

    async fn handle_deactivate(&self, _runtime: &SkillRuntime, _message: &Message) -> Result<(), HandlerError> {
        info!("Travel skill is no longer active");
        Ok(())
    }
}

fn travel_resources() -> InMemoryResourceLoader {
    InMemoryResourceLoader::new()
        .with(
            "en-US",
            ResourceKind::Intent,
            "book_flight",
            "# flight bookings\nbook (me|a) flight [to {city}]\nI want to fly [to {city}]",
        )
        .with("en-US", ResourceKind::Dialog, "ask.destination", "Where do you want to fly to?")
        .with("en-US", ResourceKind::Dialog, "bad.destination", "{utterance} is not a place I know")
        .with("en-US", ResourceKind::Dialog, "booking", "Booking a flight to {city}")
        .with("en-US", ResourceKind::Dialog, "you.are.welcome", "You're welcome")
        .with("en-US", ResourceKind::Vocabulary, "thanks", "thanks\nthank you")
}

/// Prints speech and immediately reports the end of audio output.
struct ConsoleSpeech {
    bus: Arc<InMemoryMessageBus>,
}

#[async_trait]
impl MessageHandler for ConsoleSpeech {
    async fn handle(&self, message: Message) -> Result<(), DomainError> {
        if let Some(utterance) = message.data_str("utterance") {
            println!("<< {}", utterance);
        }
        self.bus
            .emit(message.forward(AUDIO_OUTPUT_END, json!({})))
            .await
    }

    fn name(&self) -> &'static str {
        "ConsoleSpeech"
    }
}

struct ConverseResult;

#[async_trait]
impl MessageHandler for ConverseResult {
    async fn handle(&self, message: Message) -> Result<(), DomainError> {
        if message.data.get("result") != Some(&json!(true)) {
            println!("   (not handled by the skill)");
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ConverseResult"
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config.logging);

    let bus = Arc::new(InMemoryMessageBus::new());
    let sessions = Arc::new(InMemorySessionRegistry::new(config.skill.lang.clone()));
    sessions.attach(bus.as_ref());
    bus.on(SPEAK, Arc::new(ConsoleSpeech { bus: bus.clone() }));
    bus.on(CONVERSE_RESPONSE, Arc::new(ConverseResult));

    let ports = SkillPorts {
        bus: bus.clone(),
        sessions: sessions.clone(),
        resources: Arc::new(travel_resources()),
        settings: Arc::new(InMemorySettingsStore::new()),
    };
    let lang = config.skill.lang.clone();
    let skill_id = SkillId::new(SKILL_ID)?;
    let runtime = SkillRuntime::start(skill_id.clone(), Arc::new(TravelSkill), ports, config).await?;

    runtime
        .register_converse_intent(
            "book_flight",
            handler_fn(|rt: SkillRuntime, msg: Message| async move {
                let city = match msg.data_str("city") {
                    Some(city) => Some(city.to_string()),
                    None => {
                        let request = ResponseRequest::new()
                            .dialog("ask.destination")
                            .validator(|answer: &str| Validation::from(answer.split_whitespace().count() <= 3))
                            .on_fail_dialog("bad.destination")
                            .num_retries(2);
                        rt.get_response(&msg, request).await?
                    }
                };
                let Some(city) = city else {
                    return Err(HandlerError::Aborted);
                };
                let mut data = Map::new();
                data.insert("city".to_string(), json!(city));
                rt.speak_dialog(&msg, "booking", Some(&data), false, false).await?;
                Ok(())
            }),
        )
        .await?;
    runtime
        .activation()
        .activate(&Message::new("repl.start", json!({})), None)
        .await?;

    println!("Try \"book me a flight\", \"thanks\", \"stop\" or \"quit\".");
    let session_id = SessionId::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "quit" | "exit" => break,
            "stop" => {
                bus.emit(Message::new(GLOBAL_STOP, json!({}))).await?;
                continue;
            }
            _ => {}
        }

        let answering = sessions
            .find(&session_id)
            .is_some_and(|session| session.is_in_response_mode(&skill_id));
        let message = if answering {
            Message::new(
                skill_id.scoped("converse.get_response"),
                json!({ "utterances": [line] }),
            )
        } else {
            Message::new(
                skill_id.scoped("converse.request"),
                json!({ "utterances": [line], "lang": lang }),
            )
        };
        bus.emit(message).await?;
    }

    runtime.shutdown().await;
    Ok(())
}
