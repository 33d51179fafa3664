//! Integration tests for response collection.
//!
//! These tests drive `get_response` the way a running system does:
//! 1. A skill handler asks a question in some session
//! 2. The user's utterances arrive as `<skill>.converse.get_response`
//! 3. Abort and stop signals arrive on the bus at any time
//!
//! Uses the in-memory adapters, so no external services are needed.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

use skill_converse::adapters::{
    InMemoryMessageBus, InMemoryResourceLoader, InMemorySessionRegistry, InMemorySettingsStore,
    AUDIO_OUTPUT_END,
};
use skill_converse::application::{
    ConverseSkill, HandlerError, ResponseRequest, SkillPorts, SkillRuntime, ABORT_QUESTION,
    GET_RESPONSE_DISABLE, GET_RESPONSE_ENABLE, GLOBAL_STOP, MIC_LISTEN, RECORD_BEGIN,
};
use skill_converse::config::AppConfig;
use skill_converse::domain::foundation::{DomainError, ErrorCode, Message, SkillId};
use skill_converse::domain::resources::ResourceKind;
use skill_converse::domain::response::Validation;
use skill_converse::domain::session::Session;
use skill_converse::ports::{MessageBus, MessageHandler, SessionRegistry};

// =============================================================================
// Test Infrastructure
// =============================================================================

const SKILL: &str = "travel.skill";
const WAITING: &str = "travel.skill.get_response.waiting";

struct QuietSkill;

#[async_trait]
impl ConverseSkill for QuietSkill {
    async fn converse(
        &self,
        _runtime: &SkillRuntime,
        _message: &Message,
        _utterances: &[String],
        _lang: &str,
    ) -> Result<bool, HandlerError> {
        Ok(false)
    }

    async fn handle_activate(&self, _: &SkillRuntime, _: &Message) -> Result<(), HandlerError> {
        Ok(())
    }

    async fn handle_deactivate(&self, _: &SkillRuntime, _: &Message) -> Result<(), HandlerError> {
        Ok(())
    }
}

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

struct World {
    runtime: SkillRuntime,
    bus: Arc<InMemoryMessageBus>,
    sessions: Arc<InMemorySessionRegistry>,
}

fn config(timeout_secs: u64) -> AppConfig {
    let mut config = AppConfig::default();
    config.response.timeout_secs = timeout_secs;
    config.response.speak_wait_secs = 1;
    config.response.poll_interval_ms = 20;
    config
}

async fn world_with(config: AppConfig) -> World {
    let bus = Arc::new(InMemoryMessageBus::new());
    let sessions = Arc::new(InMemorySessionRegistry::new("en-US"));
    sessions.attach(bus.as_ref());
    bus.on("speak", Arc::new(InstantSpeech { bus: bus.clone() }));

    let resources = InMemoryResourceLoader::new()
        .with("en-US", ResourceKind::Dialog, "ask.city", "Which city?")
        .with("pt-PT", ResourceKind::Dialog, "ask.city", "Que cidade?");
    let ports = SkillPorts {
        bus: bus.clone(),
        sessions: sessions.clone(),
        resources: Arc::new(resources),
        settings: Arc::new(InMemorySettingsStore::new()),
    };
    let runtime = SkillRuntime::start(SkillId::new(SKILL).unwrap(), Arc::new(QuietSkill), ports, config)
        .await
        .unwrap();

    World {
        runtime,
        bus,
        sessions,
    }
}

async fn world() -> World {
    world_with(config(1)).await
}

fn in_session(msg_type: &str, data: serde_json::Value, session: &str, lang: &str) -> Message {
    Message::new(msg_type, data).with_context("session", Session::new(session.into(), lang).to_context())
}

fn source(session: &str) -> Message {
    in_session("travel.skill.converse:book_flight", json!({}), session, "en-US")
}

fn answer(session: &str, utterances: &[&str]) -> Message {
    in_session(
        "travel.skill.converse.get_response",
        json!({ "utterances": utterances }),
        session,
        "en-US",
    )
}

fn ask(
    world: &World,
    session: &'static str,
    request: ResponseRequest,
) -> tokio::task::JoinHandle<Result<Option<String>, HandlerError>> {
    let runtime = world.runtime.clone();
    tokio::spawn(async move { runtime.get_response(&source(session), request).await })
}

// =============================================================================
// Answers
// =============================================================================

#[tokio::test]
async fn prompt_is_spoken_in_session_language_then_answer_returned() {
    let world = world().await;
    let runtime = world.runtime.clone();
    let task = tokio::spawn(async move {
        let source = in_session("travel.skill.converse:book_flight", json!({}), "pt", "pt-PT");
        runtime.get_response(&source, ResponseRequest::new().dialog("ask.city")).await
    });

    world.bus.wait_for_message(WAITING, Duration::from_secs(1)).await.unwrap();
    let spoken = world.bus.messages_of_type("speak");
    assert_eq!(spoken[0].data["utterance"], "Que cidade?");
    assert_eq!(spoken[0].data["expect_response"], true);

    world
        .bus
        .emit(in_session(
            "travel.skill.converse.get_response",
            json!({ "utterances": ["Lisboa"] }),
            "pt",
            "pt-PT",
        ))
        .await
        .unwrap();

    assert_eq!(task.await.unwrap().unwrap().as_deref(), Some("Lisboa"));
}

#[tokio::test]
async fn only_first_alternate_transcription_is_validated() {
    let world = world().await;
    let task = ask(
        &world,
        "s1",
        ResponseRequest::new().validator(|answer: &str| Validation::from(answer == "paris")),
    );

    world.bus.wait_for_message(WAITING, Duration::from_secs(1)).await.unwrap();
    world.bus.emit(answer("s1", &["berlin", "paris"])).await.unwrap();
    // rejected, reprompted with the original (empty) prompt, so just relistens
    assert!(world
        .bus
        .wait_for_nth(MIC_LISTEN, 1, Duration::from_secs(1))
        .await
        .is_some());
    world.bus.emit(answer("s1", &["paris"])).await.unwrap();

    assert_eq!(task.await.unwrap().unwrap().as_deref(), Some("paris"));
}

#[tokio::test]
async fn normalized_value_wins_over_raw_text() {
    let world = world().await;
    let task = ask(
        &world,
        "s1",
        ResponseRequest::new().validator(|answer: &str| {
            Validation::from(answer.contains("sure").then(|| "yes".to_string()))
        }),
    );

    world.bus.wait_for_message(WAITING, Duration::from_secs(1)).await.unwrap();
    world.bus.emit(answer("s1", &["yeah sure"])).await.unwrap();

    assert_eq!(task.await.unwrap().unwrap().as_deref(), Some("yes"));
}

#[tokio::test]
async fn callback_reprompt_is_spoken_without_waiting() {
    let world = world().await;
    let task = ask(
        &world,
        "s1",
        ResponseRequest::new()
            .dialog("ask.city")
            .validator(|answer: &str| Validation::from(answer != "mars"))
            .on_fail(|answer: &str| format!("{} is not on Earth", answer)),
    );

    world.bus.wait_for_message(WAITING, Duration::from_secs(1)).await.unwrap();
    world.bus.emit(answer("s1", &["mars"])).await.unwrap();
    let reprompt = world
        .bus
        .wait_for_nth("speak", 1, Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(reprompt.data["utterance"], "mars is not on Earth");
    assert_eq!(reprompt.data["expect_response"], true);

    world.bus.emit(answer("s1", &["rome"])).await.unwrap();
    assert_eq!(task.await.unwrap().unwrap().as_deref(), Some("rome"));
}

// =============================================================================
// No answer
// =============================================================================

#[tokio::test]
async fn cancel_vocabulary_returns_none_even_if_valid() {
    let world = world().await;
    let task = ask(
        &world,
        "s1",
        ResponseRequest::new().validator(|_: &str| Validation::Valid),
    );

    world.bus.wait_for_message(WAITING, Duration::from_secs(1)).await.unwrap();
    world.bus.emit(answer("s1", &["forget it"])).await.unwrap();

    assert_eq!(task.await.unwrap().unwrap(), None);
    assert!(world.bus.has_message(GET_RESPONSE_DISABLE));
}

#[tokio::test]
async fn two_empty_cycles_exhaust_two_retries() {
    let world = world().await;
    let started = Instant::now();

    let result = world
        .runtime
        .get_response(&source("s1"), ResponseRequest::new().num_retries(2))
        .await
        .unwrap();

    assert_eq!(result, None);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(2), "gave up after {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(4), "took {:?}", elapsed);
}

#[tokio::test]
async fn unlimited_retries_still_stop_after_two_empty_cycles() {
    let world = world().await;

    let result = world
        .runtime
        .get_response(&source("s1"), ResponseRequest::new())
        .await
        .unwrap();

    assert_eq!(result, None);
    assert_eq!(world.bus.messages_of_type(MIC_LISTEN).len(), 2);
}

#[tokio::test]
async fn recording_activity_extends_the_wait() {
    let world = world().await;
    let task = ask(&world, "s1", ResponseRequest::new().num_retries(1));
    world.bus.wait_for_message(WAITING, Duration::from_secs(1)).await.unwrap();

    // keep the user "talking" past the one second timeout
    for _ in 0..3 {
        tokio::time::sleep(Duration::from_millis(500)).await;
        world
            .bus
            .emit(in_session(RECORD_BEGIN, json!({}), "s1", "en-US"))
            .await
            .unwrap();
    }
    world.bus.emit(answer("s1", &["madrid"])).await.unwrap();

    assert_eq!(task.await.unwrap().unwrap().as_deref(), Some("madrid"));
}

// =============================================================================
// Aborts and concurrency
// =============================================================================

#[tokio::test]
async fn abort_question_ends_collection_within_a_poll_interval() {
    let world = world_with(config(30)).await;
    let task = ask(&world, "s1", ResponseRequest::new());
    world.bus.wait_for_message(WAITING, Duration::from_secs(1)).await.unwrap();

    let aborted = Instant::now();
    world
        .bus
        .emit(Message::new(ABORT_QUESTION, json!({ "skill_id": SKILL })))
        .await
        .unwrap();

    assert_eq!(task.await.unwrap().unwrap(), None);
    assert!(aborted.elapsed() < Duration::from_millis(500));
    assert!(world.bus.has_message("travel.skill.get_response.killed"));
}

#[tokio::test]
async fn session_scoped_abort_leaves_other_sessions_running() {
    let world = world_with(config(30)).await;
    let first = ask(&world, "s1", ResponseRequest::new());
    let second = ask(&world, "s2", ResponseRequest::new());
    world
        .bus
        .wait_for_nth(WAITING, 1, Duration::from_secs(1))
        .await
        .unwrap();

    world
        .bus
        .emit(Message::new(
            ABORT_QUESTION,
            json!({ "skill_id": SKILL, "session_id": "s1" }),
        ))
        .await
        .unwrap();
    assert_eq!(first.await.unwrap().unwrap(), None);

    world.bus.emit(answer("s2", &["oslo"])).await.unwrap();
    assert_eq!(second.await.unwrap().unwrap().as_deref(), Some("oslo"));
}

#[tokio::test]
async fn global_stop_aborts_every_session() {
    let world = world_with(config(30)).await;
    let first = ask(&world, "s1", ResponseRequest::new());
    let second = ask(&world, "s2", ResponseRequest::new());
    world
        .bus
        .wait_for_nth(WAITING, 1, Duration::from_secs(1))
        .await
        .unwrap();

    world.bus.emit(Message::new(GLOBAL_STOP, json!({}))).await.unwrap();

    assert_eq!(first.await.unwrap().unwrap(), None);
    assert_eq!(second.await.unwrap().unwrap(), None);
}

#[tokio::test]
async fn concurrent_sessions_keep_their_own_answers() {
    let world = world().await;
    let first = ask(&world, "s1", ResponseRequest::new());
    let second = ask(&world, "s2", ResponseRequest::new());
    world
        .bus
        .wait_for_nth(WAITING, 1, Duration::from_secs(1))
        .await
        .unwrap();

    world.bus.emit(answer("s2", &["tokyo"])).await.unwrap();
    world.bus.emit(answer("s1", &["lima"])).await.unwrap();

    assert_eq!(first.await.unwrap().unwrap().as_deref(), Some("lima"));
    assert_eq!(second.await.unwrap().unwrap().as_deref(), Some("tokyo"));
    assert_eq!(world.bus.messages_of_type(GET_RESPONSE_ENABLE).len(), 2);
    assert_eq!(world.bus.messages_of_type(GET_RESPONSE_DISABLE).len(), 2);
}

#[tokio::test]
async fn second_collection_in_same_session_conflicts() {
    let world = world().await;
    let first = ask(&world, "s1", ResponseRequest::new());
    world.bus.wait_for_message(WAITING, Duration::from_secs(1)).await.unwrap();

    let second = world
        .runtime
        .get_response(&source("s1"), ResponseRequest::new())
        .await;
    match second {
        Err(HandlerError::Domain(e)) => assert_eq!(e.code, ErrorCode::ResponseModeConflict),
        other => panic!("expected a conflict, got {:?}", other),
    }

    world.bus.emit(answer("s1", &["quito"])).await.unwrap();
    assert_eq!(first.await.unwrap().unwrap().as_deref(), Some("quito"));

    let session = world.sessions.find(&"s1".into()).unwrap();
    assert!(session.response_mode.is_none());
}
