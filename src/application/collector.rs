//! ResponseCollector - ask the user something and get validated text back.
//!
//! The caller task claims response mode for the session, speaks the prompt
//! and then polls the session's validated mailbox. The wait-and-validate
//! loop runs on a worker task that watches the pending mailbox:
//!
//! ```text
//! caller                         worker                      bus
//!   │ begin(session)               │                           │
//!   │ speak prompt                 │                           │
//!   │ spawn ──────────────────────►│ <skill>.get_response.waiting
//!   │                              │◄── <skill>.converse.get_response {utterances}
//!   │                              │ cancel voc? validate      │
//!   │                              │ ok ──► resolve(value)     │
//!   │                              │ bad ─► reprompt, rearm    │
//!   │ poll outcome every interval  │ empty timeout ─► retry or reject
//!   │◄─────────────────────────────┘                           │
//!   │ finish(session), release response mode                  │
//! ```
//!
//! Aborts cancel the worker's token and reject the session's mailbox, so
//! the caller returns within one poll interval.

use async_trait::async_trait;
use serde_json::{json, Map, Value as JsonValue};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::errors::HandlerError;
use super::runtime::SkillRuntime;
use crate::domain::foundation::{DomainError, Message, SessionId, StateMachine};
use crate::domain::response::{
    CollectionState, PendingSlot, RepromptFn, RetryBudget, Validation, ValidatedSlot, Validator,
};
use crate::domain::session::Session;
use crate::domain::vocabulary::Vocabulary;
use crate::ports::{MessageBus, MessageHandler, SubscriptionId};

pub const GET_RESPONSE_ENABLE: &str = "skill.converse.get_response.enable";
pub const GET_RESPONSE_DISABLE: &str = "skill.converse.get_response.disable";
pub const MIC_LISTEN: &str = "mycroft.mic.listen";
pub const ABORT_QUESTION: &str = "mycroft.skills.abort_question";

/// Recorder activity that extends the current wait.
pub const RECORD_BEGIN: &str = "recognizer_loop:record_begin";
pub const RECORD_END: &str = "recognizer_loop:record_end";

/// Vocabulary that cancels a question.
pub const CANCEL_VOCABULARY: &str = "cancel";

/// Reprompt after a rejected answer.
#[derive(Clone)]
pub enum OnFail {
    /// Dialog rendered with the request data plus `utterance`.
    Dialog(String),
    Callback(RepromptFn),
}

/// What to ask and how to judge the answer.
///
/// # Example
///
/// ```ignore
/// let request = ResponseRequest::new()
///     .dialog("ask.destination")
///     .validator(|answer: &str| Validation::from(answer.len() > 2))
///     .num_retries(2);
/// let city = runtime.get_response(&message, request).await?;
/// ```
#[derive(Clone)]
pub struct ResponseRequest {
    dialog: Option<String>,
    data: Map<String, JsonValue>,
    validator: Option<Validator>,
    on_fail: Option<OnFail>,
    num_retries: i32,
    wait: bool,
}

impl ResponseRequest {
    pub fn new() -> Self {
        Self {
            dialog: None,
            data: Map::new(),
            validator: None,
            on_fail: None,
            num_retries: -1,
            wait: true,
        }
    }

    /// Dialog key (or literal text) spoken before listening.
    pub fn dialog(mut self, dialog: impl Into<String>) -> Self {
        self.dialog = Some(dialog.into());
        self
    }

    pub fn data(mut self, data: Map<String, JsonValue>) -> Self {
        self.data = data;
        self
    }

    /// Without a validator every answer except a cancel phrase is accepted.
    pub fn validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&str) -> Validation + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn on_fail_dialog(mut self, dialog: impl Into<String>) -> Self {
        self.on_fail = Some(OnFail::Dialog(dialog.into()));
        self
    }

    /// Builds the reprompt from the rejected answer; an empty string just
    /// listens again.
    pub fn on_fail<F>(mut self, on_fail: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.on_fail = Some(OnFail::Callback(Arc::new(on_fail)));
        self
    }

    /// Empty-timeout cycles allowed before giving up; `-1` is unlimited.
    pub fn num_retries(mut self, num_retries: i32) -> Self {
        self.num_retries = num_retries;
        self
    }

    /// Whether to wait for the prompt to be spoken before listening.
    pub fn wait(mut self, wait: bool) -> Self {
        self.wait = wait;
        self
    }
}

impl Default for ResponseRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl SkillRuntime {
    /// Asks the user for a reply in the session of `source`.
    ///
    /// Returns the accepted (possibly normalized) answer, or `None` when the
    /// user cancelled, the retry budget ran out, or the question was aborted.
    ///
    /// # Errors
    ///
    /// - `ResponseModeConflict` if the session is already collecting a reply
    /// - bus errors while prompting
    pub async fn get_response(
        &self,
        source: &Message,
        request: ResponseRequest,
    ) -> Result<Option<String>, HandlerError> {
        let inner = &self.inner;
        let skill_id = &inner.skill_id;

        // 1. Claim response mode and open the session's mailboxes
        let session_id = inner.ports.sessions.get(source).session_id;
        let session = inner
            .ports
            .sessions
            .enable_response_mode(&session_id, skill_id)?;
        if let Err(e) = inner.mailboxes.begin(&session_id) {
            inner.ports.sessions.disable_response_mode(&session_id, skill_id);
            return Err(e.into());
        }

        let message = source
            .clone()
            .with_context("session", session.to_context());
        let token = CancellationToken::new();
        inner.collectors.insert(session_id.clone(), token.clone());
        let guard = CollectionGuard {
            runtime: self.clone(),
            session_id: session_id.clone(),
            message: message.clone(),
            token: token.clone(),
            armed: true,
        };
        debug!(skill_id = %skill_id, session_id = %session_id, "Collecting response");
        self.publish(message.forward(GET_RESPONSE_ENABLE, self.skill_data()))
            .await;

        // 2. Prompt, or listen straight away
        let lang = session.lang.clone();
        let prompt = match &request.dialog {
            Some(dialog) => {
                let text = self.render_dialog(&lang, dialog, &request.data).await;
                self.speak(&message, &text, true, request.wait).await?;
                text
            }
            None => {
                inner
                    .ports
                    .bus
                    .emit(message.forward(MIC_LISTEN, json!({})))
                    .await?;
                String::new()
            }
        };

        // 3. Run the wait/validate loop on its own task
        let worker = ResponseWorker {
            runtime: self.clone(),
            message: message.clone(),
            session_id: session_id.clone(),
            cancel_vocabulary: self.vocabulary(&lang, CANCEL_VOCABULARY).await,
            validator: request.validator.clone(),
            on_fail: request.on_fail.clone(),
            prompt,
            data: request.data.clone(),
            lang,
            budget: RetryBudget::new(request.num_retries),
        };
        let worker_token = token.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = worker_token.cancelled() => CollectionState::Aborted,
                state = worker.run() => state,
            }
        });

        // 4. Poll the validated mailbox
        let mut interval = tokio::time::interval(inner.config.response.poll_interval());
        loop {
            interval.tick().await;
            let settled = inner
                .mailboxes
                .outcome(&session_id)
                .map_or(true, |slot| slot.is_settled());
            if settled || handle.is_finished() {
                break;
            }
        }

        let answer = guard.finish().await;
        match handle.await {
            Ok(state) => debug!(session_id = %session_id, state = %state, "Response collection ended"),
            Err(e) => warn!(session_id = %session_id, error = %e, "Response worker failed"),
        }
        Ok(answer)
    }

    /// Routes a reply to the session's waiting collection, if any.
    pub(super) fn handle_response_delivery(&self, message: &Message) {
        let session_id = Session::id_from_message(message);
        if !self.inner.mailboxes.is_open(&session_id) {
            debug!(session_id = %session_id, "Ignoring get_response answer for session");
            return;
        }
        let utterances = message.data_strings("utterances");
        if !self.inner.mailboxes.deliver(&session_id, utterances) {
            debug!(session_id = %session_id, "Answer arrived outside a wait cycle");
        }
    }

    /// `mycroft.skills.abort_question {skill_id, session_id?}`.
    pub(super) async fn handle_abort_question(&self, message: &Message) -> Result<(), DomainError> {
        if message.data_str("skill_id") != Some(self.inner.skill_id.as_str()) {
            return Ok(());
        }
        let scope = message.data_str("session_id").map(SessionId::from_string);
        self.kill_responses(message, scope.as_ref()).await
    }

    /// Aborts collections (one session, or all) and announces the kill.
    pub(super) async fn kill_responses(
        &self,
        message: &Message,
        scope: Option<&SessionId>,
    ) -> Result<(), DomainError> {
        let killed = self.abort_collections(scope);
        if killed.is_empty() {
            return Ok(());
        }
        info!(
            skill_id = %self.inner.skill_id,
            sessions = killed.len(),
            "Response collection aborted"
        );
        self.inner
            .ports
            .bus
            .emit(message.forward(self.inner.skill_id.scoped("get_response.killed"), json!({})))
            .await
    }

    /// Rejects the mailboxes and cancels the workers of `scope` (every
    /// session when `None`). Returns the sessions that had a collection.
    pub(super) fn abort_collections(&self, scope: Option<&SessionId>) -> Vec<SessionId> {
        let mailboxes = &self.inner.mailboxes;
        let sessions = match scope {
            Some(session_id) if mailboxes.cancel(session_id) => vec![session_id.clone()],
            Some(_) => Vec::new(),
            None => mailboxes.cancel_all(),
        };
        for session_id in &sessions {
            if let Some((_, token)) = self.inner.collectors.remove(session_id) {
                token.cancel();
            }
        }
        sessions
    }

    /// Whether a collection is open for the session.
    pub fn is_collecting(&self, session_id: &SessionId) -> bool {
        self.inner.mailboxes.is_open(session_id)
    }
}

/// Releases everything a collection claimed. Dropping it while armed (the
/// caller's future was cancelled) cleans up as well.
struct CollectionGuard {
    runtime: SkillRuntime,
    session_id: SessionId,
    message: Message,
    token: CancellationToken,
    armed: bool,
}

impl CollectionGuard {
    fn release(&self) -> Option<ValidatedSlot> {
        let inner = &self.runtime.inner;
        self.token.cancel();
        inner.collectors.remove(&self.session_id);
        let outcome = inner.mailboxes.finish(&self.session_id);
        inner
            .ports
            .sessions
            .disable_response_mode(&self.session_id, &inner.skill_id);
        outcome
    }

    fn disable_message(&self) -> Message {
        let mut message = self
            .message
            .forward(GET_RESPONSE_DISABLE, self.runtime.skill_data());
        if let Some(session) = self.runtime.inner.ports.sessions.find(&self.session_id) {
            message
                .context
                .insert("session".to_string(), session.to_context());
        }
        message
    }

    async fn finish(mut self) -> Option<String> {
        self.armed = false;
        let outcome = self.release();
        self.runtime.publish(self.disable_message()).await;
        outcome.and_then(ValidatedSlot::into_value)
    }
}

impl Drop for CollectionGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        debug!(session_id = %self.session_id, "Response collection dropped before completion");
        self.release();
        let runtime = self.runtime.clone();
        let message = self.disable_message();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move { runtime.publish(message).await });
        }
    }
}

enum WaitOutcome {
    Answered(String),
    TimedOut,
    /// The pending mailbox was closed or removed.
    Closed,
}

struct ResponseWorker {
    runtime: SkillRuntime,
    message: Message,
    session_id: SessionId,
    cancel_vocabulary: Vocabulary,
    validator: Option<Validator>,
    on_fail: Option<OnFail>,
    /// Rendered prompt, the default reprompt.
    prompt: String,
    data: Map<String, JsonValue>,
    lang: String,
    budget: RetryBudget,
}

impl ResponseWorker {
    async fn run(mut self) -> CollectionState {
        let runtime = self.runtime.clone();
        let mailboxes = &runtime.inner.mailboxes;
        runtime
            .publish(
                self.message
                    .forward(runtime.inner.skill_id.scoped("get_response.waiting"), json!({})),
            )
            .await;

        let mut state = CollectionState::Idle;
        self.advance(&mut state, CollectionState::Waiting);

        loop {
            let mut reprompt = String::new();

            match self.wait_for_answer().await {
                WaitOutcome::Closed => {
                    debug!(session_id = %self.session_id, "get_response aborted");
                    return self.advance(&mut state, CollectionState::Aborted);
                }
                WaitOutcome::Answered(answer) => {
                    if self.cancel_vocabulary.matches(&answer, false) {
                        info!(session_id = %self.session_id, "User cancelled the question");
                        mailboxes.reject(&self.session_id);
                        return self.advance(&mut state, CollectionState::Rejected);
                    }

                    let verdict = self
                        .validator
                        .as_ref()
                        .map_or(Validation::Valid, |validate| validate(&answer));
                    if let Some(value) = verdict.accepted_value(&answer) {
                        mailboxes.resolve(&self.session_id, value);
                        return self.advance(&mut state, CollectionState::Resolved);
                    }

                    reprompt = self.reprompt(&answer).await;
                    mailboxes.rearm(&self.session_id);
                    if !reprompt.is_empty() {
                        // the user said something and the question was reformulated
                        self.budget.reset();
                    }
                    self.advance(&mut state, CollectionState::Retry);
                }
                WaitOutcome::TimedOut => {
                    let exhausted = self.budget.record_empty_timeout();
                    debug!(
                        session_id = %self.session_id,
                        num_fails = self.budget.num_fails(),
                        "No answer within timeout"
                    );
                    if exhausted {
                        mailboxes.reject(&self.session_id);
                        return self.advance(&mut state, CollectionState::Rejected);
                    }
                    self.advance(&mut state, CollectionState::Retry);
                }
            }

            if matches!(
                mailboxes.pending(&self.session_id),
                None | Some(PendingSlot::Cancelled)
            ) {
                return self.advance(&mut state, CollectionState::Aborted);
            }

            if reprompt.is_empty() {
                runtime
                    .publish(self.message.reply(MIC_LISTEN, json!({})))
                    .await;
            } else if let Err(e) = runtime.speak(&self.message, &reprompt, true, false).await {
                warn!(session_id = %self.session_id, error = %e, "Reprompt failed");
            }
            self.advance(&mut state, CollectionState::Waiting);
        }
    }

    fn advance(&self, state: &mut CollectionState, next: CollectionState) -> CollectionState {
        match state.transition_to(next) {
            Ok(next) => {
                debug!(session_id = %self.session_id, from = %state, to = %next, "Collection state");
                *state = next;
            }
            Err(e) => warn!(session_id = %self.session_id, error = %e, "Unexpected collection state"),
        }
        *state
    }

    async fn reprompt(&self, answer: &str) -> String {
        match &self.on_fail {
            Some(OnFail::Callback(on_fail)) => on_fail(answer),
            Some(OnFail::Dialog(dialog)) => {
                let mut data = self.data.clone();
                data.insert("utterance".to_string(), json!(answer));
                self.runtime.render_dialog(&self.lang, dialog, &data).await
            }
            None => self.prompt.clone(),
        }
    }

    /// One wait cycle: the first answer delivered, or a timeout. Recorder
    /// activity for the session restarts the clock.
    async fn wait_for_answer(&self) -> WaitOutcome {
        let inner = &self.runtime.inner;
        let timeout = inner.config.response.timeout();
        let poll = inner.config.response.poll_interval();

        let (clock, mut restarted) = watch::channel(Instant::now());
        let _extension = ExtensionSubscription::register(
            &inner.ports.bus,
            Arc::new(WaitExtensionHandler {
                session_id: self.session_id.clone(),
                clock,
            }),
        );

        let mut started = Instant::now();
        loop {
            match inner.mailboxes.pending(&self.session_id) {
                None | Some(PendingSlot::Cancelled) => return WaitOutcome::Closed,
                Some(PendingSlot::HasUtterances(utterances)) => {
                    // alternate transcriptions beyond the first are ignored
                    if let Some(first) = utterances.into_iter().next() {
                        return WaitOutcome::Answered(first);
                    }
                }
                Some(PendingSlot::Empty) => {}
            }

            if restarted.has_changed().unwrap_or(false) {
                started = *restarted.borrow_and_update();
                debug!(session_id = %self.session_id, "Extending get_response wait time");
            }
            if started.elapsed() > timeout {
                return WaitOutcome::TimedOut;
            }
            tokio::time::sleep(poll).await;
        }
    }
}

/// Recorder subscriptions for one wait cycle, removed on drop.
struct ExtensionSubscription {
    bus: Arc<dyn MessageBus>,
    ids: Vec<SubscriptionId>,
}

impl ExtensionSubscription {
    fn register(bus: &Arc<dyn MessageBus>, handler: Arc<WaitExtensionHandler>) -> Self {
        let ids = [RECORD_BEGIN, RECORD_END]
            .iter()
            .map(|msg_type| bus.on(msg_type, handler.clone()))
            .collect();
        Self {
            bus: Arc::clone(bus),
            ids,
        }
    }
}

impl Drop for ExtensionSubscription {
    fn drop(&mut self) {
        for id in self.ids.drain(..) {
            self.bus.remove(id);
        }
    }
}

struct WaitExtensionHandler {
    session_id: SessionId,
    clock: watch::Sender<Instant>,
}

#[async_trait]
impl MessageHandler for WaitExtensionHandler {
    async fn handle(&self, message: Message) -> Result<(), DomainError> {
        if Session::id_from_message(&message) == self.session_id {
            self.clock.send_replace(Instant::now());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "WaitExtensionHandler"
    }
}
