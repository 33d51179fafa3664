//! EventDispatchWrapper - uniform lifecycle around every skill handler call.
//!
//! ```text
//! <info>.start ─► handler ─┬─ Ok / Aborted ─► store settings if changed
//!                          │                  <info>.complete [+ ovos.utterance.handled]
//!                          └─ Err ──────────► log, speak "skill.error", <info>.error
//! ```
//!
//! Notifications are only sent when the handler was registered with a
//! `handler_info` prefix.

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::{json, Map, Value as JsonValue};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};
use tracing::{debug, error, info};

use super::errors::HandlerError;
use super::handler::{HandlerOptions, SkillHandler};
use super::runtime::{Inner, SkillRuntime};
use crate::domain::dialog::camel_case_split;
use crate::domain::foundation::{DomainError, Message};
use crate::domain::session::Session;
use crate::ports::MessageHandler;

/// Notification sent after an intent handler completes.
pub const UTTERANCE_HANDLED: &str = "ovos.utterance.handled";

/// Dialog spoken when a handler fails.
pub const SKILL_ERROR_DIALOG: &str = "skill.error";

/// How a wrapped handler call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Completed,
    /// Cancelled through [`HandlerError::Aborted`]; reported as completed.
    Aborted,
    Failed(String),
}

pub struct EventDispatchWrapper {
    runtime: SkillRuntime,
    handler: Arc<dyn SkillHandler>,
    options: HandlerOptions,
    name: String,
}

impl EventDispatchWrapper {
    pub fn new(
        runtime: SkillRuntime,
        handler: Arc<dyn SkillHandler>,
        options: HandlerOptions,
        name: impl Into<String>,
    ) -> Self {
        Self {
            runtime,
            handler,
            options,
            name: name.into(),
        }
    }

    /// Runs the handler for `message`. Never fails: errors and panics are
    /// reported on the bus and returned as [`DispatchOutcome::Failed`].
    pub async fn dispatch(&self, message: Message) -> DispatchOutcome {
        let skill_data = json!({ "name": self.name });
        self.on_start(&message, &skill_data).await;

        let call = self.handler.handle(self.runtime.clone(), message.clone());
        let result = match AssertUnwindSafe(call).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(HandlerError::failed(panic_message(panic))),
        };

        match result {
            Ok(()) => {
                self.on_end(&message, &skill_data).await;
                DispatchOutcome::Completed
            }
            Err(HandlerError::Aborted) => {
                info!(skill_id = %self.runtime.skill_id(), handler = %self.name, "Skill execution aborted");
                self.on_end(&message, &skill_data).await;
                DispatchOutcome::Aborted
            }
            Err(e) => {
                self.on_error(&e, &message, skill_data).await;
                DispatchOutcome::Failed(e.to_string())
            }
        }
    }

    fn notification(&self, message: &Message, suffix: &str, data: &JsonValue) -> Option<Message> {
        let info = self.options.handler_info.as_deref()?;
        Some(
            message
                .forward(format!("{}.{}", info, suffix), data.clone())
                .with_context("skill_id", json!(self.runtime.skill_id().as_str())),
        )
    }

    async fn on_start(&self, message: &Message, skill_data: &JsonValue) {
        if let Some(start) = self.notification(message, "start", skill_data) {
            self.runtime.publish(start).await;
        }

        let activation = self.runtime.activation();
        let result = match self.options.activation {
            Some(true) => activation.activate(message, None).await,
            Some(false) => activation.deactivate(message).await,
            None => Ok(()),
        };
        if let Err(e) = result {
            error!(skill_id = %self.runtime.skill_id(), error = %e, "Activation request failed");
        }
    }

    async fn on_end(&self, message: &Message, skill_data: &JsonValue) {
        if let Err(e) = self.runtime.store_settings_if_changed().await {
            error!(skill_id = %self.runtime.skill_id(), error = %e, "Failed to update settings");
        }

        if let Some(complete) = self.notification(message, "complete", skill_data) {
            self.runtime.publish(complete).await;
        }
        if self.options.is_intent {
            self.runtime
                .publish(message.forward(UTTERANCE_HANDLED, skill_data.clone()))
                .await;
        }
    }

    async fn on_error(&self, err: &HandlerError, message: &Message, mut skill_data: JsonValue) {
        error!(
            skill_id = %self.runtime.skill_id(),
            handler = %self.name,
            error = ?err,
            "Error handling event"
        );

        if self.options.speak_errors {
            let lang = Session::lang_from_message(message)
                .unwrap_or_else(|| self.runtime.sessions().get(message).lang);
            let mut data = Map::new();
            data.insert(
                "skill".to_string(),
                json!(camel_case_split(&self.runtime.skill_name())),
            );
            let speech = self
                .runtime
                .render_dialog(&lang, SKILL_ERROR_DIALOG, &data)
                .await;
            if let Err(e) = self.runtime.speak(message, &speech, false, false).await {
                debug!(error = %e, "Could not speak error dialog");
            }
        }

        skill_data["exception"] = json!(format!("{:?}", err));
        if let Some(failed) = self.notification(message, "error", &skill_data) {
            self.runtime.publish(failed).await;
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_string())
}

/// Bus handler that runs a [`SkillHandler`] through the wrapper on its own
/// task.
pub(super) struct WrappedHandler {
    runtime: Weak<Inner>,
    handler: Arc<dyn SkillHandler>,
    options: HandlerOptions,
    name: String,
}

impl WrappedHandler {
    pub(super) fn new(
        runtime: Weak<Inner>,
        handler: Arc<dyn SkillHandler>,
        options: HandlerOptions,
        name: &str,
    ) -> Self {
        Self {
            runtime,
            handler,
            options,
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl MessageHandler for WrappedHandler {
    async fn handle(&self, message: Message) -> Result<(), DomainError> {
        let Some(runtime) = SkillRuntime::upgrade(&self.runtime) else {
            return Ok(());
        };
        let wrapper = EventDispatchWrapper::new(
            runtime,
            Arc::clone(&self.handler),
            self.options.clone(),
            self.name.clone(),
        );
        tokio::spawn(async move {
            wrapper.dispatch(message).await;
        });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "WrappedSkillHandler"
    }
}
