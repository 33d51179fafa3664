//! Skill handler trait and registration options.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

use super::errors::HandlerError;
use super::runtime::SkillRuntime;
use crate::domain::foundation::Message;

/// Message type prefix used for intent handler lifecycle notifications.
pub const SKILL_HANDLER_INFO: &str = "mycroft.skill.handler";

/// A handler a skill registers for a message type.
///
/// Handlers run on their own task, so they may block on
/// [`SkillRuntime::get_response`].
#[async_trait]
pub trait SkillHandler: Send + Sync {
    async fn handle(&self, runtime: SkillRuntime, message: Message) -> Result<(), HandlerError>;
}

/// Adapts an async closure into a [`SkillHandler`].
pub struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> SkillHandler for FnHandler<F>
where
    F: Fn(SkillRuntime, Message) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    async fn handle(&self, runtime: SkillRuntime, message: Message) -> Result<(), HandlerError> {
        (self.f)(runtime, message).await
    }
}

/// # Example
///
/// ```ignore
/// runtime.add_event(
///     "my_skill.converse:book_flight",
///     handler_fn(|rt: SkillRuntime, msg: Message| async move {
///         rt.speak_dialog(&msg, "booking", None, false, false).await?;
///         Ok(())
///     }),
///     HandlerOptions::intent(),
/// );
/// ```
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn SkillHandler>
where
    F: Fn(SkillRuntime, Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    Arc::new(FnHandler { f })
}

/// How the dispatch wrapper reports a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerOptions {
    /// Prefix for `.start`/`.complete`/`.error` notifications; none are sent
    /// without it.
    pub handler_info: Option<String>,
    /// Also emit `ovos.utterance.handled` on completion.
    pub is_intent: bool,
    /// `Some(true)` activates the skill before the handler runs,
    /// `Some(false)` deactivates it.
    pub activation: Option<bool>,
    /// Speak the localized error dialog on failure.
    pub speak_errors: bool,
}

impl HandlerOptions {
    pub fn new() -> Self {
        Self {
            handler_info: None,
            is_intent: false,
            activation: None,
            speak_errors: true,
        }
    }

    /// Options for intent handlers: lifecycle notifications under
    /// [`SKILL_HANDLER_INFO`] plus the handled notification.
    pub fn intent() -> Self {
        Self {
            handler_info: Some(SKILL_HANDLER_INFO.to_string()),
            is_intent: true,
            activation: None,
            speak_errors: true,
        }
    }

    /// System handlers: no notifications, no spoken errors.
    pub fn silent() -> Self {
        Self {
            speak_errors: false,
            ..Self::new()
        }
    }

    pub fn with_activation(mut self, activation: Option<bool>) -> Self {
        self.activation = activation;
        self
    }
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self::new()
    }
}
