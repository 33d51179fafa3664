//! MessageBus port - Interface to the messagebus shared by skills and the
//! intent service.
//!
//! This port defines how a skill emits and receives [`Message`]s without
//! knowing about the underlying transport (in-process, websocket, ...).

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

use crate::domain::foundation::{DomainError, Message};

/// Handle returned by [`MessageBus::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Handler for messages of one type.
///
/// Implementations should be:
/// - **Quick** - Long work belongs in a spawned task
/// - **Isolated** - Errors don't affect other handlers
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: Message) -> Result<(), DomainError>;

    /// Handler name for logging.
    fn name(&self) -> &'static str;
}

/// Port for the messagebus.
///
/// # Example
///
/// ```ignore
/// let id = bus.on("my_skill.converse.ping", handler);
/// bus.emit(Message::new("my_skill.converse.ping", json!({}))).await?;
/// bus.remove(id);
/// ```
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Delivers a message to every handler registered for its type.
    async fn emit(&self, message: Message) -> Result<(), DomainError>;

    /// Registers a handler for an exact message type.
    fn on(&self, msg_type: &str, handler: Arc<dyn MessageHandler>) -> SubscriptionId;

    /// Unregisters a handler; returns false if it was already gone.
    fn remove(&self, id: SubscriptionId) -> bool;

    /// Emits `message` and waits for the first `reply_type` message.
    ///
    /// Returns `None` when nothing arrives within `timeout`.
    async fn wait_for_response(
        &self,
        message: Message,
        reply_type: &str,
        timeout: Duration,
    ) -> Result<Option<Message>, DomainError> {
        let (tx, rx) = oneshot::channel();
        let id = self.on(reply_type, Arc::new(ReplyCatcher::new(tx)));

        if let Err(e) = self.emit(message).await {
            self.remove(id);
            return Err(e);
        }

        let reply = tokio::time::timeout(timeout, rx).await.ok().and_then(Result::ok);
        self.remove(id);
        Ok(reply)
    }
}

/// Forwards the first message it sees into a oneshot channel.
struct ReplyCatcher {
    sender: Mutex<Option<oneshot::Sender<Message>>>,
}

impl ReplyCatcher {
    fn new(sender: oneshot::Sender<Message>) -> Self {
        Self {
            sender: Mutex::new(Some(sender)),
        }
    }
}

#[async_trait]
impl MessageHandler for ReplyCatcher {
    async fn handle(&self, message: Message) -> Result<(), DomainError> {
        let sender = match self.sender.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(sender) = sender {
            // receiver may have timed out already
            let _ = sender.send(message);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ReplyCatcher"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_bus_object_safe(_: &dyn MessageBus) {}

    #[allow(dead_code)]
    fn assert_handler_object_safe(_: &dyn MessageHandler) {}

    #[tokio::test]
    async fn reply_catcher_only_forwards_once() {
        let (tx, rx) = oneshot::channel();
        let catcher = ReplyCatcher::new(tx);
        catcher
            .handle(Message::new("first", serde_json::json!({})))
            .await
            .unwrap();
        catcher
            .handle(Message::new("second", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(rx.await.unwrap().msg_type, "first");
    }
}
