//! In-process message bus.
//!
//! Delivers messages by awaiting every handler registered for the exact
//! message type. Used by the REPL binary and by tests.
//!
//! # Panics
//!
//! Uses `.expect()` on lock operations, which panics if a lock is poisoned.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::trace;

use crate::domain::foundation::{DomainError, ErrorCode, Message};
use crate::ports::{MessageBus, MessageHandler, SubscriptionId};

type HandlerEntry = (SubscriptionId, Arc<dyn MessageHandler>);

/// In-memory message bus.
///
/// Features:
/// - Deterministic delivery (handlers awaited in registration order)
/// - Message capture for assertions
/// - Handler registration and removal
///
/// # Example
///
/// ```ignore
/// let bus = Arc::new(InMemoryMessageBus::new());
/// bus.emit(Message::new("speak", json!({"utterance": "hi"}))).await?;
/// assert!(bus.has_message("speak"));
/// ```
pub struct InMemoryMessageBus {
    handlers: RwLock<HashMap<String, Vec<HandlerEntry>>>,
    published: RwLock<Vec<Message>>,
    next_id: AtomicU64,
}

impl InMemoryMessageBus {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            published: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    // === Test Helpers ===

    /// Returns every emitted message.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn published(&self) -> Vec<Message> {
        self.published
            .read()
            .expect("InMemoryMessageBus: published lock poisoned")
            .clone()
    }

    /// Returns emitted messages of one type.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn messages_of_type(&self, msg_type: &str) -> Vec<Message> {
        self.published
            .read()
            .expect("InMemoryMessageBus: published lock poisoned")
            .iter()
            .filter(|m| m.msg_type == msg_type)
            .cloned()
            .collect()
    }

    /// Checks if a message type was emitted.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn has_message(&self, msg_type: &str) -> bool {
        self.published
            .read()
            .expect("InMemoryMessageBus: published lock poisoned")
            .iter()
            .any(|m| m.msg_type == msg_type)
    }

    /// Number of emitted messages.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn message_count(&self) -> usize {
        self.published
            .read()
            .expect("InMemoryMessageBus: published lock poisoned")
            .len()
    }

    /// Clears captured messages.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn clear(&self) {
        self.published
            .write()
            .expect("InMemoryMessageBus: published write lock poisoned")
            .clear();
    }

    /// Number of handlers registered for a type.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn handler_count(&self, msg_type: &str) -> usize {
        self.handlers
            .read()
            .expect("InMemoryMessageBus: handlers lock poisoned")
            .get(msg_type)
            .map_or(0, Vec::len)
    }

    /// Waits until the `nth` (0-based) message of a type has been emitted,
    /// polling every 10ms.
    pub async fn wait_for_nth(
        &self,
        msg_type: &str,
        nth: usize,
        timeout: Duration,
    ) -> Option<Message> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(found) = self.messages_of_type(msg_type).into_iter().nth(nth) {
                return Some(found);
            }
            if tokio::time::Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Waits until a message of a type has been emitted.
    pub async fn wait_for_message(&self, msg_type: &str, timeout: Duration) -> Option<Message> {
        self.wait_for_nth(msg_type, 0, timeout).await
    }
}

impl Default for InMemoryMessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn emit(&self, message: Message) -> Result<(), DomainError> {
        trace!(msg_type = %message.msg_type, "emit");
        self.published
            .write()
            .expect("InMemoryMessageBus: published write lock poisoned")
            .push(message.clone());

        // Clone handlers to release lock before await points
        let type_handlers: Vec<HandlerEntry> = {
            let handlers = self
                .handlers
                .read()
                .expect("InMemoryMessageBus: handlers lock poisoned");
            handlers.get(&message.msg_type).cloned().unwrap_or_default()
        };

        let mut errors = Vec::new();
        for (_, handler) in type_handlers {
            if let Err(e) = handler.handle(message.clone()).await {
                errors.push(format!("{}: {}", handler.name(), e));
            }
        }

        if !errors.is_empty() {
            return Err(DomainError::new(
                ErrorCode::BusError,
                format!("Handler errors: {}", errors.join(", ")),
            )
            .with_detail("msg_type", message.msg_type));
        }

        Ok(())
    }

    fn on(&self, msg_type: &str, handler: Arc<dyn MessageHandler>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .write()
            .expect("InMemoryMessageBus: handlers write lock poisoned")
            .entry(msg_type.to_string())
            .or_default()
            .push((id, handler));
        id
    }

    fn remove(&self, id: SubscriptionId) -> bool {
        let mut handlers = self
            .handlers
            .write()
            .expect("InMemoryMessageBus: handlers write lock poisoned");
        let mut removed = false;
        for entries in handlers.values_mut() {
            let before = entries.len();
            entries.retain(|(entry_id, _)| *entry_id != id);
            removed |= entries.len() != before;
        }
        handlers.retain(|_, entries| !entries.is_empty());
        removed
    }
}
