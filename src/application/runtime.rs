//! SkillRuntime - wires one [`ConverseSkill`] to the bus and its collaborators.
//!
//! The runtime registers two kinds of bus handlers:
//!
//! - **System handlers** run inline on the emitting task. They only touch
//!   the session-keyed mailboxes or cancellation tokens and reply at once
//!   (pings, utterance delivery, abort and timeout signals).
//! - **Skill handlers** (converse requests, lifecycle hooks, intents) go
//!   through [`EventDispatchWrapper`](super::EventDispatchWrapper) on a
//!   spawned task, since they may block on user input.
//!
//! Bus handlers hold a weak reference to the runtime, so dropping the last
//! [`SkillRuntime`] handle is enough to make them inert.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{json, Map, Value as JsonValue};
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Weak};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::activation::ActivationController;
use super::collector::ABORT_QUESTION;
use super::converse::FORCE_TIMEOUT;
use super::dispatch::WrappedHandler;
use super::errors::HandlerError;
use super::handler::{handler_fn, HandlerOptions, SkillHandler};
use super::skill::ConverseSkill;
use super::stop::GLOBAL_STOP;
use crate::config::AppConfig;
use crate::domain::foundation::{DomainError, Message, SessionId, SkillId};
use crate::domain::intent::ConverseMatcherSet;
use crate::domain::response::ResponseMailboxes;
use crate::domain::settings::SkillSettings;
use crate::domain::vocabulary::Vocabulary;
use crate::ports::{
    MessageBus, MessageHandler, ResourceLoader, SessionRegistry, SettingsStore, SubscriptionId,
};

/// Message announcing changed settings: `{skill_id, settings}`.
pub const SETTINGS_CHANGED: &str = "mycroft.skills.settings.changed";

/// External collaborators of a skill.
#[derive(Clone)]
pub struct SkillPorts {
    pub bus: Arc<dyn MessageBus>,
    pub sessions: Arc<dyn SessionRegistry>,
    pub resources: Arc<dyn ResourceLoader>,
    pub settings: Arc<dyn SettingsStore>,
}

pub(super) struct Inner {
    pub(super) skill_id: SkillId,
    pub(super) skill: Arc<dyn ConverseSkill>,
    pub(super) ports: SkillPorts,
    pub(super) config: AppConfig,
    pub(super) activation: ActivationController,
    pub(super) settings: RwLock<SkillSettings>,
    pub(super) matchers: RwLock<ConverseMatcherSet>,
    /// Keyed by (standardized lang, vocabulary name).
    pub(super) vocabularies: DashMap<(String, String), Vocabulary>,
    pub(super) mailboxes: ResponseMailboxes,
    /// Cancellation of the in-flight response worker, per session.
    pub(super) collectors: DashMap<SessionId, CancellationToken>,
    pub(super) converse_workers: DashMap<u64, CancellationToken>,
    pub(super) next_worker: AtomicU64,
    pub(super) subscriptions: DashMap<SubscriptionId, String>,
}

/// Handle to a running skill. Cheap to clone.
#[derive(Clone)]
pub struct SkillRuntime {
    pub(super) inner: Arc<Inner>,
}

impl SkillRuntime {
    /// Loads stored settings and registers the skill's bus handlers.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or stored settings
    /// cannot be read. Nothing is registered on the bus in either case.
    pub async fn start(
        skill_id: SkillId,
        skill: Arc<dyn ConverseSkill>,
        ports: SkillPorts,
        config: AppConfig,
    ) -> Result<Self, HandlerError> {
        config.validate()?;
        let stored = ports.settings.load(&skill_id).await?;
        let activation = ActivationController::new(
            skill_id.clone(),
            Arc::clone(&ports.bus),
            config.converse.timeout_minutes(),
        );

        let runtime = Self {
            inner: Arc::new(Inner {
                skill_id,
                skill,
                ports,
                config,
                activation,
                settings: RwLock::new(SkillSettings::from_stored(stored)),
                matchers: RwLock::new(ConverseMatcherSet::new()),
                vocabularies: DashMap::new(),
                mailboxes: ResponseMailboxes::new(),
                collectors: DashMap::new(),
                converse_workers: DashMap::new(),
                next_worker: AtomicU64::new(0),
                subscriptions: DashMap::new(),
            }),
        };
        runtime.register_system_handlers();

        info!(skill_id = %runtime.inner.skill_id, "Skill runtime started");
        Ok(runtime)
    }

    pub(super) fn upgrade(inner: &Weak<Inner>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }

    fn register_system_handlers(&self) {
        let id = &self.inner.skill_id;

        self.subscribe(&id.scoped("converse.ping"), SystemRoute::ConversePing);
        self.subscribe(&id.scoped("converse.get_response"), SystemRoute::DeliverResponse);
        self.subscribe(&id.scoped("stop.ping"), SystemRoute::StopPing);
        self.subscribe(ABORT_QUESTION, SystemRoute::AbortQuestion);
        self.subscribe(GLOBAL_STOP, SystemRoute::AbortAll);
        self.subscribe(FORCE_TIMEOUT, SystemRoute::ForceTimeout);
        self.subscribe(SETTINGS_CHANGED, SystemRoute::SettingsChanged);

        self.add_event(
            &id.scoped("converse.request"),
            handler_fn(|rt: SkillRuntime, msg: Message| async move {
                rt.handle_converse_request(msg).await
            }),
            HandlerOptions::silent(),
        );
        self.add_event(
            &id.scoped("activate"),
            handler_fn(|rt: SkillRuntime, msg: Message| async move {
                let skill = Arc::clone(&rt.inner.skill);
                skill.handle_activate(&rt, &msg).await
            }),
            HandlerOptions::silent(),
        );
        self.add_event(
            &id.scoped("deactivate"),
            handler_fn(|rt: SkillRuntime, msg: Message| async move {
                let skill = Arc::clone(&rt.inner.skill);
                skill.handle_deactivate(&rt, &msg).await
            }),
            HandlerOptions::silent(),
        );
        for stop_type in [id.scoped("stop"), GLOBAL_STOP.to_string()] {
            self.add_event(
                &stop_type,
                handler_fn(|rt: SkillRuntime, msg: Message| async move {
                    rt.handle_session_stop(msg).await
                }),
                HandlerOptions::silent(),
            );
        }
    }

    fn subscribe(&self, msg_type: &str, route: SystemRoute) -> SubscriptionId {
        let handler = SystemHandler {
            runtime: Arc::downgrade(&self.inner),
            route,
        };
        let id = self.inner.ports.bus.on(msg_type, Arc::new(handler));
        self.inner.subscriptions.insert(id, msg_type.to_string());
        id
    }

    /// Registers `handler` for `msg_type` behind the dispatch wrapper.
    pub fn add_event(
        &self,
        msg_type: &str,
        handler: Arc<dyn SkillHandler>,
        options: HandlerOptions,
    ) -> SubscriptionId {
        let wrapped = WrappedHandler::new(Arc::downgrade(&self.inner), handler, options, msg_type);
        let id = self.inner.ports.bus.on(msg_type, Arc::new(wrapped));
        self.inner.subscriptions.insert(id, msg_type.to_string());
        debug!(skill_id = %self.inner.skill_id, msg_type = %msg_type, "Registered handler");
        id
    }

    /// Removes every handler this runtime registered for `msg_type`.
    pub fn remove_event(&self, msg_type: &str) -> bool {
        let ids: Vec<SubscriptionId> = self
            .inner
            .subscriptions
            .iter()
            .filter(|entry| entry.value() == msg_type)
            .map(|entry| *entry.key())
            .collect();
        for id in &ids {
            self.inner.subscriptions.remove(id);
            self.inner.ports.bus.remove(*id);
        }
        !ids.is_empty()
    }

    /// Stops the skill, persists changed settings and unregisters every
    /// handler. In-flight collections and converse workers are cancelled.
    pub async fn shutdown(&self) {
        let skill = Arc::clone(&self.inner.skill);
        if let Err(e) = skill.stop(self).await {
            error!(skill_id = %self.inner.skill_id, error = %e, "Failed to stop skill");
        }
        if let Err(e) = self.store_settings_if_changed().await {
            error!(skill_id = %self.inner.skill_id, error = %e, "Failed to store settings");
        }

        self.abort_collections(None);
        for worker in self.inner.converse_workers.iter() {
            worker.value().cancel();
        }

        let ids: Vec<SubscriptionId> = self.inner.subscriptions.iter().map(|e| *e.key()).collect();
        for id in ids {
            self.inner.subscriptions.remove(&id);
            self.inner.ports.bus.remove(id);
        }
        info!(skill_id = %self.inner.skill_id, "Skill runtime shut down");
    }

    pub fn skill_id(&self) -> &SkillId {
        &self.inner.skill_id
    }

    /// Name used when speaking about the skill.
    pub fn skill_name(&self) -> String {
        self.inner
            .skill
            .name()
            .map_or_else(|| self.inner.skill_id.to_string(), str::to_string)
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn bus(&self) -> &Arc<dyn MessageBus> {
        &self.inner.ports.bus
    }

    pub fn sessions(&self) -> &Arc<dyn SessionRegistry> {
        &self.inner.ports.sessions
    }

    pub fn activation(&self) -> &ActivationController {
        &self.inner.activation
    }

    /// Emits a notification; handler failures are logged, not returned.
    pub(super) async fn publish(&self, message: Message) {
        let msg_type = message.msg_type.clone();
        if let Err(e) = self.inner.ports.bus.emit(message).await {
            warn!(
                skill_id = %self.inner.skill_id,
                msg_type = %msg_type,
                error = %e,
                "Bus handlers failed"
            );
        }
    }

    // === Settings ===

    pub async fn settings(&self) -> SkillSettings {
        self.inner.settings.read().await.clone()
    }

    pub async fn setting(&self, key: &str) -> Option<JsonValue> {
        self.inner.settings.read().await.get(key).cloned()
    }

    /// Changes settings; they are persisted when the current handler ends.
    pub async fn update_settings<F>(&self, update: F)
    where
        F: FnOnce(&mut SkillSettings) + Send,
    {
        let mut settings = self.inner.settings.write().await;
        update(&mut settings);
    }

    /// Persists settings if they differ from the stored snapshot.
    pub async fn store_settings_if_changed(&self) -> Result<bool, HandlerError> {
        let mut settings = self.inner.settings.write().await;
        if !settings.has_changed() {
            return Ok(false);
        }
        self.inner
            .ports
            .settings
            .store(&self.inner.skill_id, settings.values())
            .await?;
        settings.mark_stored();
        debug!(skill_id = %self.inner.skill_id, "Stored settings");
        Ok(true)
    }

    /// Minimum converse intent confidence; settings override configuration.
    pub async fn min_intent_conf(&self) -> f64 {
        self.inner
            .settings
            .read()
            .await
            .get_f64("min_intent_conf")
            .unwrap_or(self.inner.config.skill.min_intent_conf)
    }

    pub async fn strict_intents(&self) -> bool {
        self.inner
            .settings
            .read()
            .await
            .get_bool("strict_intents")
            .unwrap_or(self.inner.config.skill.strict_intents)
    }

    async fn handle_settings_changed(&self, message: &Message) {
        if message.data_str("skill_id") != Some(self.inner.skill_id.as_str()) {
            return;
        }
        let Some(values) = message.data.get("settings").and_then(JsonValue::as_object) else {
            return;
        };
        let values: Map<String, JsonValue> = values.clone();
        self.inner.settings.write().await.replace(values);
        info!(skill_id = %self.inner.skill_id, "Settings changed externally");
    }

    pub(super) fn skill_data(&self) -> JsonValue {
        json!({ "skill_id": self.inner.skill_id.as_str() })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SystemRoute {
    ConversePing,
    DeliverResponse,
    StopPing,
    AbortQuestion,
    AbortAll,
    ForceTimeout,
    SettingsChanged,
}

struct SystemHandler {
    runtime: Weak<Inner>,
    route: SystemRoute,
}

#[async_trait]
impl MessageHandler for SystemHandler {
    async fn handle(&self, message: Message) -> Result<(), DomainError> {
        let Some(runtime) = SkillRuntime::upgrade(&self.runtime) else {
            return Ok(());
        };
        match self.route {
            SystemRoute::ConversePing => runtime.handle_converse_ping(&message).await,
            SystemRoute::DeliverResponse => {
                runtime.handle_response_delivery(&message);
                Ok(())
            }
            SystemRoute::StopPing => runtime.handle_stop_ping(&message).await,
            SystemRoute::AbortQuestion => runtime.handle_abort_question(&message).await,
            SystemRoute::AbortAll => runtime.kill_responses(&message, None).await,
            SystemRoute::ForceTimeout => {
                runtime.handle_force_timeout(&message);
                Ok(())
            }
            SystemRoute::SettingsChanged => {
                runtime.handle_settings_changed(&message).await;
                Ok(())
            }
        }
    }

    fn name(&self) -> &'static str {
        match self.route {
            SystemRoute::ConversePing => "ConversePingHandler",
            SystemRoute::DeliverResponse => "ResponseDeliveryHandler",
            SystemRoute::StopPing => "StopPingHandler",
            SystemRoute::AbortQuestion => "AbortQuestionHandler",
            SystemRoute::AbortAll => "StopResponsesHandler",
            SystemRoute::ForceTimeout => "ConverseTimeoutHandler",
            SystemRoute::SettingsChanged => "SettingsChangedHandler",
        }
    }
}
