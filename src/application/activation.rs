//! ActivationController - requests to enter or leave the active skill set.
//!
//! The activation window itself lives in the intent service; this side only
//! emits requests, so re-activating simply refreshes the window.

use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::domain::foundation::{DomainError, Message, SkillId};
use crate::ports::MessageBus;

pub const SKILLS_ACTIVATE: &str = "intent.service.skills.activate";
pub const SKILLS_DEACTIVATE: &str = "intent.service.skills.deactivate";

/// Activation window meaning "until deactivated".
pub const INDEFINITE_ACTIVATION: f64 = -1.0;

pub struct ActivationController {
    skill_id: SkillId,
    bus: Arc<dyn MessageBus>,
    default_minutes: f64,
}

impl ActivationController {
    pub fn new(skill_id: SkillId, bus: Arc<dyn MessageBus>, default_minutes: f64) -> Self {
        Self {
            skill_id,
            bus,
            default_minutes,
        }
    }

    pub fn default_minutes(&self) -> f64 {
        self.default_minutes
    }

    /// Asks to become the active converse target for `minutes`
    /// (configured default when `None`, [`INDEFINITE_ACTIVATION`] for no limit).
    pub async fn activate(&self, source: &Message, minutes: Option<f64>) -> Result<(), DomainError> {
        let timeout = minutes.unwrap_or(self.default_minutes);
        debug!(skill_id = %self.skill_id, timeout, "Requesting activation");
        let message = source
            .forward(
                SKILLS_ACTIVATE,
                json!({ "skill_id": self.skill_id.as_str(), "timeout": timeout }),
            )
            .with_context("skill_id", json!(self.skill_id.as_str()));
        self.bus.emit(message).await
    }

    /// Asks to leave the active set.
    pub async fn deactivate(&self, source: &Message) -> Result<(), DomainError> {
        debug!(skill_id = %self.skill_id, "Requesting deactivation");
        let message = source
            .forward(SKILLS_DEACTIVATE, json!({ "skill_id": self.skill_id.as_str() }))
            .with_context("skill_id", json!(self.skill_id.as_str()));
        self.bus.emit(message).await
    }
}
