//! SettingsStore port - Interface for persisting skill settings.

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};

use crate::domain::foundation::SkillId;

/// Errors that can occur during settings storage operations
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to serialize settings: {0}")]
    SerializationFailed(String),

    #[error("Failed to deserialize settings: {0}")]
    DeserializationFailed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Port for loading and storing the JSON settings of a skill
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Loads settings; a skill with nothing stored gets an empty map.
    async fn load(&self, skill_id: &SkillId) -> Result<Map<String, JsonValue>, SettingsError>;

    /// Replaces the stored settings.
    async fn store(
        &self,
        skill_id: &SkillId,
        values: &Map<String, JsonValue>,
    ) -> Result<(), SettingsError>;
}
