//! In-Memory Settings Store Adapter
//!
//! Keeps skill settings in memory. Useful for testing and development.

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::SkillId;
use crate::ports::{SettingsError, SettingsStore};

/// In-memory storage for skill settings
#[derive(Debug, Clone, Default)]
pub struct InMemorySettingsStore {
    settings: Arc<RwLock<HashMap<SkillId, Map<String, JsonValue>>>>,
    writes: Arc<RwLock<usize>>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `store` calls so far (useful for tests)
    pub async fn write_count(&self) -> usize {
        *self.writes.read().await
    }

    pub async fn stored(&self, skill_id: &SkillId) -> Option<Map<String, JsonValue>> {
        self.settings.read().await.get(skill_id).cloned()
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn load(&self, skill_id: &SkillId) -> Result<Map<String, JsonValue>, SettingsError> {
        Ok(self
            .settings
            .read()
            .await
            .get(skill_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn store(
        &self,
        skill_id: &SkillId,
        values: &Map<String, JsonValue>,
    ) -> Result<(), SettingsError> {
        self.settings
            .write()
            .await
            .insert(skill_id.clone(), values.clone());
        *self.writes.write().await += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn unknown_skill_loads_empty() {
        let store = InMemorySettingsStore::new();
        let skill = SkillId::new("weather").unwrap();
        assert!(store.load(&skill).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_then_load() {
        let store = InMemorySettingsStore::new();
        let skill = SkillId::new("weather").unwrap();
        let mut values = Map::new();
        values.insert("units".into(), json!("metric"));

        store.store(&skill, &values).await.unwrap();

        assert_eq!(store.load(&skill).await.unwrap(), values);
        assert_eq!(store.write_count().await, 1);
    }
}
