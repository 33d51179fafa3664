//! File-based Settings Store Adapter
//!
//! Stores each skill's settings as `<base>/<skill_id>/settings.json`.

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::foundation::SkillId;
use crate::ports::{SettingsError, SettingsStore};

/// File-based storage for skill settings
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    base_path: PathBuf,
}

impl FileSettingsStore {
    /// # Example
    /// ```ignore
    /// let store = FileSettingsStore::new("./data/skills");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn settings_path(&self, skill_id: &SkillId) -> PathBuf {
        self.base_path.join(skill_id.as_str()).join("settings.json")
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn load(&self, skill_id: &SkillId) -> Result<Map<String, JsonValue>, SettingsError> {
        let path = self.settings_path(skill_id);
        if !path.exists() {
            return Ok(Map::new());
        }

        let json = fs::read_to_string(&path)
            .await
            .map_err(|e| SettingsError::IoError(e.to_string()))?;

        serde_json::from_str(&json).map_err(|e| SettingsError::DeserializationFailed(e.to_string()))
    }

    async fn store(
        &self,
        skill_id: &SkillId,
        values: &Map<String, JsonValue>,
    ) -> Result<(), SettingsError> {
        let path = self.settings_path(skill_id);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| SettingsError::IoError(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(values)
            .map_err(|e| SettingsError::SerializationFailed(e.to_string()))?;

        fs::write(&path, json)
            .await
            .map_err(|e| SettingsError::IoError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileSettingsStore::new(dir.path());
        let skill = SkillId::new("weather").unwrap();
        assert!(store.load(&skill).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FileSettingsStore::new(dir.path());
        let skill = SkillId::new("weather").unwrap();
        let mut values = Map::new();
        values.insert("min_intent_conf".into(), json!(0.7));

        store.store(&skill, &values).await.unwrap();

        assert!(dir.path().join("weather").join("settings.json").exists());
        assert_eq!(store.load(&skill).await.unwrap(), values);
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let skill = SkillId::new("weather").unwrap();
        let skill_dir = dir.path().join("weather");
        fs::create_dir_all(&skill_dir).await.unwrap();
        fs::write(skill_dir.join("settings.json"), "not json").await.unwrap();

        let result = FileSettingsStore::new(dir.path()).load(&skill).await;

        assert!(matches!(result, Err(SettingsError::DeserializationFailed(_))));
    }
}
