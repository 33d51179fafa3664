//! Per-skill settings with change tracking.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// JSON settings of one skill plus the snapshot last persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillSettings {
    values: Map<String, JsonValue>,
    #[serde(skip)]
    stored: Map<String, JsonValue>,
}

impl SkillSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings loaded from storage; they start out unchanged.
    pub fn from_stored(values: Map<String, JsonValue>) -> Self {
        Self {
            stored: values.clone(),
            values,
        }
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.values.get(key)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(JsonValue::as_f64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(JsonValue::as_bool)
    }

    pub fn set(&mut self, key: impl Into<String>, value: JsonValue) {
        self.values.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<JsonValue> {
        self.values.remove(key)
    }

    pub fn values(&self) -> &Map<String, JsonValue> {
        &self.values
    }

    /// True if the settings differ from the last stored snapshot.
    pub fn has_changed(&self) -> bool {
        self.values != self.stored
    }

    pub fn mark_stored(&mut self) {
        self.stored = self.values.clone();
    }

    /// Replaces all values, e.g. after an external settings change.
    pub fn replace(&mut self, values: Map<String, JsonValue>) {
        self.stored = values.clone();
        self.values = values;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_settings_are_unchanged() {
        assert!(!SkillSettings::new().has_changed());
    }

    #[test]
    fn set_marks_changed_until_stored() {
        let mut settings = SkillSettings::new();
        settings.set("min_intent_conf", json!(0.7));
        assert!(settings.has_changed());
        settings.mark_stored();
        assert!(!settings.has_changed());
        assert_eq!(settings.get_f64("min_intent_conf"), Some(0.7));
    }

    #[test]
    fn setting_the_same_value_is_not_a_change() {
        let mut values = Map::new();
        values.insert("strict_intents".into(), json!(true));
        let mut settings = SkillSettings::from_stored(values);
        settings.set("strict_intents", json!(true));
        assert!(!settings.has_changed());
        assert_eq!(settings.get_bool("strict_intents"), Some(true));
    }
}
