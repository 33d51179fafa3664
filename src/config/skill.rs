//! Skill defaults

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::intent::DEFAULT_MIN_INTENT_CONF;

/// Defaults for skills; per-skill settings may override the intent fields
#[derive(Debug, Clone, Deserialize)]
pub struct SkillConfig {
    /// Language used when a message carries none
    #[serde(default = "default_lang")]
    pub lang: String,

    /// Minimum confidence for converse intents
    #[serde(default = "default_min_intent_conf")]
    pub min_intent_conf: f64,

    /// Only accept exact sample matches
    #[serde(default)]
    pub strict_intents: bool,
}

impl SkillConfig {
    /// Validate skill configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.lang.trim().is_empty() {
            return Err(ValidationError::MissingRequired("skill.lang"));
        }
        if !(0.0..=1.0).contains(&self.min_intent_conf) {
            return Err(ValidationError::InvalidConfidence(self.min_intent_conf));
        }
        Ok(())
    }
}

impl Default for SkillConfig {
    fn default() -> Self {
        Self {
            lang: default_lang(),
            min_intent_conf: default_min_intent_conf(),
            strict_intents: false,
        }
    }
}

fn default_lang() -> String {
    "en-US".to_string()
}

fn default_min_intent_conf() -> f64 {
    DEFAULT_MIN_INTENT_CONF
}
