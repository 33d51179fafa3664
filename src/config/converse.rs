//! Converse activation configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// How long a skill stays active and how long intent probes may take
#[derive(Debug, Clone, Deserialize)]
pub struct ConverseConfig {
    /// Default activation window in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Bound on `calc_intent` probes
    #[serde(default = "default_intent_probe_timeout_ms")]
    pub intent_probe_timeout_ms: u64,

    /// Bound on `skill_will_trigger` probes
    #[serde(default = "default_skill_will_trigger_timeout_ms")]
    pub skill_will_trigger_timeout_ms: u64,
}

impl ConverseConfig {
    /// Default activation window in minutes, as sent on the bus.
    pub fn timeout_minutes(&self) -> f64 {
        self.timeout_secs as f64 / 60.0
    }

    pub fn intent_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.intent_probe_timeout_ms)
    }

    pub fn skill_will_trigger_timeout(&self) -> Duration {
        Duration::from_millis(self.skill_will_trigger_timeout_ms)
    }

    /// Validate converse configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("converse.timeout_secs"));
        }
        if self.intent_probe_timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout("converse.intent_probe_timeout_ms"));
        }
        if self.skill_will_trigger_timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout(
                "converse.skill_will_trigger_timeout_ms",
            ));
        }
        Ok(())
    }
}

impl Default for ConverseConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            intent_probe_timeout_ms: default_intent_probe_timeout_ms(),
            skill_will_trigger_timeout_ms: default_skill_will_trigger_timeout_ms(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_intent_probe_timeout_ms() -> u64 {
    1000
}

fn default_skill_will_trigger_timeout_ms() -> u64 {
    800
}
