//! Response collection configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Timing of `get_response` wait cycles
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseConfig {
    /// Wait for input per cycle, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Bound on waiting for a spoken prompt to finish, in seconds
    #[serde(default = "default_speak_wait_secs")]
    pub speak_wait_secs: u64,

    /// Mailbox poll interval, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl ResponseConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn speak_wait(&self) -> Duration {
        Duration::from_secs(self.speak_wait_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Validate response configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("response.timeout_secs"));
        }
        if self.speak_wait_secs == 0 {
            return Err(ValidationError::InvalidTimeout("response.speak_wait_secs"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ValidationError::InvalidPollInterval);
        }
        if self.poll_interval() > self.timeout() {
            return Err(ValidationError::PollIntervalExceedsTimeout);
        }
        Ok(())
    }
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            speak_wait_secs: default_speak_wait_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_speak_wait_secs() -> u64 {
    15
}

fn default_poll_interval_ms() -> u64 {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ResponseConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(20));
        assert_eq!(config.speak_wait(), Duration::from_secs(15));
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_poll_interval_is_invalid() {
        let config = ResponseConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidPollInterval)
        ));
    }

    #[test]
    fn poll_interval_longer_than_timeout_is_invalid() {
        let config = ResponseConfig {
            timeout_secs: 1,
            poll_interval_ms: 1500,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::PollIntervalExceedsTimeout)
        ));
    }
}
