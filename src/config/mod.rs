//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `SKILL_CONVERSE` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use skill_converse::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("get_response waits {:?} per cycle", config.response.timeout());
//! ```

mod converse;
mod error;
mod logging;
mod response;
mod skill;

pub use converse::ConverseConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;
pub use response::ResponseConfig;
pub use skill::SkillConfig;

use serde::Deserialize;

/// Root configuration
///
/// Every field has a default, so loading with an empty environment succeeds.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Activation window and intent probe timeouts
    #[serde(default)]
    pub converse: ConverseConfig,

    /// get_response timing
    #[serde(default)]
    pub response: ResponseConfig,

    /// Skill defaults (language, converse intent matching)
    #[serde(default)]
    pub skill: SkillConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `SKILL_CONVERSE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `SKILL_CONVERSE__RESPONSE__TIMEOUT_SECS=30` -> `response.timeout_secs = 30`
    /// - `SKILL_CONVERSE__SKILL__STRICT_INTENTS=true` -> `skill.strict_intents = true`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SKILL_CONVERSE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.converse.validate()?;
        self.response.validate()?;
        self.skill.validate()?;
        Ok(())
    }
}
