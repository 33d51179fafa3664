//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid timeout: {0} must be positive")]
    InvalidTimeout(&'static str),

    #[error("Invalid poll interval: must be positive")]
    InvalidPollInterval,

    #[error("Poll interval exceeds the response timeout")]
    PollIntervalExceedsTimeout,

    #[error("Invalid confidence {0}: must be between 0 and 1")]
    InvalidConfidence(f64),
}
