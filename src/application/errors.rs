//! Errors returned by skill handlers.

use thiserror::Error;

use crate::config::ValidationError as ConfigValidationError;
use crate::domain::foundation::DomainError;
use crate::ports::{ResourceError, SettingsError};

/// Failure of a skill handler.
///
/// [`HandlerError::Aborted`] is the cancellation signal: the dispatch wrapper
/// reports it as a normal completion, never as an error.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("handler aborted")]
    Aborted,

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigValidationError),
}

impl HandlerError {
    pub fn failed(message: impl Into<String>) -> Self {
        HandlerError::Failed(message.into())
    }

    pub fn is_abort(&self) -> bool {
        matches!(self, HandlerError::Aborted)
    }
}
