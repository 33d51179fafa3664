//! ResourceLoader port - Interface for localized skill resources.

use async_trait::async_trait;

use crate::domain::resources::ResourceKind;

/// Errors that can occur while loading resources
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("{kind} resource '{name}' not found for language {lang}")]
    NotFound {
        lang: String,
        kind: ResourceKind,
        name: String,
    },

    #[error("IO error: {0}")]
    Io(String),
}

/// Port for loading `.intent`, `.voc`, `.dialog` and `.word` resources.
///
/// Returned lines are already comment-stripped (see
/// [`parse_resource_lines`](crate::domain::resources::parse_resource_lines)).
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    /// Loads the lines of resource `name` for `lang`.
    ///
    /// # Errors
    ///
    /// `NotFound` when neither the skill nor the core resources provide it.
    async fn load(
        &self,
        lang: &str,
        kind: ResourceKind,
        name: &str,
    ) -> Result<Vec<String>, ResourceError>;

    /// Languages the skill ships resources for.
    async fn languages(&self) -> Vec<String>;
}
