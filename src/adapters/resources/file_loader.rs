//! File-based resource loader.
//!
//! Reads skill resources from `<root>/locale/<lang>/**/<name>.<ext>`, the
//! layout skills ship with. The language directory is chosen by language
//! distance, so `en-GB` requests can use `en-US` files.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::domain::language::{closest_match, standardize_lang_tag, MAX_LANGUAGE_DISTANCE};
use crate::domain::resources::{core_resource, parse_resource_lines, ResourceKind};
use crate::ports::{ResourceError, ResourceLoader};

/// Loads resources from a skill's `locale` directory, falling back to the
/// built-in core resources.
#[derive(Debug, Clone)]
pub struct FileResourceLoader {
    root: PathBuf,
}

impl FileResourceLoader {
    /// # Example
    /// ```ignore
    /// let loader = FileResourceLoader::new("./skills/flight-booking");
    /// ```
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn locale_dir(&self) -> PathBuf {
        self.root.join("locale")
    }

    /// Language directories as `(standardized tag, path)`.
    async fn language_dirs(&self) -> Vec<(String, PathBuf)> {
        let mut dirs = Vec::new();
        let Ok(mut entries) = fs::read_dir(self.locale_dir()).await else {
            return dirs;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                dirs.push((standardize_lang_tag(name), entry.path()));
            }
        }
        dirs.sort();
        dirs
    }

    async fn lang_dir(&self, lang: &str) -> Option<PathBuf> {
        let dirs = self.language_dirs().await;
        let tags: Vec<String> = dirs.iter().map(|(tag, _)| tag.clone()).collect();
        let (closest, distance) = closest_match(lang, &tags)?;
        if distance >= MAX_LANGUAGE_DISTANCE {
            return None;
        }
        dirs.into_iter()
            .find(|(tag, _)| *tag == closest)
            .map(|(_, path)| path)
    }

    /// Depth-first search for `file_name` below `dir`.
    async fn find_file(dir: &Path, file_name: &str) -> Result<Option<PathBuf>, ResourceError> {
        let mut stack = vec![dir.to_path_buf()];
        while let Some(current) = stack.pop() {
            let mut entries = match fs::read_dir(&current).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(dir = %current.display(), error = %e, "Unreadable resource directory");
                    continue;
                }
            };
            let mut subdirs = Vec::new();
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| ResourceError::Io(e.to_string()))?
            {
                let path = entry.path();
                if path.is_dir() {
                    subdirs.push(path);
                } else if entry.file_name().to_str() == Some(file_name) {
                    return Ok(Some(path));
                }
            }
            subdirs.sort();
            stack.extend(subdirs.into_iter().rev());
        }
        Ok(None)
    }
}

#[async_trait]
impl ResourceLoader for FileResourceLoader {
    async fn load(
        &self,
        lang: &str,
        kind: ResourceKind,
        name: &str,
    ) -> Result<Vec<String>, ResourceError> {
        let file_name = format!("{}.{}", name, kind.extension());

        if let Some(dir) = self.lang_dir(lang).await {
            if let Some(path) = Self::find_file(&dir, &file_name).await? {
                debug!(path = %path.display(), "Loading resource");
                let content = fs::read_to_string(&path)
                    .await
                    .map_err(|e| ResourceError::Io(e.to_string()))?;
                return Ok(parse_resource_lines(&content));
            }
        }

        core_resource(lang, kind, name).ok_or_else(|| ResourceError::NotFound {
            lang: lang.to_string(),
            kind,
            name: name.to_string(),
        })
    }

    async fn languages(&self) -> Vec<String> {
        self.language_dirs()
            .await
            .into_iter()
            .map(|(tag, _)| tag)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn skill_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        let en = dir.path().join("locale").join("en-us").join("intents");
        fs::create_dir_all(&en).await.unwrap();
        fs::write(
            en.join("book_flight.intent"),
            "# samples\nbook me a flight\n\nI want to fly\n",
        )
        .await
        .unwrap();
        let pt = dir.path().join("locale").join("pt-PT");
        fs::create_dir_all(&pt).await.unwrap();
        fs::write(pt.join("book_flight.intent"), "marca um voo\n")
            .await
            .unwrap();
        dir
    }

    #[tokio::test]
    async fn loads_nested_resource_without_comments() {
        let dir = skill_dir().await;
        let loader = FileResourceLoader::new(dir.path());

        let lines = loader
            .load("en-US", ResourceKind::Intent, "book_flight")
            .await
            .unwrap();

        assert_eq!(lines, vec!["book me a flight", "I want to fly"]);
    }

    #[tokio::test]
    async fn regional_variant_uses_closest_directory() {
        let dir = skill_dir().await;
        let loader = FileResourceLoader::new(dir.path());

        let lines = loader
            .load("pt-BR", ResourceKind::Intent, "book_flight")
            .await
            .unwrap();

        assert_eq!(lines, vec!["marca um voo"]);
    }

    #[tokio::test]
    async fn missing_language_is_not_found() {
        let dir = skill_dir().await;
        let loader = FileResourceLoader::new(dir.path());

        let result = loader.load("fr-FR", ResourceKind::Intent, "book_flight").await;

        assert!(matches!(result, Err(ResourceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn falls_back_to_core_vocabulary() {
        let dir = skill_dir().await;
        let loader = FileResourceLoader::new(dir.path());

        let cancel = loader
            .load("en-US", ResourceKind::Vocabulary, "cancel")
            .await
            .unwrap();

        assert!(cancel.contains(&"cancel".to_string()));
    }

    #[tokio::test]
    async fn lists_languages() {
        let dir = skill_dir().await;
        let loader = FileResourceLoader::new(dir.path());
        assert_eq!(loader.languages().await, vec!["en-US", "pt-PT"]);
    }

    #[tokio::test]
    async fn missing_locale_dir_has_no_languages() {
        let dir = TempDir::new().unwrap();
        let loader = FileResourceLoader::new(dir.path());
        assert!(loader.languages().await.is_empty());
    }
}
