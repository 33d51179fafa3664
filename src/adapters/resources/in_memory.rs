//! In-memory resource loader for tests and embedded skills.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::language::{closest_match, standardize_lang_tag, MAX_LANGUAGE_DISTANCE};
use crate::domain::resources::{core_resource, parse_resource_lines, ResourceKind};
use crate::ports::{ResourceError, ResourceLoader};

type Key = (String, ResourceKind, String);

/// Resources registered in code, falling back to the core resources.
///
/// # Panics
///
/// Methods panic if the internal lock is poisoned.
#[derive(Debug, Default)]
pub struct InMemoryResourceLoader {
    resources: RwLock<HashMap<Key, Vec<String>>>,
}

impl InMemoryResourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers resource content in file format (comments allowed).
    pub fn insert(&self, lang: &str, kind: ResourceKind, name: &str, content: &str) {
        self.resources
            .write()
            .expect("InMemoryResourceLoader: write lock poisoned")
            .insert(
                (standardize_lang_tag(lang), kind, name.to_string()),
                parse_resource_lines(content),
            );
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(self, lang: &str, kind: ResourceKind, name: &str, content: &str) -> Self {
        self.insert(lang, kind, name, content);
        self
    }
}

#[async_trait]
impl ResourceLoader for InMemoryResourceLoader {
    async fn load(
        &self,
        lang: &str,
        kind: ResourceKind,
        name: &str,
    ) -> Result<Vec<String>, ResourceError> {
        let found = {
            let resources = self
                .resources
                .read()
                .expect("InMemoryResourceLoader: read lock poisoned");
            let langs: Vec<String> = resources
                .keys()
                .filter(|(_, k, n)| *k == kind && n == name)
                .map(|(l, _, _)| l.clone())
                .collect();
            closest_match(lang, &langs)
                .filter(|(_, distance)| *distance < MAX_LANGUAGE_DISTANCE)
                .and_then(|(closest, _)| resources.get(&(closest, kind, name.to_string())).cloned())
        };

        found
            .or_else(|| core_resource(lang, kind, name))
            .ok_or_else(|| ResourceError::NotFound {
                lang: lang.to_string(),
                kind,
                name: name.to_string(),
            })
    }

    async fn languages(&self) -> Vec<String> {
        let mut langs: Vec<String> = self
            .resources
            .read()
            .expect("InMemoryResourceLoader: read lock poisoned")
            .keys()
            .map(|(lang, _, _)| lang.clone())
            .collect();
        langs.sort();
        langs.dedup();
        langs
    }
}
