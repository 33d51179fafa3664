//! Vocabulary matching (`cancel`, `yes`, `no`, ...).
//!
//! A vocabulary is a list of phrases loaded from a `.voc` resource. Matching
//! is accent and punctuation insensitive and works on whole words, so
//! "yes please" matches a vocabulary containing "yes".

use regex::Regex;
use tracing::warn;

use crate::domain::text::{collapse_whitespace, expand_template, normalize_text};

#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    phrases: Vec<String>,
    patterns: Vec<Regex>,
}

impl Vocabulary {
    /// Builds a vocabulary from resource lines; template syntax is expanded.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut phrases: Vec<String> = lines
            .iter()
            .flat_map(|line| expand_template(line.as_ref()))
            .map(|variant| normalize_text(&variant))
            .filter(|p| !p.is_empty())
            .collect();
        // longest first, so composite phrases are removed before their parts
        phrases.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        phrases.dedup();

        let patterns = phrases
            .iter()
            .filter_map(|p| match Regex::new(&format!(r"\b{}\b", regex::escape(p))) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(phrase = %p, error = %e, "Skipping unusable vocabulary phrase");
                    None
                }
            })
            .collect();

        Self { phrases, patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Normalized phrases, longest first.
    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// True if the utterance contains a phrase as whole words, or equals one
    /// when `exact` is set.
    pub fn matches(&self, utterance: &str, exact: bool) -> bool {
        let normalized = normalize_text(utterance);
        if normalized.is_empty() {
            return false;
        }
        if exact {
            return self.phrases.iter().any(|p| *p == normalized);
        }
        self.patterns.iter().any(|re| re.is_match(&normalized))
    }

    /// Removes every vocabulary phrase from the (normalized) utterance.
    pub fn remove_from(&self, utterance: &str) -> String {
        let mut text = normalize_text(utterance);
        for re in &self.patterns {
            text = re.replace_all(&text, " ").into_owned();
        }
        collapse_whitespace(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cancel() -> Vocabulary {
        Vocabulary::from_lines(&["cancel", "never mind", "forget (it|that)"])
    }

    #[test]
    fn matches_whole_words_anywhere() {
        let voc = cancel();
        assert!(voc.matches("oh never mind then", false));
        assert!(voc.matches("Cancel!", false));
        assert!(voc.matches("please forget that", false));
    }

    #[test]
    fn does_not_match_partial_words() {
        let voc = cancel();
        assert!(!voc.matches("cancellation policy", false));
    }

    #[test]
    fn exact_requires_equality() {
        let voc = cancel();
        assert!(voc.matches("cancel", true));
        assert!(!voc.matches("cancel it", true));
    }

    #[test]
    fn empty_utterance_never_matches() {
        assert!(!cancel().matches("  ", false));
        assert!(!Vocabulary::default().matches("cancel", false));
    }

    #[test]
    fn accents_are_ignored() {
        let voc = Vocabulary::from_lines(&["não"]);
        assert!(voc.matches("nao obrigado", false));
    }

    #[test]
    fn remove_strips_longest_phrases_first() {
        let voc = Vocabulary::from_lines(&["the", "the last one"]);
        assert_eq!(voc.remove_from("pick the last one please"), "pick please");
    }
}
