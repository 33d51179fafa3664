//! Converse matchers keyed by language.

use std::collections::HashMap;
use tracing::debug;

use super::matcher::{ConverseMatcher, IntentMatch};
use crate::domain::language::{closest_match, standardize_lang_tag, MAX_LANGUAGE_DISTANCE};

/// Default minimum confidence for accepting a converse intent.
pub const DEFAULT_MIN_INTENT_CONF: f64 = 0.5;

/// One [`ConverseMatcher`] per native language, created on first
/// registration and then only read.
#[derive(Debug, Clone, Default)]
pub struct ConverseMatcherSet {
    matchers: HashMap<String, ConverseMatcher>,
}

impl ConverseMatcherSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds samples for `name` to the matcher of `lang`.
    pub fn register<S: AsRef<str>>(&mut self, name: &str, samples: &[S], lang: &str) -> usize {
        let lang = standardize_lang_tag(lang);
        let matcher = self
            .matchers
            .entry(lang.clone())
            .or_insert_with(|| ConverseMatcher::new(lang.clone()));
        let count = matcher.add_intent(name, samples);
        debug!(intent = %name, lang = %lang, samples = count, "Registered converse intent");
        count
    }

    pub fn languages(&self) -> Vec<String> {
        let mut langs: Vec<String> = self.matchers.keys().cloned().collect();
        langs.sort();
        langs
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.values().all(ConverseMatcher::is_empty)
    }

    /// Registered language closest to `requested`, or `None` when every
    /// candidate is a different language.
    pub fn resolve_language(&self, requested: &str) -> Option<String> {
        let langs = self.languages();
        let (closest, distance) = closest_match(requested, &langs)?;
        if distance >= MAX_LANGUAGE_DISTANCE {
            debug!(requested = %requested, closest = %closest, distance, "No converse matcher for language");
            return None;
        }
        Some(closest)
    }

    /// Single best match over all utterances, accepted at `min_conf` or above.
    /// Equal confidences keep the first utterance.
    pub fn match_utterances<S: AsRef<str>>(
        &self,
        utterances: &[S],
        lang: &str,
        min_conf: f64,
        strict: bool,
    ) -> Option<IntentMatch> {
        let resolved = self.resolve_language(lang)?;
        let matcher = self.matchers.get(&resolved)?;

        let mut best: Option<IntentMatch> = None;
        for utterance in utterances {
            let Some(candidate) = matcher.calc_intent(utterance.as_ref(), strict) else {
                continue;
            };
            if best.as_ref().map_or(true, |b| candidate.confidence > b.confidence) {
                best = Some(candidate);
            }
        }
        best.filter(|m| m.confidence >= min_conf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn booking() -> ConverseMatcherSet {
        let mut set = ConverseMatcherSet::new();
        set.register("book_flight", &["book me a flight", "I want to fly"], "en-US");
        set
    }

    #[test]
    fn book_flight_end_to_end() {
        let m = booking()
            .match_utterances(&["i want to fly somewhere"], "en-us", DEFAULT_MIN_INTENT_CONF, false)
            .unwrap();
        assert_eq!(m.name, "book_flight");
        assert!(m.confidence >= 0.5);
    }

    #[test]
    fn registered_language_resolves_to_itself() {
        let set = booking();
        assert_eq!(set.resolve_language("en-US").as_deref(), Some("en-US"));
        assert_eq!(set.resolve_language("en").as_deref(), Some("en-US"));
    }

    #[test]
    fn different_language_is_not_resolved() {
        let mut set = ConverseMatcherSet::new();
        set.register("greet", &["bonjour"], "fr-FR");
        assert!(set.resolve_language("en-US").is_none());
        assert!(set
            .match_utterances(&["bonjour"], "en-US", 0.0, false)
            .is_none());
    }

    #[test]
    fn first_utterance_wins_ties() {
        let mut set = ConverseMatcherSet::new();
        set.register("coffee", &["coffee"], "en-US");
        set.register("tea", &["tea"], "en-US");
        let m = set
            .match_utterances(&["tea", "coffee"], "en-US", 0.5, false)
            .unwrap();
        assert_eq!(m.name, "tea");
        assert_eq!(m.utterance, "tea");
    }

    #[test]
    fn low_confidence_is_rejected() {
        let set = booking();
        assert!(set
            .match_utterances(&["what is the weather like today"], "en-US", 0.5, false)
            .is_none());
    }

    #[test]
    fn registration_per_language_is_independent() {
        let mut set = booking();
        set.register("book_flight", &["marca um voo"], "pt-PT");
        assert_eq!(set.languages(), vec!["en-US".to_string(), "pt-PT".to_string()]);
        let m = set
            .match_utterances(&["marca um voo"], "pt", 0.5, true)
            .map(|m| m.name);
        // bare "pt" fills to pt-BR, a regional variant of pt-PT
        assert_eq!(m.as_deref(), Some("book_flight"));
    }

    proptest! {
        #[test]
        fn resolution_is_reflexive(lang in "(en|pt|fr|de|es)-(US|GB|PT|BR|FR|DE|ES)") {
            let mut set = ConverseMatcherSet::new();
            set.register("x", &["sample"], &lang);
            prop_assert_eq!(set.resolve_language(&lang), Some(standardize_lang_tag(&lang)));
        }
    }
}
