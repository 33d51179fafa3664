//! Per-language fuzzy matcher over named sample sets.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::domain::text::{
    expand_template, fuzzy_score, normalize_text, tokenize_template, TemplatePart,
};

/// Confidence of a template match that captured no slots.
pub const EXACT_MATCH_CONFIDENCE: f64 = 1.0;

/// Confidence of a template match that captured slots.
pub const SLOT_MATCH_CONFIDENCE: f64 = 0.95;

/// Best match for an utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentMatch {
    pub name: String,
    pub confidence: f64,
    /// Slot name to captured text.
    #[serde(default)]
    pub slots: BTreeMap<String, String>,
    /// Utterance that produced the match.
    pub utterance: String,
}

#[derive(Debug, Clone)]
struct Sample {
    /// Literal text with slots dropped; used for fuzzy scoring.
    text: String,
    pattern: Option<Regex>,
    has_slots: bool,
}

impl Sample {
    fn compile(variant: &str) -> Option<Self> {
        let parts = tokenize_template(variant);
        if parts.is_empty() {
            return None;
        }

        let mut regex_parts = Vec::with_capacity(parts.len());
        let mut text_parts = Vec::new();
        let mut seen_slots: Vec<String> = Vec::new();
        for part in &parts {
            match part {
                TemplatePart::Text(text) => {
                    let words: Vec<String> = text.split(' ').map(regex::escape).collect();
                    regex_parts.push(words.join(r"\s+"));
                    text_parts.push(text.clone());
                }
                TemplatePart::Slot(name) => {
                    let group = slot_group_name(name);
                    if group.is_empty() || seen_slots.contains(&group) {
                        regex_parts.push("(?:.+?)".to_string());
                    } else {
                        regex_parts.push(format!("(?P<{}>.+?)", group));
                        seen_slots.push(group);
                    }
                }
            }
        }

        let has_slots = parts.iter().any(|p| matches!(p, TemplatePart::Slot(_)));
        let source = format!("^{}$", regex_parts.join(r"\s+"));
        let pattern = match Regex::new(&source) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(sample = %variant, error = %e, "Sample could not be compiled, fuzzy only");
                None
            }
        };

        Some(Self {
            text: text_parts.join(" "),
            pattern,
            has_slots,
        })
    }

    /// Scores a normalized utterance; `None` when nothing matched.
    fn score(&self, utterance: &str, strict: bool) -> Option<(f64, BTreeMap<String, String>)> {
        if let Some(pattern) = &self.pattern {
            if let Some(caps) = pattern.captures(utterance) {
                let slots: BTreeMap<String, String> = pattern
                    .capture_names()
                    .flatten()
                    .filter_map(|name| {
                        caps.name(name)
                            .map(|m| (name.to_string(), m.as_str().trim().to_string()))
                    })
                    .collect();
                let confidence = if self.has_slots {
                    SLOT_MATCH_CONFIDENCE
                } else {
                    EXACT_MATCH_CONFIDENCE
                };
                return Some((confidence, slots));
            }
        }

        if strict || self.has_slots || self.text.is_empty() {
            return None;
        }
        let confidence = fuzzy_score(&self.text, utterance);
        (confidence > 0.0).then(|| (confidence, BTreeMap::new()))
    }
}

/// Regex group names only allow word characters.
fn slot_group_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .to_string()
}

#[derive(Debug, Clone)]
struct IntentDefinition {
    name: String,
    samples: Vec<Sample>,
}

/// Named sample sets for one language.
#[derive(Debug, Clone)]
pub struct ConverseMatcher {
    lang: String,
    intents: Vec<IntentDefinition>,
}

impl ConverseMatcher {
    pub fn new(lang: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            intents: Vec::new(),
        }
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn intent_names(&self) -> impl Iterator<Item = &str> {
        self.intents.iter().map(|i| i.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// Adds (or replaces) intent `name` from sample lines.
    ///
    /// Returns the number of compiled sample variants.
    pub fn add_intent<S: AsRef<str>>(&mut self, name: &str, lines: &[S]) -> usize {
        let samples: Vec<Sample> = lines
            .iter()
            .flat_map(|line| expand_template(line.as_ref()))
            .filter_map(|variant| Sample::compile(&variant))
            .collect();
        let count = samples.len();

        let definition = IntentDefinition {
            name: name.to_string(),
            samples,
        };
        match self.intents.iter_mut().find(|i| i.name == name) {
            Some(existing) => *existing = definition,
            None => self.intents.push(definition),
        }
        count
    }

    /// Highest scoring intent for one utterance. Ties keep the intent
    /// registered first.
    pub fn calc_intent(&self, utterance: &str, strict: bool) -> Option<IntentMatch> {
        let normalized = normalize_text(utterance);
        if normalized.is_empty() {
            return None;
        }

        let mut best: Option<IntentMatch> = None;
        for intent in &self.intents {
            for sample in &intent.samples {
                let Some((confidence, slots)) = sample.score(&normalized, strict) else {
                    continue;
                };
                if best.as_ref().map_or(true, |b| confidence > b.confidence) {
                    best = Some(IntentMatch {
                        name: intent.name.clone(),
                        confidence,
                        slots,
                        utterance: utterance.to_string(),
                    });
                }
            }
        }
        best
    }
}
