//! Converse intents: fuzzy matching of utterances against named sample
//! sets while a skill is active.

mod matcher;
mod set;

pub use matcher::{ConverseMatcher, IntentMatch, EXACT_MATCH_CONFIDENCE, SLOT_MATCH_CONFIDENCE};
pub use set::{ConverseMatcherSet, DEFAULT_MIN_INTENT_CONF};
