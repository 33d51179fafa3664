//! Language tag handling.
//!
//! - `standardize_lang_tag` - canonical casing used for every map key
//! - `closest_match` - pick the nearest registered language for a request

mod distance;
mod tag;

pub use distance::{closest_match, language_distance, tag_distance, MAX_LANGUAGE_DISTANCE};
pub use tag::{standardize_lang_tag, LanguageTag};
