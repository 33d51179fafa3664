//! Text utilities shared by vocabulary matching and converse intents.

mod fuzzy;
mod normalize;
mod template;

pub use fuzzy::{fuzzy_score, match_one};
pub use normalize::{collapse_whitespace, normalize_text};
pub use template::{expand_template, tokenize_template, TemplatePart};
