//! Dialog rendering helpers.

mod numbers;
mod render;

pub use numbers::{extract_number, pronounce_number};
pub use render::{camel_case_split, join_word_list, render_template};
