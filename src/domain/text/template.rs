//! Sample phrase templates.
//!
//! A sample line may contain:
//! - `(a|b)` alternation
//! - `[word]` optional words
//! - `{slot}` captures, filled from the matched utterance
//!
//! Lines are expanded into plain variants before matching.

use super::normalize::{collapse_whitespace, normalize_text};

/// Upper bound on variants produced from one line.
const MAX_EXPANSIONS: usize = 512;

/// Expands alternations and optional groups: `"[please] (call|ring) {name}"`
/// gives four variants.
///
/// Unbalanced brackets are treated as literal text.
pub fn expand_template(line: &str) -> Vec<String> {
    let mut variants: Vec<String> = expand(line)
        .into_iter()
        .map(|v| collapse_whitespace(&v))
        .filter(|v| !v.is_empty())
        .collect();
    variants.dedup();
    variants.truncate(MAX_EXPANSIONS);
    variants
}

fn expand(s: &str) -> Vec<String> {
    let Some((open, close)) = first_group(s) else {
        return vec![s.to_string()];
    };

    let prefix = &s[..open];
    let inner = &s[open + 1..close];
    let suffix = &s[close + 1..];

    let mut options = split_top_level(inner);
    if s[open..].starts_with('[') {
        options.push(String::new());
    }

    let tails = expand(suffix);
    let mut out = Vec::new();
    for option in options {
        for head in expand(&option) {
            for tail in &tails {
                if out.len() >= MAX_EXPANSIONS {
                    return out;
                }
                out.push(format!("{} {} {}", prefix, head, tail));
            }
        }
    }
    out
}

/// Byte offsets of the first balanced `(...)` or `[...]` group.
fn first_group(s: &str) -> Option<(usize, usize)> {
    let open = s.find(['(', '['])?;
    let mut depth = 0usize;
    for (i, c) in s[open..].char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some((open, open + i));
                }
            }
            _ => {}
        }
    }
    None
}

fn split_top_level(inner: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in inner.chars() {
        match c {
            '(' | '[' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            '|' if depth == 0 => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

/// Piece of an expanded template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    /// Normalized literal words.
    Text(String),
    /// Slot name, lowercased.
    Slot(String),
}

/// Splits an expanded variant into normalized text and slots.
pub fn tokenize_template(variant: &str) -> Vec<TemplatePart> {
    let mut parts = Vec::new();
    let mut rest = variant;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        push_text(&mut parts, &rest[..start]);
        let name = rest[start + 1..start + len].trim().to_lowercase();
        if !name.is_empty() {
            parts.push(TemplatePart::Slot(name));
        }
        rest = &rest[start + len + 1..];
    }
    push_text(&mut parts, rest);
    parts
}

fn push_text(parts: &mut Vec<TemplatePart>, text: &str) {
    let normalized = normalize_text(text);
    if !normalized.is_empty() {
        parts.push(TemplatePart::Text(normalized));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_line_is_unchanged() {
        assert_eq!(expand_template("book me a flight"), vec!["book me a flight"]);
    }

    #[test]
    fn alternation_and_optional_expand() {
        let mut variants = expand_template("[please] (call|ring) {name}");
        variants.sort();
        assert_eq!(
            variants,
            vec!["call {name}", "please call {name}", "please ring {name}", "ring {name}"]
        );
    }

    #[test]
    fn nested_groups_expand() {
        let mut variants = expand_template("turn (on|off [the]) lights");
        variants.sort();
        assert_eq!(
            variants,
            vec!["turn off lights", "turn off the lights", "turn on lights"]
        );
    }

    #[test]
    fn unbalanced_bracket_is_literal() {
        assert_eq!(expand_template("what (is"), vec!["what (is"]);
    }

    #[test]
    fn tokenize_splits_slots() {
        let parts = tokenize_template("Fly to {Destination} please!");
        assert_eq!(
            parts,
            vec![
                TemplatePart::Text("fly to".into()),
                TemplatePart::Slot("destination".into()),
                TemplatePart::Text("please".into()),
            ]
        );
    }
}
