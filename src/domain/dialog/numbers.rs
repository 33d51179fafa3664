//! Small number parsing and pronunciation used for option selection.
//!
//! Covers English and Portuguese words up to twenty, which is enough for
//! spoken list positions.

use crate::domain::text::normalize_text;

const EN_CARDINALS: [&str; 21] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen", "twenty",
];

const EN_ORDINALS: [&str; 21] = [
    "zeroth", "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth",
    "ninth", "tenth", "eleventh", "twelfth", "thirteenth", "fourteenth", "fifteenth",
    "sixteenth", "seventeenth", "eighteenth", "nineteenth", "twentieth",
];

const PT_CARDINALS: [&str; 21] = [
    "zero", "um", "dois", "tres", "quatro", "cinco", "seis", "sete", "oito", "nove", "dez",
    "onze", "doze", "treze", "catorze", "quinze", "dezasseis", "dezassete", "dezoito",
    "dezanove", "vinte",
];

const PT_ORDINALS: [&str; 21] = [
    "", "primeiro", "segundo", "terceiro", "quarto", "quinto", "sexto", "setimo", "oitavo",
    "nono", "decimo", "", "", "", "", "", "", "", "", "", "vigesimo",
];

fn tables(lang: &str) -> (&'static [&'static str; 21], &'static [&'static str; 21]) {
    if lang.to_lowercase().starts_with("pt") {
        (&PT_CARDINALS, &PT_ORDINALS)
    } else {
        (&EN_CARDINALS, &EN_ORDINALS)
    }
}

/// First number found in `text`: digits, cardinal words, or (with `ordinals`)
/// ordinal words and suffixed digits like `"2nd"`.
pub fn extract_number(text: &str, ordinals: bool, lang: &str) -> Option<u32> {
    let (cardinal_words, ordinal_words) = tables(lang);
    let normalized = normalize_text(text);

    for word in normalized.split(' ') {
        if let Ok(n) = word.parse::<u32>() {
            return Some(n);
        }
        if ordinals {
            let digits: String = word.chars().take_while(char::is_ascii_digit).collect();
            let suffix = &word[digits.len()..];
            if !digits.is_empty() && matches!(suffix, "st" | "nd" | "rd" | "th" | "o" | "a") {
                if let Ok(n) = digits.parse::<u32>() {
                    return Some(n);
                }
            }
        }
        if let Some(n) = cardinal_words.iter().position(|w| *w == word) {
            return Some(n as u32);
        }
        if ordinals {
            if let Some(n) = ordinal_words.iter().position(|w| !w.is_empty() && *w == word) {
                return Some(n as u32);
            }
        }
    }
    None
}

/// Spoken form of a small number; larger values fall back to digits.
pub fn pronounce_number(n: u32, lang: &str) -> String {
    let (cardinal_words, _) = tables(lang);
    cardinal_words
        .get(n as usize)
        .map(|w| w.to_string())
        .unwrap_or_else(|| n.to_string())
}
