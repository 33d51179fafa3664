//! Fuzzy string scoring.

use super::normalize::normalize_text;

/// Similarity of two normalized strings in `[0, 1]`: the best of
/// edit-distance similarity and whole-word containment of `sample` in
/// `utterance`, which scores `0.5 + 0.5 * len(sample) / len(utterance)`.
pub fn fuzzy_score(sample: &str, utterance: &str) -> f64 {
    let similarity = strsim::normalized_levenshtein(sample, utterance);
    let containment = if !sample.is_empty()
        && !utterance.is_empty()
        && format!(" {} ", utterance).contains(&format!(" {} ", sample))
    {
        0.5 + 0.5 * sample.chars().count() as f64 / utterance.chars().count() as f64
    } else {
        0.0
    };
    similarity.max(containment)
}

/// Best scoring choice for `query`; ties keep the earlier choice.
pub fn match_one<S: AsRef<str>>(query: &str, choices: &[S]) -> Option<(String, f64)> {
    let query = normalize_text(query);
    let mut best: Option<(String, f64)> = None;
    for choice in choices {
        let score = fuzzy_score(&normalize_text(choice.as_ref()), &query);
        if best.as_ref().map_or(true, |(_, b)| score > *b) {
            best = Some((choice.as_ref().to_string(), score));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(fuzzy_score("same words", "same words"), 1.0);
    }

    #[test]
    fn containment_needs_whole_words() {
        let contained = fuzzy_score("to fly", "i want to fly somewhere");
        assert!(contained > 0.5);
        let partial = fuzzy_score("fly", "butterfly");
        assert!(partial < 0.5);
    }

    #[test]
    fn score_is_bounded() {
        let score = fuzzy_score("abc", "xyz");
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn match_one_picks_closest_choice() {
        let choices = ["green tea", "black coffee", "water"];
        let (best, score) = match_one("Black coffee please", &choices).unwrap();
        assert_eq!(best, "black coffee");
        assert!(score >= 0.65);
    }

    #[test]
    fn match_one_on_empty_choices() {
        let choices: [&str; 0] = [];
        assert!(match_one("anything", &choices).is_none());
    }
}
