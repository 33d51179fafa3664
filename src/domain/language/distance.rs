//! Language distance metric and closest-match resolution.
//!
//! Scale:
//! - 0: same language once likely region/script are filled in
//! - 1..=3: minor regional variant (same regional cluster)
//! - 4..=9: other regional difference, still usable
//! - >= 10: different script or language, must be rejected

use super::LanguageTag;

/// Distances at or above this value mean "different language".
pub const MAX_LANGUAGE_DISTANCE: u32 = 10;

const SCRIPT_MISMATCH: u32 = 20;
const LANGUAGE_MISMATCH: u32 = 100;
const MACROLANGUAGE_MATCH: u32 = 1;
const MINOR_REGION: u32 = 3;
const OTHER_REGION: u32 = 4;

const LIKELY_REGIONS: &[(&str, &str)] = &[
    ("ar", "EG"),
    ("ca", "ES"),
    ("cs", "CZ"),
    ("da", "DK"),
    ("de", "DE"),
    ("el", "GR"),
    ("en", "US"),
    ("es", "ES"),
    ("eu", "ES"),
    ("fa", "IR"),
    ("fi", "FI"),
    ("fr", "FR"),
    ("gl", "ES"),
    ("he", "IL"),
    ("hi", "IN"),
    ("hu", "HU"),
    ("it", "IT"),
    ("ja", "JP"),
    ("ko", "KR"),
    ("nb", "NO"),
    ("nl", "NL"),
    ("no", "NO"),
    ("pl", "PL"),
    ("pt", "BR"),
    ("ro", "RO"),
    ("ru", "RU"),
    ("sv", "SE"),
    ("tr", "TR"),
    ("uk", "UA"),
    ("zh", "CN"),
];

const LIKELY_SCRIPTS: &[(&str, &str)] = &[
    ("ar", "Arab"),
    ("el", "Grek"),
    ("fa", "Arab"),
    ("he", "Hebr"),
    ("hi", "Deva"),
    ("ja", "Jpan"),
    ("ko", "Kore"),
    ("ru", "Cyrl"),
    ("sr", "Cyrl"),
    ("uk", "Cyrl"),
    ("zh", "Hans"),
];

/// Regions that differ only slightly for a given language.
const REGION_CLUSTERS: &[(&str, &[&str])] = &[
    ("en", &["GB", "IE", "AU", "NZ", "ZA", "IN"]),
    ("en", &["US", "CA"]),
    ("es", &["MX", "US", "AR", "CO", "CL", "PE", "VE", "419"]),
    ("fr", &["FR", "BE", "CH", "LU"]),
    ("de", &["DE", "AT", "CH", "LU"]),
    ("pt", &["PT", "AO", "MZ"]),
    ("nl", &["NL", "BE"]),
];

const MACROLANGUAGES: &[(&str, &str)] = &[("nb", "no"), ("nn", "no")];

fn lookup<'a>(table: &'a [(&str, &str)], language: &str) -> Option<&'a str> {
    table
        .iter()
        .find(|(lang, _)| *lang == language)
        .map(|(_, value)| *value)
}

fn same_language(a: &str, b: &str) -> Option<u32> {
    if a == b {
        return Some(0);
    }
    let macro_of = |l: &str| lookup(MACROLANGUAGES, l).unwrap_or(l).to_string();
    if macro_of(a) == macro_of(b) {
        return Some(MACROLANGUAGE_MATCH);
    }
    None
}

fn likely_script(tag: &LanguageTag) -> String {
    tag.script
        .clone()
        .or_else(|| lookup(LIKELY_SCRIPTS, &tag.language).map(str::to_string))
        .unwrap_or_else(|| "Latn".to_string())
}

fn likely_region(tag: &LanguageTag) -> Option<String> {
    tag.region
        .clone()
        .or_else(|| lookup(LIKELY_REGIONS, &tag.language).map(str::to_string))
}

fn same_cluster(language: &str, a: &str, b: &str) -> bool {
    REGION_CLUSTERS
        .iter()
        .any(|(lang, regions)| *lang == language && regions.contains(&a) && regions.contains(&b))
}

/// Distance between two parsed tags.
pub fn tag_distance(desired: &LanguageTag, supported: &LanguageTag) -> u32 {
    let Some(base) = same_language(&desired.language, &supported.language) else {
        return LANGUAGE_MISMATCH;
    };

    if likely_script(desired) != likely_script(supported) {
        return SCRIPT_MISMATCH;
    }

    let region_distance = match (likely_region(desired), likely_region(supported)) {
        (Some(a), Some(b)) if a == b => 0,
        (Some(a), Some(b)) if same_cluster(&desired.language, &a, &b) => MINOR_REGION,
        (None, None) => 0,
        _ => OTHER_REGION,
    };

    base + region_distance
}

/// Distance between two raw tags; unparseable tags only match themselves.
pub fn language_distance(desired: &str, supported: &str) -> u32 {
    match (LanguageTag::parse(desired), LanguageTag::parse(supported)) {
        (Ok(a), Ok(b)) => tag_distance(&a, &b),
        _ if desired.trim().eq_ignore_ascii_case(supported.trim()) => 0,
        _ => LANGUAGE_MISMATCH,
    }
}

/// Finds the supported tag closest to `desired` (first wins on ties).
///
/// Returns the best candidate and its distance even when it is too far;
/// callers compare against [`MAX_LANGUAGE_DISTANCE`].
pub fn closest_match<'a, I>(desired: &str, supported: I) -> Option<(String, u32)>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut best: Option<(String, u32)> = None;
    for candidate in supported {
        let distance = language_distance(desired, candidate);
        if best.as_ref().map_or(true, |(_, d)| distance < *d) {
            best = Some((candidate.clone(), distance));
        }
    }
    best
}
