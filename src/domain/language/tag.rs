//! BCP-47 language tag parsing and normalization.

use std::fmt;

use crate::domain::foundation::ValidationError;

/// The subset of a BCP-47 tag the runtime cares about.
///
/// Variants and extensions are accepted but dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageTag {
    pub language: String,
    pub script: Option<String>,
    pub region: Option<String>,
}

impl LanguageTag {
    /// Parses `en-us`, `en_US`, `zh-hant-tw`, `es-419` and friends.
    pub fn parse(tag: &str) -> Result<Self, ValidationError> {
        let mut parts = tag.trim().split(['-', '_']).filter(|p| !p.is_empty());

        let language = parts
            .next()
            .ok_or_else(|| ValidationError::empty_field("lang"))?;
        if !(2..=3).contains(&language.len()) || !language.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(ValidationError::invalid_format(
                "lang",
                format!("'{}' is not a language subtag", language),
            ));
        }

        let mut parsed = Self {
            language: language.to_ascii_lowercase(),
            script: None,
            region: None,
        };

        for part in parts {
            let is_alpha = part.chars().all(|c| c.is_ascii_alphabetic());
            let is_digit = part.chars().all(|c| c.is_ascii_digit());
            if parsed.script.is_none() && parsed.region.is_none() && part.len() == 4 && is_alpha {
                parsed.script = Some(title_case(part));
            } else if parsed.region.is_none()
                && ((part.len() == 2 && is_alpha) || (part.len() == 3 && is_digit))
            {
                parsed.region = Some(part.to_ascii_uppercase());
            }
        }

        Ok(parsed)
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.language)?;
        if let Some(script) = &self.script {
            write!(f, "-{}", script)?;
        }
        if let Some(region) = &self.region {
            write!(f, "-{}", region)?;
        }
        Ok(())
    }
}

fn title_case(s: &str) -> String {
    let lower = s.to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Normalizes a tag for use as a map key: `"en-us"` -> `"en-US"`.
///
/// Unparseable input is returned trimmed but otherwise untouched.
pub fn standardize_lang_tag(tag: &str) -> String {
    LanguageTag::parse(tag)
        .map(|t| t.to_string())
        .unwrap_or_else(|_| tag.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardizes_case() {
        assert_eq!(standardize_lang_tag("en-us"), "en-US");
        assert_eq!(standardize_lang_tag("EN"), "en");
        assert_eq!(standardize_lang_tag("pt_br"), "pt-BR");
    }

    #[test]
    fn parses_script_and_region() {
        let tag = LanguageTag::parse("zh-hant-tw").unwrap();
        assert_eq!(tag.language, "zh");
        assert_eq!(tag.script.as_deref(), Some("Hant"));
        assert_eq!(tag.region.as_deref(), Some("TW"));
        assert_eq!(tag.to_string(), "zh-Hant-TW");
    }

    #[test]
    fn numeric_region_is_kept() {
        assert_eq!(standardize_lang_tag("es-419"), "es-419");
    }

    #[test]
    fn rejects_garbage() {
        assert!(LanguageTag::parse("").is_err());
        assert!(LanguageTag::parse("english").is_err());
        assert_eq!(standardize_lang_tag(" english "), "english");
    }
}
