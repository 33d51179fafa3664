//! Resource file kinds and the line format they share.

use std::fmt;

/// Locale resource families consumed by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Converse intent samples (`.intent`).
    Intent,
    /// Vocabulary phrases (`.voc`).
    Vocabulary,
    /// Dialog templates (`.dialog`).
    Dialog,
    /// Single words such as list connectors (`.word`).
    Word,
}

impl ResourceKind {
    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ResourceKind::Intent => "intent",
            ResourceKind::Vocabulary => "voc",
            ResourceKind::Dialog => "dialog",
            ResourceKind::Word => "word",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// One entry per line; blank lines and `#` comments are dropped.
pub fn parse_resource_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_comments_and_blank_lines() {
        let content = "# samples\nbook me a flight\n\n  I want to fly  \n#ignored\n";
        assert_eq!(
            parse_resource_lines(content),
            vec!["book me a flight", "I want to fly"]
        );
    }

    #[test]
    fn extensions_match_locale_layout() {
        assert_eq!(ResourceKind::Intent.extension(), "intent");
        assert_eq!(ResourceKind::Vocabulary.to_string(), "voc");
    }
}
