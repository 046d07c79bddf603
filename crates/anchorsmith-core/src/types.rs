//! Pipeline data model.

use serde::{Deserialize, Serialize};

/// Language assumed for reference links whose table has no language column.
pub const DEFAULT_LANGUAGE: &str = "en";

/// An internal page available as a link target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLink {
    pub topic: String,
    pub url: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.into()
}

impl ReferenceLink {
    pub fn new(topic: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            url: url.into(),
            language: default_language(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Entries with a blank topic or URL never take part in matching.
    pub fn is_valid(&self) -> bool {
        !self.topic.trim().is_empty() && !self.url.trim().is_empty()
    }

    /// Lowercased two-letter language prefix ("en-US" → "en").
    pub fn language_prefix(&self) -> String {
        language_prefix(&self.language)
    }
}

/// Lowercased two-character prefix of a language code.
pub fn language_prefix(code: &str) -> String {
    code.trim().chars().take(2).collect::<String>().to_lowercase()
}

/// A page or context where a new internal link might be inserted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Opportunity {
    pub source_url: String,
    pub original_anchor: String,
    #[serde(default)]
    pub raw_text: String,
}

impl Opportunity {
    pub fn new(source_url: impl Into<String>, original_anchor: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            original_anchor: original_anchor.into(),
            raw_text: String::new(),
        }
    }

    pub fn with_text(mut self, raw_text: impl Into<String>) -> Self {
        self.raw_text = raw_text.into();
        self
    }

    /// Seed keyword for generation, if the row carries one.
    pub fn seed(&self) -> Option<&str> {
        let anchor = self.original_anchor.trim();
        (!anchor.is_empty()).then_some(anchor)
    }
}

/// Where an anchor candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateOrigin {
    Generated,
    Fallback,
}

impl std::fmt::Display for CandidateOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandidateOrigin::Generated => write!(f, "generated"),
            CandidateOrigin::Fallback => write!(f, "fallback"),
        }
    }
}

/// A short phrase proposed as anchor text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorCandidate {
    pub phrase: String,
    pub origin: CandidateOrigin,
}

impl AnchorCandidate {
    pub fn generated(phrase: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            origin: CandidateOrigin::Generated,
        }
    }

    pub fn fallback(phrase: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            origin: CandidateOrigin::Fallback,
        }
    }

    pub fn word_count(&self) -> usize {
        self.phrase.split_whitespace().count()
    }
}

/// A candidate paired with its best reference link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub opportunity: Opportunity,
    pub anchor: AnchorCandidate,
    pub matched_url: String,
    pub matched_topic: String,
    pub similarity: f64,
    pub language: String,
}

/// Overall state of a processed opportunity row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    /// At least one generated candidate was matched.
    Matched,
    /// Generation failed soft; only the seed keyword was matched.
    Fallback,
    /// No candidate or no reference survived.
    Empty,
}

impl std::fmt::Display for RowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowStatus::Matched => write!(f, "matched"),
            RowStatus::Fallback => write!(f, "fallback"),
            RowStatus::Empty => write!(f, "empty"),
        }
    }
}

/// Complete result of one opportunity row. Never emitted half-built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowOutcome {
    pub opportunity: Opportunity,
    pub language: String,
    pub status: RowStatus,
    pub matches: Vec<MatchResult>,
}

impl RowOutcome {
    /// Build an outcome, deriving the status from the matches.
    pub fn new(opportunity: Opportunity, language: String, matches: Vec<MatchResult>) -> Self {
        let status = if matches.is_empty() {
            RowStatus::Empty
        } else if matches
            .iter()
            .all(|m| m.anchor.origin == CandidateOrigin::Fallback)
        {
            RowStatus::Fallback
        } else {
            RowStatus::Matched
        };
        Self {
            opportunity,
            language,
            status,
            matches,
        }
    }
}

/// A row of an existing live-link table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRow {
    pub topic: String,
    pub url: String,
    pub anchor: String,
}

/// A hit from searching the live-link table by topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkHit {
    pub url: String,
    pub anchor: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_prefix() {
        assert_eq!(language_prefix("en-US"), "en");
        assert_eq!(language_prefix(" ES "), "es");
        assert_eq!(language_prefix(""), "");
    }

    #[test]
    fn test_reference_validity() {
        assert!(ReferenceLink::new("online darts", "/darts").is_valid());
        assert!(!ReferenceLink::new("  ", "/darts").is_valid());
        assert!(!ReferenceLink::new("darts", "").is_valid());
    }

    #[test]
    fn test_row_status_derivation() {
        let opp = Opportunity::new("https://blog.example/a", "darts");
        let make = |anchor: AnchorCandidate| MatchResult {
            opportunity: opp.clone(),
            anchor,
            matched_url: "/darts".into(),
            matched_topic: "online darts".into(),
            similarity: 0.5,
            language: "en".into(),
        };

        let empty = RowOutcome::new(opp.clone(), "en".into(), Vec::new());
        assert_eq!(empty.status, RowStatus::Empty);

        let fallback = RowOutcome::new(
            opp.clone(),
            "en".into(),
            vec![make(AnchorCandidate::fallback("darts"))],
        );
        assert_eq!(fallback.status, RowStatus::Fallback);

        let matched = RowOutcome::new(
            opp.clone(),
            "en".into(),
            vec![make(AnchorCandidate::generated("bet on darts"))],
        );
        assert_eq!(matched.status, RowStatus::Matched);
    }

    #[test]
    fn test_reference_language_default_on_deserialize() {
        let link: ReferenceLink =
            serde_json::from_str(r#"{"topic":"live casino","url":"/casino"}"#).unwrap();
        assert_eq!(link.language, "en");
    }
}
