//! Matcher types.

use anchorsmith_core::AnchorCandidate;
use serde::{Deserialize, Serialize};

/// Best reference link for one anchor candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkMatch {
    pub anchor: AnchorCandidate,
    pub url: String,
    pub topic: String,
    /// Cosine similarity in [0, 1].
    pub similarity: f64,
}

/// Which part of the reference table a language-aware match drew from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceScope {
    /// References sharing the detected language prefix.
    Language,
    /// No reference matched the language; the whole table was used.
    FullTable,
}
