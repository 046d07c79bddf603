//! Anchor candidate generator.
//!
//! Prompt → completion → parse → filter. The generator never fails: a
//! service error, an unparseable reply or a reply where nothing survives the
//! filter degrades to the seed keyword (origin `fallback`), or to nothing
//! when the row has no seed.

use std::collections::HashSet;
use std::sync::Arc;

use anchorsmith_core::{AnchorCandidate, GenerationSettings};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::client::TextGenerator;
use crate::prompt::build_prompt;
use crate::types::CompletionRequest;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[A-Za-z]*").unwrap());
static LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-*•]+|\(?\d+[.)]|[a-z][.)])\s*").unwrap());

const QUOTES: &[char] = &['"', '\'', '`', '“', '”', '‘', '’', '[', ']'];

/// Input for one generation call.
#[derive(Debug, Clone, Default)]
pub struct AnchorRequest {
    /// Source text; truncated to the configured prefix in the prompt.
    pub text: String,
    /// Row keyword the anchors should revolve around.
    pub seed: Option<String>,
}

impl AnchorRequest {
    pub fn new(text: impl Into<String>, seed: Option<&str>) -> Self {
        Self {
            text: text.into(),
            seed: seed
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

pub struct AnchorGenerator {
    service: Arc<dyn TextGenerator>,
    settings: GenerationSettings,
}

impl AnchorGenerator {
    pub fn new(service: Arc<dyn TextGenerator>, settings: GenerationSettings) -> Self {
        Self { service, settings }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Generate candidates for one request.
    pub async fn generate(&self, request: &AnchorRequest) -> Vec<AnchorCandidate> {
        let seed = request.seed.as_deref();
        if seed.is_none() && request.text.trim().is_empty() {
            debug!("Nothing to generate from: no seed and no text");
            return Vec::new();
        }
        let completion = CompletionRequest {
            prompt: build_prompt(&self.settings, seed, &request.text),
            model: self.settings.model.clone(),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let reply = match self.service.complete(&completion).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    "Anchor generation via {} failed: {}",
                    self.service.describe(),
                    e
                );
                return fallback(seed);
            }
        };

        let parsed = parse_phrases(&reply);
        if parsed.is_empty() {
            warn!("Model reply contained no phrases: {:?}", truncate_log(&reply));
            return fallback(seed);
        }

        let kept = filter_phrases(parsed, seed, &self.settings);
        if kept.is_empty() {
            warn!("No generated anchor survived filtering (seed: {:?})", seed);
            return fallback(seed);
        }

        debug!("Generated {} anchor candidates", kept.len());
        kept.into_iter().map(AnchorCandidate::generated).collect()
    }
}

fn fallback(seed: Option<&str>) -> Vec<AnchorCandidate> {
    seed.map(|s| vec![AnchorCandidate::fallback(s)])
        .unwrap_or_default()
}

fn truncate_log(text: &str) -> &str {
    crate::prompt::truncate_chars(text, 120)
}

/// Parse a model reply into raw phrases.
///
/// Strict first: strip code fences and decode the outermost `[...]` as a
/// JSON array of strings. Otherwise split on newlines and commas, dropping
/// list bullets, numbering and surrounding quotes.
pub fn parse_phrases(reply: &str) -> Vec<String> {
    let cleaned = CODE_FENCE.replace_all(reply, "");
    let cleaned = cleaned.trim();

    if let (Some(start), Some(end)) = (cleaned.find('['), cleaned.rfind(']')) {
        if start < end {
            if let Ok(items) = serde_json::from_str::<Vec<String>>(&cleaned[start..=end]) {
                return items
                    .into_iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
        }
    }

    cleaned
        .split(['\n', ','])
        .map(|piece| {
            let piece = piece.trim();
            let piece = LIST_MARKER.replace(piece, "");
            piece.trim().trim_matches(QUOTES).trim().to_string()
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// Apply word bounds, seed and blocklist rules, case-insensitive dedupe and
/// the target count.
pub fn filter_phrases(
    phrases: Vec<String>,
    seed: Option<&str>,
    settings: &GenerationSettings,
) -> Vec<String> {
    let seed = seed.map(|s| collapse(s).to_lowercase());
    let blocklist: Vec<String> = settings
        .blocklist
        .iter()
        .map(|b| collapse(b).to_lowercase())
        .filter(|b| !b.is_empty())
        .collect();

    let mut seen = HashSet::new();
    let mut kept = Vec::new();

    for phrase in phrases {
        let phrase = collapse(&phrase);
        let lower = phrase.to_lowercase();
        let words = phrase.split_whitespace().count();

        if words < settings.min_words || words > settings.max_words {
            continue;
        }
        if let Some(seed) = &seed {
            if seed.contains(&lower) {
                continue;
            }
        }
        if is_blocked(&lower, &blocklist) {
            continue;
        }
        if !seen.insert(lower) {
            continue;
        }
        kept.push(phrase);
        if kept.len() >= settings.target_count {
            break;
        }
    }
    kept
}

/// Exact blocklist hits, or a multi-word blocklist entry appearing as a word
/// sequence inside the phrase.
fn is_blocked(phrase: &str, blocklist: &[String]) -> bool {
    let padded = format!(" {} ", phrase);
    blocklist.iter().any(|b| {
        phrase == b || (b.contains(' ') && padded.contains(&format!(" {} ", b)))
    })
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
