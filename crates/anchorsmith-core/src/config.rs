//! Pipeline configuration.
//!
//! Loaded from an optional JSON file (missing fields take defaults), then
//! overridden from `ANCHORSMITH_*` environment variables.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};

pub const DEFAULT_PORT: u16 = 3004;

/// Generic anchor phrases that never make useful link text.
pub const DEFAULT_BLOCKLIST: &[&str] = &[
    "click here",
    "read more",
    "learn more",
    "here",
    "this link",
    "bonus",
    "website",
    "more info",
];

/// How the reference table is vectorized for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Fit one space per row over reference topics plus the row's candidates.
    Joint,
    /// Fit once over reference topics; filter references by detected language.
    LanguageAware,
}

impl std::str::FromStr for MatchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "joint" => Ok(MatchMode::Joint),
            "language_aware" | "language" => Ok(MatchMode::LanguageAware),
            other => Err(Error::Config(format!("unknown match mode: {}", other))),
        }
    }
}

/// When punctuation is stripped relative to markup removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunctuationPolicy {
    #[default]
    AfterMarkup,
    BeforeMarkup,
    Keep,
}

/// Knobs for anchor candidate generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Number of phrases requested from the model (and kept at most).
    pub target_count: usize,
    pub min_words: usize,
    pub max_words: usize,
    /// Characters of source text included in the prompt.
    pub prefix_chars: usize,
    pub temperature: f64,
    pub max_tokens: usize,
    /// Overrides the provider's configured model.
    pub model: Option<String>,
    pub blocklist: Vec<String>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            target_count: 10,
            min_words: 2,
            max_words: 4,
            prefix_chars: 2000,
            temperature: 0.7,
            max_tokens: 150,
            model: None,
            blocklist: DEFAULT_BLOCKLIST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// HTTP server port.
    pub port: u16,
    pub generation: GenerationSettings,
    pub match_mode: MatchMode,
    /// Language code used when detection is impossible or ambiguous.
    pub fallback_language: String,
    /// Inputs shorter than this (in chars) skip detection.
    pub min_language_chars: usize,
    pub punctuation: PunctuationPolicy,
    /// Fetch `source_url` when an opportunity row has no text.
    pub fetch_missing_content: bool,
    pub fetch_timeout_secs: u64,
    /// Rows processed at once. Output order is always input order.
    pub concurrency: usize,
    /// Round similarity scores to 3 decimals on export.
    pub round_similarity: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            generation: GenerationSettings::default(),
            match_mode: MatchMode::LanguageAware,
            fallback_language: "en".into(),
            min_language_chars: 10,
            punctuation: PunctuationPolicy::AfterMarkup,
            fetch_missing_content: false,
            fetch_timeout_secs: 10,
            concurrency: 1,
            round_similarity: true,
        }
    }
}

impl PipelineConfig {
    /// Load from an optional JSON file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("cannot read {}: {}", path.display(), e))
                })?;
                let parsed: PipelineConfig = serde_json::from_str(&raw).map_err(|e| {
                    Error::Config(format!("invalid config {}: {}", path.display(), e))
                })?;
                info!("Loaded pipeline config from {}", path.display());
                parsed
            }
            None => PipelineConfig::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `ANCHORSMITH_*` (and `PORT`) overrides from a variable lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = get("PORT") {
            self.port = parse_var("PORT", &v)?;
        }
        if let Some(v) = get("ANCHORSMITH_MODEL") {
            self.generation.model = Some(v);
        }
        if let Some(v) = get("ANCHORSMITH_TEMPERATURE") {
            self.generation.temperature = parse_var("ANCHORSMITH_TEMPERATURE", &v)?;
        }
        if let Some(v) = get("ANCHORSMITH_MAX_TOKENS") {
            self.generation.max_tokens = parse_var("ANCHORSMITH_MAX_TOKENS", &v)?;
        }
        if let Some(v) = get("ANCHORSMITH_ANCHOR_COUNT") {
            self.generation.target_count = parse_var("ANCHORSMITH_ANCHOR_COUNT", &v)?;
        }
        if let Some(v) = get("ANCHORSMITH_FALLBACK_LANGUAGE") {
            self.fallback_language = v.to_lowercase();
        }
        if let Some(v) = get("ANCHORSMITH_CONCURRENCY") {
            self.concurrency = parse_var("ANCHORSMITH_CONCURRENCY", &v)?;
        }
        if let Some(v) = get("ANCHORSMITH_MATCH_MODE") {
            self.match_mode = v.parse()?;
        }
        if let Some(v) = get("ANCHORSMITH_FETCH_TIMEOUT_SECS") {
            self.fetch_timeout_secs = parse_var("ANCHORSMITH_FETCH_TIMEOUT_SECS", &v)?;
        }
        Ok(())
    }

    /// Reject settings the pipeline cannot honor.
    pub fn validate(&self) -> Result<()> {
        let g = &self.generation;
        if g.min_words == 0 || g.min_words > g.max_words {
            return Err(Error::Config(format!(
                "invalid anchor word bounds: {}..={}",
                g.min_words, g.max_words
            )));
        }
        if g.target_count == 0 {
            return Err(Error::Config("anchor target count must be positive".into()));
        }
        if !(0.0..=2.0).contains(&g.temperature) {
            return Err(Error::Config(format!(
                "temperature out of range: {}",
                g.temperature
            )));
        }
        if self.fallback_language.chars().count() != 2 {
            warn!(
                "Fallback language '{}' is not a two-letter code",
                self.fallback_language
            );
        }
        Ok(())
    }

    /// Concurrency clamped to at least one row at a time.
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("invalid value for {}: {}", key, value)))
}
