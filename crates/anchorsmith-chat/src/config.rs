//! LLM configuration and provider selection.

use std::path::Path;

use anchorsmith_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{LLMConfigResponse, LLMProvider, ProviderTarget};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-20241022";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

pub const OPENAI_MODELS: &[&str] = &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo", "gpt-4"];
pub const ANTHROPIC_MODELS: &[&str] = &[
    "claude-sonnet-4-20250514",
    "claude-3-5-sonnet-20241022",
    "claude-3-5-haiku-20241022",
];
pub const GROQ_MODELS: &[&str] = &[
    "llama-3.3-70b-versatile",
    "llama-3.1-8b-instant",
    "gemma2-9b-it",
];

/// Stored LLM configuration (`llm-config.json`), keys filled from env.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_preferred")]
    pub preferred_provider: String,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    #[serde(default)]
    pub groq_api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,
    #[serde(default = "default_groq_model")]
    pub groq_model: String,
    /// Endpoint override for the selected provider.
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_preferred() -> String {
    "auto".into()
}
fn default_openai_model() -> String {
    DEFAULT_OPENAI_MODEL.into()
}
fn default_anthropic_model() -> String {
    DEFAULT_ANTHROPIC_MODEL.into()
}
fn default_groq_model() -> String {
    DEFAULT_GROQ_MODEL.into()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            preferred_provider: "auto".into(),
            openai_api_key: None,
            anthropic_api_key: None,
            groq_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.into(),
            anthropic_model: DEFAULT_ANTHROPIC_MODEL.into(),
            groq_model: DEFAULT_GROQ_MODEL.into(),
            base_url: None,
        }
    }
}

impl LlmConfig {
    /// Load config from an optional file, then fill keys from env vars.
    ///
    /// A missing file means defaults; an unreadable or malformed one is a
    /// configuration error.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) if path.exists() => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("cannot read {}: {}", path.display(), e))
                })?;
                let parsed: LlmConfig = serde_json::from_str(&raw).map_err(|e| {
                    Error::Config(format!("invalid LLM config {}: {}", path.display(), e))
                })?;
                info!("LLM config path: {}", path.display());
                parsed
            }
            Some(path) => {
                info!("No LLM config at {}, using environment", path.display());
                LlmConfig::default()
            }
            None => LlmConfig::default(),
        };

        config.fill_from(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Fill unset keys and overrides from a variable lookup.
    pub fn fill_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if self.openai_api_key.is_none() {
            self.openai_api_key = get("OPENAI_API_KEY");
        }
        if self.anthropic_api_key.is_none() {
            self.anthropic_api_key = get("ANTHROPIC_API_KEY");
        }
        if self.groq_api_key.is_none() {
            self.groq_api_key = get("GROQ_API_KEY");
        }
        if let Some(p) = get("ANCHORSMITH_LLM_PROVIDER") {
            self.preferred_provider = p.to_lowercase();
        }
        if let Some(url) = get("ANCHORSMITH_LLM_BASE_URL") {
            self.base_url = Some(url);
        }
    }

    /// Resolve which provider, model and key to use.
    pub fn resolve_provider(&self) -> Option<ProviderTarget> {
        let target = |provider: LLMProvider, model: &String, key: &String| ProviderTarget {
            provider,
            model: model.clone(),
            api_key: key.clone(),
            endpoint: self.base_url.clone(),
        };

        // Explicit preference
        if self.preferred_provider != "auto" {
            return match self.preferred_provider.as_str() {
                "openai" => self
                    .openai_api_key
                    .as_ref()
                    .map(|k| target(LLMProvider::OpenAI, &self.openai_model, k)),
                "anthropic" => self
                    .anthropic_api_key
                    .as_ref()
                    .map(|k| target(LLMProvider::Anthropic, &self.anthropic_model, k)),
                "groq" => self
                    .groq_api_key
                    .as_ref()
                    .map(|k| target(LLMProvider::Groq, &self.groq_model, k)),
                _ => None,
            };
        }

        // Auto mode: OpenAI > Anthropic > Groq
        if let Some(k) = &self.openai_api_key {
            return Some(target(LLMProvider::OpenAI, &self.openai_model, k));
        }
        if let Some(k) = &self.anthropic_api_key {
            return Some(target(LLMProvider::Anthropic, &self.anthropic_model, k));
        }
        if let Some(k) = &self.groq_api_key {
            return Some(target(LLMProvider::Groq, &self.groq_model, k));
        }

        None
    }

    /// Resolved provider, or a configuration error naming the missing key.
    pub fn require_provider(&self) -> Result<ProviderTarget> {
        self.resolve_provider().ok_or_else(|| {
            let wanted = match self.preferred_provider.as_str() {
                "anthropic" => "ANTHROPIC_API_KEY",
                "groq" => "GROQ_API_KEY",
                "openai" | "auto" => "OPENAI_API_KEY",
                other => {
                    return Error::Config(format!("unknown LLM provider: {}", other));
                }
            };
            Error::Config(format!("no LLM credential configured (set {})", wanted))
        })
    }

    /// Public config view (no API keys exposed).
    pub fn to_response(&self) -> LLMConfigResponse {
        let resolved = self.resolve_provider();
        LLMConfigResponse {
            preferred_provider: self.preferred_provider.clone(),
            openai_configured: self.openai_api_key.is_some(),
            anthropic_configured: self.anthropic_api_key.is_some(),
            groq_configured: self.groq_api_key.is_some(),
            openai_model: self.openai_model.clone(),
            anthropic_model: self.anthropic_model.clone(),
            groq_model: self.groq_model.clone(),
            active_provider: resolved.map(|t| t.provider.to_string()),
        }
    }

    /// Models offered by the active provider.
    pub fn available_models(&self) -> Vec<String> {
        let models = match self.resolve_provider().map(|t| t.provider) {
            Some(LLMProvider::OpenAI) => OPENAI_MODELS,
            Some(LLMProvider::Anthropic) => ANTHROPIC_MODELS,
            Some(LLMProvider::Groq) => GROQ_MODELS,
            None => &[],
        };
        models.iter().map(|s| s.to_string()).collect()
    }
}
