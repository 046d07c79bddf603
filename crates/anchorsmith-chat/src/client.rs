//! Text-generation service seam.

use std::time::Duration;

use anchorsmith_core::{Error, Result};
use futures::future::BoxFuture;
use reqwest::Client;

use crate::config::LlmConfig;
use crate::providers::collect_completion;
use crate::types::{CompletionRequest, ProviderTarget};

/// Anything that turns a prompt into a single completion.
///
/// Implementations must be shareable across concurrently processed rows.
pub trait TextGenerator: Send + Sync {
    fn complete<'a>(&'a self, request: &'a CompletionRequest) -> BoxFuture<'a, Result<String>>;

    /// Short label for logs ("openai/gpt-4o-mini").
    fn describe(&self) -> String {
        "custom".into()
    }
}

/// `TextGenerator` backed by a configured provider.
#[derive(Debug, Clone)]
pub struct LlmClient {
    client: Client,
    target: ProviderTarget,
}

impl LlmClient {
    pub fn new(target: ProviderTarget) -> Self {
        Self::with_timeout(target, Duration::from_secs(60))
    }

    pub fn with_timeout(target: ProviderTarget, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, target }
    }

    /// Build a client from config, failing when no credential is available.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Ok(Self::new(config.require_provider()?))
    }

    pub fn target(&self) -> &ProviderTarget {
        &self.target
    }
}

impl TextGenerator for LlmClient {
    fn complete<'a>(&'a self, request: &'a CompletionRequest) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let text = collect_completion(&self.client, &self.target, request).await?;
            if text.trim().is_empty() {
                return Err(Error::Generation("empty completion".into()));
            }
            Ok(text)
        })
    }

    fn describe(&self) -> String {
        format!("{}/{}", self.target.provider, self.target.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LLMProvider;

    #[test]
    fn test_from_config_requires_key() {
        let err = LlmClient::from_config(&LlmConfig::default()).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_describe() {
        let mut config = LlmConfig::default();
        config.groq_api_key = Some("k".into());
        let client = LlmClient::from_config(&config).unwrap();
        assert_eq!(client.target().provider, LLMProvider::Groq);
        assert_eq!(client.describe(), "groq/llama-3.3-70b-versatile");
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_error() {
        let target = ProviderTarget {
            provider: LLMProvider::OpenAI,
            model: "m".into(),
            api_key: "k".into(),
            // Port 9 (discard) is not listening in test environments
            endpoint: Some("http://127.0.0.1:9/v1/chat/completions".into()),
        };
        let client = LlmClient::with_timeout(target, Duration::from_secs(2));
        let request = CompletionRequest {
            prompt: "p".into(),
            model: None,
            temperature: 0.7,
            max_tokens: 10,
        };
        assert!(client.complete(&request).await.is_err());
    }
}
