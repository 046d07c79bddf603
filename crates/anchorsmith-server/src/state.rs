//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use anchorsmith_chat::{LlmClient, LlmConfig, TextGenerator};
use anchorsmith_core::{PipelineConfig, Result};
use anchorsmith_ingest::ContentFetcher;
use anchorsmith_runtime::Pipeline;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: PipelineConfig,
    pub llm_config: LlmConfig,
    pub fetcher: ContentFetcher,
    /// Fixed generation service; when unset one is built from `llm_config`.
    generator: Option<Arc<dyn TextGenerator>>,
}

impl AppState {
    pub fn new(config: PipelineConfig, llm_config: LlmConfig) -> Result<Self> {
        let fetcher = ContentFetcher::new(Duration::from_secs(config.fetch_timeout_secs))?;
        Ok(Self {
            config,
            llm_config,
            fetcher,
            generator: None,
        })
    }

    /// Use a fixed generation service instead of the configured provider.
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Generation service for one request. Fails when no credential is set.
    pub fn service(&self) -> Result<Arc<dyn TextGenerator>> {
        if let Some(generator) = &self.generator {
            return Ok(generator.clone());
        }
        let client = LlmClient::from_config(&self.llm_config)?;
        Ok(Arc::new(client))
    }

    pub fn pipeline(&self) -> Result<Pipeline> {
        Pipeline::new(self.config.clone(), self.service()?)
    }

    /// Pipeline with per-request config changes applied.
    pub fn pipeline_with(&self, adjust: impl FnOnce(&mut PipelineConfig)) -> Result<Pipeline> {
        let mut config = self.config.clone();
        adjust(&mut config);
        Pipeline::new(config, self.service()?)
    }
}
