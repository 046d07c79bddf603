//! Suggestion pipeline.
//!
//! Per opportunity row: pick source text (row text, or the fetched page when
//! enabled), normalize, detect language, generate anchor candidates and match
//! each against the reference table. A row is either fully processed into a
//! `RowOutcome` or not emitted at all.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anchorsmith_chat::{AnchorGenerator, AnchorRequest, TextGenerator};
use anchorsmith_core::{
    AnchorCandidate, Error, MatchMode, MatchResult, Opportunity, PipelineConfig, ReferenceLink,
    Result, RowOutcome,
};
use anchorsmith_ingest::{normalize, ContentFetcher, LanguageDetector, NormalizeOptions};
use anchorsmith_resolve::{match_joint, LinkMatch, ReferenceIndex};
use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use crate::types::{RunOutput, RunReport};

/// Reference table prepared for one run.
enum Matcher<'a> {
    Joint(&'a [ReferenceLink]),
    Indexed(ReferenceIndex),
}

impl Matcher<'_> {
    fn match_candidates(&self, candidates: &[AnchorCandidate], language: &str) -> Vec<LinkMatch> {
        match self {
            Matcher::Joint(references) => match_joint(candidates, references),
            Matcher::Indexed(index) => index.match_all(candidates, language),
        }
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    generator: AnchorGenerator,
    detector: LanguageDetector,
    normalize: NormalizeOptions,
    fetcher: Option<ContentFetcher>,
}

impl Pipeline {
    /// Build a pipeline around a text-generation service. A page fetcher is
    /// created when `fetch_missing_content` is enabled.
    pub fn new(config: PipelineConfig, service: Arc<dyn TextGenerator>) -> Result<Self> {
        config.validate()?;
        let fetcher = if config.fetch_missing_content {
            Some(ContentFetcher::new(Duration::from_secs(
                config.fetch_timeout_secs,
            ))?)
        } else {
            None
        };

        Ok(Self {
            generator: AnchorGenerator::new(service, config.generation.clone()),
            detector: LanguageDetector::new(
                config.fallback_language.clone(),
                config.min_language_chars,
            ),
            normalize: NormalizeOptions::new(config.punctuation),
            fetcher,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn generator(&self) -> &AnchorGenerator {
        &self.generator
    }

    pub fn detector(&self) -> &LanguageDetector {
        &self.detector
    }

    /// Normalize text with the configured punctuation policy.
    pub fn clean(&self, raw: &str) -> String {
        normalize(raw, &self.normalize)
    }

    /// Raw text the row's anchors are generated from.
    async fn source_text(&self, opportunity: &Opportunity) -> String {
        if !opportunity.raw_text.trim().is_empty() {
            return opportunity.raw_text.clone();
        }
        match &self.fetcher {
            Some(fetcher) if !opportunity.source_url.is_empty() => {
                fetcher.fetch_text_or_empty(&opportunity.source_url).await
            }
            _ => String::new(),
        }
    }

    /// Generate candidates for free text, without matching.
    pub async fn suggest(&self, text: &str, seed: Option<&str>) -> Vec<AnchorCandidate> {
        let cleaned = self.clean(text);
        self.generator
            .generate(&AnchorRequest::new(cleaned, seed))
            .await
    }

    async fn process_row(&self, opportunity: &Opportunity, matcher: &Matcher<'_>) -> RowOutcome {
        let text = self.clean(&self.source_text(opportunity).await);
        let language = if text.is_empty() {
            self.detector.detect(&self.clean(&opportunity.original_anchor))
        } else {
            self.detector.detect(&text)
        };

        let candidates = self
            .generator
            .generate(&AnchorRequest::new(text, opportunity.seed()))
            .await;

        let matches: Vec<MatchResult> = matcher
            .match_candidates(&candidates, &language)
            .into_iter()
            .map(|m| MatchResult {
                opportunity: opportunity.clone(),
                anchor: m.anchor,
                matched_url: m.url,
                matched_topic: m.topic,
                similarity: m.similarity,
                language: language.clone(),
            })
            .collect();

        debug!(
            "Row {}: language={}, candidates={}, matches={}",
            opportunity.source_url,
            language,
            candidates.len(),
            matches.len()
        );
        RowOutcome::new(opportunity.clone(), language, matches)
    }

    /// Process every opportunity against the reference table, preserving
    /// input order.
    pub async fn run(
        &self,
        opportunities: &[Opportunity],
        references: &[ReferenceLink],
    ) -> Result<RunOutput> {
        let valid = references.iter().filter(|r| r.is_valid()).count();
        if valid == 0 {
            return Err(Error::Input(
                "reference table has no rows with both topic and URL".into(),
            ));
        }

        let start = Instant::now();
        let mut report = RunReport::start(valid);
        info!(
            "Starting run {}: {} rows, {} reference links, mode {:?}",
            report.run_id,
            opportunities.len(),
            valid,
            self.config.match_mode
        );

        let matcher = match self.config.match_mode {
            MatchMode::Joint => Matcher::Joint(references),
            MatchMode::LanguageAware => Matcher::Indexed(ReferenceIndex::build(references)),
        };

        // Row futures are built up front so no closure type is held across
        // the await; axum handlers need the run future to be Send.
        let rows: Vec<_> = opportunities
            .iter()
            .map(|opportunity| self.process_row(opportunity, &matcher))
            .collect();
        let outcomes: Vec<RowOutcome> = stream::iter(rows)
            .buffered(self.config.effective_concurrency())
            .collect()
            .await;

        for outcome in &outcomes {
            report.record(outcome);
        }
        report.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Run {} complete: matched={}, fallback={}, empty={}, suggestions={}, duration={}ms",
            report.run_id,
            report.matched,
            report.fallback,
            report.empty,
            report.suggestions,
            report.duration_ms
        );

        Ok(RunOutput { report, outcomes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchorsmith_chat::types::CompletionRequest;
    use anchorsmith_core::{CandidateOrigin, RowStatus};
    use axum::response::Html;
    use axum::routing::get;
    use axum::Router;
    use futures::future::BoxFuture;
    use parking_lot::Mutex;

    /// Replies keyed on the seed keyword found in the prompt.
    struct FakeModel {
        replies: Vec<(&'static str, &'static str)>,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeModel {
        fn new(replies: Vec<(&'static str, &'static str)>) -> Arc<Self> {
            Arc::new(Self {
                replies,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    impl TextGenerator for FakeModel {
        fn complete<'a>(
            &'a self,
            request: &'a CompletionRequest,
        ) -> BoxFuture<'a, Result<String>> {
            self.prompts.lock().push(request.prompt.clone());
            let reply = self
                .replies
                .iter()
                .find(|(seed, _)| {
                    request
                        .prompt
                        .contains(&format!("Main keyword/topic: \"{}\"", seed))
                })
                .map(|(_, reply)| reply.to_string())
                .ok_or_else(|| Error::Generation("rate limited".into()));
            Box::pin(async move { reply })
        }
    }

    fn references() -> Vec<ReferenceLink> {
        vec![
            ReferenceLink::new("online darts", "/darts"),
            ReferenceLink::new("live casino", "/casino"),
            ReferenceLink::new("apuestas de dardos", "/es/dardos").with_language("es"),
        ]
    }

    fn model() -> Arc<FakeModel> {
        FakeModel::new(vec![
            ("darts", r#"["bet on darts", "darts betting odds", "click here"]"#),
            ("casino", r#"["live casino games"]"#),
        ])
    }

    #[tokio::test]
    async fn test_run_preserves_order_and_statuses() {
        let service = model();
        let pipeline = Pipeline::new(PipelineConfig::default(), service.clone()).unwrap();
        let opportunities = vec![
            Opportunity::new("https://blog.example/a", "darts")
                .with_text("<p>The darts <b>world championship</b> starts tonight.</p>"),
            Opportunity::new("https://blog.example/b", "poker"),
            Opportunity::new("https://blog.example/c", "casino")
                .with_text("Our favourite live casino tables this week."),
            Opportunity::new("https://blog.example/d", ""),
        ];

        let output = pipeline.run(&opportunities, &references()).await.unwrap();
        let outcomes = &output.outcomes;
        assert_eq!(outcomes.len(), 4);
        let urls: Vec<&str> = outcomes
            .iter()
            .map(|o| o.opportunity.source_url.as_str())
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://blog.example/a",
                "https://blog.example/b",
                "https://blog.example/c",
                "https://blog.example/d"
            ]
        );

        // Generated candidates, blocklisted phrase dropped
        assert_eq!(outcomes[0].status, RowStatus::Matched);
        assert_eq!(outcomes[0].language, "en");
        assert_eq!(outcomes[0].matches.len(), 2);
        assert!(outcomes[0].matches.iter().all(|m| m.matched_url == "/darts"));

        // Service error with a seed: the seed is matched as a fallback
        assert_eq!(outcomes[1].status, RowStatus::Fallback);
        assert_eq!(outcomes[1].matches.len(), 1);
        assert_eq!(outcomes[1].matches[0].anchor.origin, CandidateOrigin::Fallback);

        assert_eq!(outcomes[2].matches[0].matched_url, "/casino");

        // No seed and no text: nothing to suggest, and the model is not asked
        assert_eq!(outcomes[3].status, RowStatus::Empty);
        assert_eq!(service.prompts.lock().len(), 3);

        let report = &output.report;
        assert_eq!(report.rows, 4);
        assert_eq!(report.matched, 2);
        assert_eq!(report.fallback, 1);
        assert_eq!(report.empty, 1);
        assert_eq!(report.suggestions, 4);
        assert_eq!(report.reference_links, 3);
    }

    #[tokio::test]
    async fn test_concurrent_run_keeps_input_order() {
        let config = PipelineConfig {
            concurrency: 4,
            ..Default::default()
        };
        let pipeline = Pipeline::new(config, model()).unwrap();
        let opportunities: Vec<Opportunity> = (0..12)
            .map(|i| {
                let seed = if i % 2 == 0 { "darts" } else { "casino" };
                Opportunity::new(format!("https://blog.example/{}", i), seed)
            })
            .collect();

        let output = pipeline.run(&opportunities, &references()).await.unwrap();
        for (i, outcome) in output.outcomes.iter().enumerate() {
            assert_eq!(outcome.opportunity.source_url, format!("https://blog.example/{}", i));
        }
    }

    #[tokio::test]
    async fn test_joint_mode_matches() {
        let config = PipelineConfig {
            match_mode: MatchMode::Joint,
            ..Default::default()
        };
        let pipeline = Pipeline::new(config, model()).unwrap();
        let output = pipeline
            .run(
                &[Opportunity::new("https://blog.example/a", "darts")],
                &references(),
            )
            .await
            .unwrap();
        assert_eq!(output.outcomes[0].matches[0].matched_url, "/darts");
    }

    #[tokio::test]
    async fn test_spanish_row_uses_spanish_references() {
        let model = FakeModel::new(vec![("dardos", r#"["apuestas de dardos online"]"#)]);
        let pipeline = Pipeline::new(PipelineConfig::default(), model).unwrap();
        let opp = Opportunity::new("https://blog.example/es", "dardos")
            .with_text("Las mejores apuestas de dardos para el campeonato de este año");
        let output = pipeline.run(&[opp], &references()).await.unwrap();
        let outcome = &output.outcomes[0];
        assert_eq!(outcome.language, "es");
        assert_eq!(outcome.matches[0].matched_url, "/es/dardos");
    }

    #[tokio::test]
    async fn test_no_valid_references_is_error() {
        let pipeline = Pipeline::new(PipelineConfig::default(), model()).unwrap();
        let err = pipeline
            .run(
                &[Opportunity::new("https://blog.example/a", "darts")],
                &[ReferenceLink::new("", "/x")],
            )
            .await
            .unwrap_err();
        assert!(err.is_config());
    }

    #[tokio::test]
    async fn test_fetches_missing_content() {
        let app = Router::new().route(
            "/post",
            get(|| async { Html("<html><body><p>Tonight we bet on darts.</p></body></html>") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let model = model();
        let config = PipelineConfig {
            fetch_missing_content: true,
            fetch_timeout_secs: 2,
            ..Default::default()
        };
        let pipeline = Pipeline::new(config, model.clone()).unwrap();
        let opp = Opportunity::new(format!("http://{}/post", addr), "darts");
        pipeline.run(&[opp], &references()).await.unwrap();

        let prompts = model.prompts.lock();
        assert!(prompts[0].contains("tonight we bet on darts"));
    }

    #[tokio::test]
    async fn test_suggest() {
        let pipeline = Pipeline::new(PipelineConfig::default(), model()).unwrap();
        let anchors = pipeline.suggest("Some darts text", Some("darts")).await;
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[0].phrase, "bet on darts");
    }
}
