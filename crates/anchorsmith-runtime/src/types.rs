//! Runtime types.

use anchorsmith_core::{RowOutcome, RowStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Summary of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    #[serde(rename = "runId")]
    pub run_id: Uuid,
    #[serde(rename = "startedAt")]
    pub started_at: DateTime<Utc>,
    pub rows: usize,
    pub matched: usize,
    pub fallback: usize,
    pub empty: usize,
    /// Match results across all rows.
    pub suggestions: usize,
    #[serde(rename = "referenceLinks")]
    pub reference_links: usize,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
}

impl RunReport {
    pub fn start(reference_links: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            rows: 0,
            matched: 0,
            fallback: 0,
            empty: 0,
            suggestions: 0,
            reference_links,
            duration_ms: 0,
        }
    }

    pub fn record(&mut self, outcome: &RowOutcome) {
        self.rows += 1;
        self.suggestions += outcome.matches.len();
        match outcome.status {
            RowStatus::Matched => self.matched += 1,
            RowStatus::Fallback => self.fallback += 1,
            RowStatus::Empty => self.empty += 1,
        }
    }
}

/// Row outcomes in input order, plus the run summary.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub report: RunReport,
    pub outcomes: Vec<RowOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchorsmith_core::{AnchorCandidate, MatchResult, Opportunity};

    #[test]
    fn test_report_counts_statuses() {
        let opp = Opportunity::new("/a", "darts");
        let hit = MatchResult {
            opportunity: opp.clone(),
            anchor: AnchorCandidate::generated("bet on darts"),
            matched_url: "/darts".into(),
            matched_topic: "online darts".into(),
            similarity: 0.7,
            language: "en".into(),
        };

        let mut report = RunReport::start(4);
        report.record(&RowOutcome::new(opp.clone(), "en".into(), vec![hit.clone(), hit]));
        report.record(&RowOutcome::new(opp, "en".into(), Vec::new()));

        assert_eq!(report.rows, 2);
        assert_eq!(report.matched, 1);
        assert_eq!(report.empty, 1);
        assert_eq!(report.suggestions, 2);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["referenceLinks"], 4);
        assert!(json["runId"].is_string());
        assert!(json.get("durationMs").is_some());
    }
}
