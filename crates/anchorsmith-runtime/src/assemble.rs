//! Flatten row outcomes into export records.

use std::io::Write;

use anchorsmith_core::{Result, RowOutcome, RowStatus};
use anchorsmith_ingest::table::{records_to_csv, write_records};
use serde::{Deserialize, Serialize};

/// One exported suggestion. Column order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub opportunity_url: String,
    pub original_anchor: String,
    pub suggested_anchor: String,
    pub anchor_origin: String,
    pub matched_url: String,
    pub matched_topic: String,
    /// Blank for rows without matches.
    pub similarity: Option<f64>,
    pub language: String,
    pub status: RowStatus,
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Records for one row: one per match, or a single blank record for an
/// empty row.
pub fn assemble(outcome: &RowOutcome, round: bool) -> Vec<ResultRecord> {
    let opp = &outcome.opportunity;
    if outcome.matches.is_empty() {
        return vec![ResultRecord {
            opportunity_url: opp.source_url.clone(),
            original_anchor: opp.original_anchor.clone(),
            suggested_anchor: String::new(),
            anchor_origin: String::new(),
            matched_url: String::new(),
            matched_topic: String::new(),
            similarity: None,
            language: outcome.language.clone(),
            status: outcome.status,
        }];
    }

    outcome
        .matches
        .iter()
        .map(|m| ResultRecord {
            opportunity_url: opp.source_url.clone(),
            original_anchor: opp.original_anchor.clone(),
            suggested_anchor: m.anchor.phrase.clone(),
            anchor_origin: m.anchor.origin.to_string(),
            matched_url: m.matched_url.clone(),
            matched_topic: m.matched_topic.clone(),
            similarity: Some(if round {
                round3(m.similarity)
            } else {
                m.similarity
            }),
            language: m.language.clone(),
            status: outcome.status,
        })
        .collect()
}

pub fn assemble_all(outcomes: &[RowOutcome], round: bool) -> Vec<ResultRecord> {
    outcomes.iter().flat_map(|o| assemble(o, round)).collect()
}

pub fn write_results<W: Write>(output: W, records: &[ResultRecord]) -> Result<()> {
    write_records(output, records)
}

pub fn results_to_csv(records: &[ResultRecord]) -> Result<String> {
    records_to_csv(records)
}

/// Anchors grouped per opportunity, for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpportunitySuggestions {
    #[serde(rename = "sourceUrl")]
    pub source_url: String,
    #[serde(rename = "originalAnchor")]
    pub original_anchor: String,
    pub language: String,
    pub status: RowStatus,
    pub anchors: Vec<SuggestedLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestedLink {
    pub anchor: String,
    pub url: String,
    pub similarity: f64,
}

pub fn suggestions_by_opportunity(outcomes: &[RowOutcome]) -> Vec<OpportunitySuggestions> {
    outcomes
        .iter()
        .map(|o| OpportunitySuggestions {
            source_url: o.opportunity.source_url.clone(),
            original_anchor: o.opportunity.original_anchor.clone(),
            language: o.language.clone(),
            status: o.status,
            anchors: o
                .matches
                .iter()
                .map(|m| SuggestedLink {
                    anchor: m.anchor.phrase.clone(),
                    url: m.matched_url.clone(),
                    similarity: round3(m.similarity),
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchorsmith_core::{AnchorCandidate, MatchResult, Opportunity};

    fn outcome(matches: &[(&str, f64)]) -> RowOutcome {
        let opp = Opportunity::new("https://blog.example/a", "darts");
        let matches = matches
            .iter()
            .map(|(phrase, sim)| MatchResult {
                opportunity: opp.clone(),
                anchor: AnchorCandidate::generated(*phrase),
                matched_url: "/darts".into(),
                matched_topic: "online darts".into(),
                similarity: *sim,
                language: "en".into(),
            })
            .collect();
        RowOutcome::new(opp, "en".into(), matches)
    }

    #[test]
    fn test_assemble_rounds_similarity() {
        let records = assemble(&outcome(&[("bet on darts", 0.123456)]), true);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].similarity, Some(0.123));
        assert_eq!(records[0].anchor_origin, "generated");
        assert_eq!(records[0].status, RowStatus::Matched);

        let raw = assemble(&outcome(&[("bet on darts", 0.123456)]), false);
        assert_eq!(raw[0].similarity, Some(0.123456));
    }

    #[test]
    fn test_empty_row_has_blank_record() {
        let records = assemble(&outcome(&[]), true);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, RowStatus::Empty);
        assert!(records[0].suggested_anchor.is_empty());
        assert!(records[0].similarity.is_none());
    }

    #[test]
    fn test_csv_export() {
        let records = assemble_all(
            &[outcome(&[("bet on darts", 0.5)]), outcome(&[])],
            true,
        );
        let csv = results_to_csv(&records).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "opportunity_url,original_anchor,suggested_anchor,anchor_origin,matched_url,matched_topic,similarity,language,status"
        );
        assert_eq!(
            lines[1],
            "https://blog.example/a,darts,bet on darts,generated,/darts,online darts,0.5,en,matched"
        );
        assert_eq!(lines[2], "https://blog.example/a,darts,,,,,,en,empty");
    }

    #[test]
    fn test_write_results_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let records = assemble(&outcome(&[("bet on darts", 0.25)]), true);

        write_results(std::fs::File::create(&path).unwrap(), &records).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 2);
        assert!(written.contains("bet on darts,generated,/darts"));
    }

    #[test]
    fn test_suggestions_grouped() {
        let grouped = suggestions_by_opportunity(&[outcome(&[
            ("bet on darts", 0.81234),
            ("darts odds", 0.4),
        ])]);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].anchors.len(), 2);
        assert_eq!(grouped[0].anchors[0].similarity, 0.812);
    }
}
