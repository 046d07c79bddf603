//! Full pipeline run: opportunities × reference links → suggestions.

use std::sync::Arc;

use anchorsmith_core::{
    MatchMode, Opportunity, OpportunityColumns, ReferenceColumns, ReferenceLink,
};
use anchorsmith_ingest::table::{read_opportunities, read_references};
use anchorsmith_runtime::{
    assemble_all, results_to_csv, suggestions_by_opportunity, OpportunitySuggestions,
    ResultRecord, RunReport,
};
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/match", post(run_match))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    #[serde(default)]
    pub opportunities: Option<Vec<Opportunity>>,
    #[serde(default)]
    pub opportunities_csv: Option<String>,
    #[serde(default)]
    pub opportunity_columns: OpportunityColumns,
    #[serde(default)]
    pub references: Option<Vec<ReferenceLink>>,
    #[serde(default)]
    pub references_csv: Option<String>,
    #[serde(default)]
    pub reference_columns: ReferenceColumns,
    #[serde(default)]
    pub match_mode: Option<MatchMode>,
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub report: RunReport,
    pub results: Vec<ResultRecord>,
    pub suggestions: Vec<OpportunitySuggestions>,
}

/// POST /api/match: JSON body in, JSON or CSV out.
async fn run_match(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MatchRequest>,
) -> ApiResult<Response> {
    let opportunities = match (req.opportunities, req.opportunities_csv) {
        (Some(rows), _) => rows,
        (None, Some(csv)) => read_opportunities(csv.as_bytes(), &req.opportunity_columns)?,
        (None, None) => {
            return Err(ApiError::bad_request(
                "opportunities or opportunitiesCsv is required",
            ))
        }
    };
    let references = match (req.references, req.references_csv) {
        (Some(rows), _) => rows,
        (None, Some(csv)) => read_references(csv.as_bytes(), &req.reference_columns)?,
        (None, None) => {
            return Err(ApiError::bad_request(
                "references or referencesCsv is required",
            ))
        }
    };

    let mode = req.match_mode;
    let pipeline = state
        .pipeline_with(|config| {
            if let Some(mode) = mode {
                config.match_mode = mode;
            }
        })
        .map_err(ApiError::unavailable)?;

    let output = pipeline.run(&opportunities, &references).await?;
    let round = pipeline.config().round_similarity;
    let results = assemble_all(&output.outcomes, round);

    match req.format {
        OutputFormat::Csv => {
            let csv = results_to_csv(&results)?;
            Ok((
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                    (
                        header::CONTENT_DISPOSITION,
                        "attachment; filename=\"anchor-suggestions.csv\"",
                    ),
                ],
                csv,
            )
                .into_response())
        }
        OutputFormat::Json => Ok(Json(MatchResponse {
            suggestions: suggestions_by_opportunity(&output.outcomes),
            report: output.report,
            results,
        })
        .into_response()),
    }
}
