//! Anchor suggestions for a topic or a piece of text.

use std::sync::Arc;

use anchorsmith_core::{AnchorCandidate, CandidateOrigin};
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/anchors", post(suggest_anchors))
}

#[derive(Debug, Deserialize)]
pub struct AnchorsRequest {
    /// Seed keyword.
    #[serde(default)]
    pub topic: Option<String>,
    /// Source text (HTML allowed).
    #[serde(default)]
    pub text: Option<String>,
    /// Fetch this page and use its text.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnchorsResponse {
    pub anchors: Vec<AnchorCandidate>,
    pub language: String,
    pub fallback: bool,
    /// Non-fatal problems, such as a page that could not be fetched.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// POST /api/anchors
async fn suggest_anchors(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnchorsRequest>,
) -> ApiResult<Json<AnchorsResponse>> {
    let topic = req.topic.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let mut text = req.text.unwrap_or_default();
    let mut warnings = Vec::new();
    if text.trim().is_empty() {
        if let Some(url) = req.url.as_deref().filter(|u| !u.trim().is_empty()) {
            match state.fetcher.fetch(url).await {
                Ok(page) => text = page.text,
                Err(e) => {
                    warn!("Content fetch failed, continuing with empty text: {}", e);
                    warnings.push(e.to_string());
                }
            }
        }
    }
    if topic.is_none() && text.trim().is_empty() {
        return Err(match warnings.first() {
            Some(reason) => ApiError::bad_request(format!("no text to work from: {}", reason)),
            None => ApiError::bad_request("topic, text or url is required"),
        });
    }

    let pipeline = state.pipeline().map_err(ApiError::unavailable)?;
    let cleaned = pipeline.clean(&text);
    let language = pipeline
        .detector()
        .detect(if cleaned.is_empty() { topic.unwrap_or("") } else { &cleaned });
    let anchors = pipeline.suggest(&text, topic).await;
    let fallback = !anchors.is_empty()
        && anchors
            .iter()
            .all(|a| a.origin == CandidateOrigin::Fallback);

    Ok(Json(AnchorsResponse {
        anchors,
        language,
        fallback,
        warnings,
    }))
}
