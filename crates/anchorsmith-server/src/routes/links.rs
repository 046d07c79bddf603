//! Topic search over an existing live-link table.

use std::sync::Arc;

use anchorsmith_core::{LinkColumns, LinkHit, LinkRow};
use anchorsmith_ingest::table::read_link_rows;
use anchorsmith_resolve::search_links;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/links/search", post(search))
}

#[derive(Debug, Deserialize)]
pub struct LinkSearchRequest {
    pub topic: String,
    /// Table rows as JSON.
    #[serde(default)]
    pub rows: Option<Vec<LinkRow>>,
    /// Table as CSV text, read through `columns`.
    #[serde(default)]
    pub csv: Option<String>,
    #[serde(default)]
    pub columns: LinkColumns,
}

#[derive(Debug, Serialize)]
pub struct LinkSearchResponse {
    pub topic: String,
    pub results: Vec<LinkHit>,
    pub total: usize,
}

/// POST /api/links/search
async fn search(Json(req): Json<LinkSearchRequest>) -> ApiResult<Json<LinkSearchResponse>> {
    if req.topic.trim().is_empty() {
        return Err(ApiError::bad_request("topic is required"));
    }
    let rows = match (req.rows, req.csv) {
        (Some(rows), _) => rows,
        (None, Some(csv)) => read_link_rows(csv.as_bytes(), &req.columns)?,
        (None, None) => return Err(ApiError::bad_request("rows or csv is required")),
    };

    let results = search_links(&rows, &req.topic);
    Ok(Json(LinkSearchResponse {
        topic: req.topic,
        total: results.len(),
        results,
    }))
}
