//! Content extraction from a URL or uploaded file content.

use std::sync::Arc;

use anchorsmith_ingest::file::{extract_bytes, FileType};
use anchorsmith_ingest::{normalize, LanguageDetector, NormalizeOptions};
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/extract", post(extract))
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    #[serde(default)]
    pub url: Option<String>,
    /// Raw file content (text, markdown, HTML or JSON).
    #[serde(default)]
    pub content: Option<String>,
    /// File name, used to pick the content type.
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub title: Option<String>,
    pub text: String,
    pub normalized: String,
    pub language: String,
}

/// POST /api/extract
async fn extract(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExtractRequest>,
) -> ApiResult<Json<ExtractResponse>> {
    let (title, text) = match (req.url.as_deref(), req.content) {
        (Some(url), _) if !url.trim().is_empty() => {
            let page = state.fetcher.fetch(url).await?;
            (page.title, page.text)
        }
        (_, Some(content)) => {
            let file_type = req
                .filename
                .as_deref()
                .map(|f| FileType::from_path(std::path::Path::new(f)))
                .unwrap_or(FileType::Unknown);
            let text = extract_bytes(file_type, content.as_bytes())?
                .ok_or_else(|| ApiError::bad_request("content looks binary"))?;
            (None, text)
        }
        _ => return Err(ApiError::bad_request("url or content is required")),
    };

    let config = &state.config;
    let normalized = normalize(&text, &NormalizeOptions::new(config.punctuation));
    let language = LanguageDetector::new(config.fallback_language.clone(), config.min_language_chars)
        .detect(&normalized);

    Ok(Json(ExtractResponse {
        title,
        text,
        normalized,
        language,
    }))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_extract_html_content() {
        let (status, body) = post_json(
            app_with("[]"),
            "/api/extract",
            json!({
                "filename": "post.html",
                "content": "<html><body><p>Hello <b>world</b>, this is the darts page.</p></body></html>",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "Hello world, this is the darts page.");
        assert_eq!(body["normalized"], "hello world this is the darts page");
        assert_eq!(body["language"], "en");
    }

    #[tokio::test]
    async fn test_extract_requires_input() {
        let (status, _) = post_json(app_with("[]"), "/api/extract", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_extract_bad_url_is_gateway_error() {
        let (status, body) =
            post_json(app_with("[]"), "/api/extract", json!({"url": "ftp://example.com"})).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("scheme"));
    }
}
