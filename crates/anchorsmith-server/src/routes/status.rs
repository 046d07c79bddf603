//! Service status.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/status", get(get_status))
}

/// GET /api/status: generation availability and active settings.
async fn get_status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let service_ready = state.service().is_ok();
    let llm = &state.llm_config;
    let resolved = llm.resolve_provider();
    let generation = &state.config.generation;

    Json(serde_json::json!({
        "service": "anchorsmith",
        "version": env!("CARGO_PKG_VERSION"),
        "llmAvailable": service_ready,
        "llmProvider": resolved.as_ref().map(|t| t.provider.to_string()),
        "defaultModel": generation
            .model
            .clone()
            .or_else(|| resolved.as_ref().map(|t| t.model.clone())),
        "availableModels": llm.available_models(),
        "llm": llm.to_response(),
        "matchMode": state.config.match_mode,
        "fallbackLanguage": state.config.fallback_language,
        "anchorCount": generation.target_count,
        "anchorWords": [generation.min_words, generation.max_words],
    }))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    #[tokio::test]
    async fn test_status_without_llm() {
        let request = Request::get("/api/status").body(Body::empty()).unwrap();
        let (status, body) = call(app_without_llm(), request).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["service"], "anchorsmith");
        assert_eq!(json["llmAvailable"], false);
        assert!(json["llmProvider"].is_null());
        assert_eq!(json["matchMode"], "language_aware");
        assert_eq!(json["anchorWords"], serde_json::json!([2, 4]));
        assert_eq!(json["llm"]["openaiConfigured"], false);
    }

    #[tokio::test]
    async fn test_status_with_configured_key() {
        use crate::routes::build_router;
        use crate::state::AppState;
        use anchorsmith_chat::LlmConfig;
        use anchorsmith_core::PipelineConfig;
        use std::sync::Arc;

        let llm = LlmConfig {
            groq_api_key: Some("gsk-test".into()),
            ..Default::default()
        };
        let state = AppState::new(PipelineConfig::default(), llm).unwrap();
        let request = Request::get("/api/status").body(Body::empty()).unwrap();
        let (_, body) = call(build_router(Arc::new(state)), request).await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["llmAvailable"], true);
        assert_eq!(json["llmProvider"], "groq");
        assert_eq!(json["defaultModel"], "llama-3.3-70b-versatile");
    }

    #[tokio::test]
    async fn test_status_with_fixed_service() {
        let request = Request::get("/api/status").body(Body::empty()).unwrap();
        let (_, body) = call(app_with("[]"), request).await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["llmAvailable"], true);
    }
}
