//! Liveness endpoints.

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};

use super::super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub llm_api_status: String,
    pub llm_api_url: String,
    pub llm_model: String,
}

/// API is up; touches nothing else.
pub async fn hello() -> Json<Value> {
    Json(json!({ "message": "Legal Document Analyzer API is running!" }))
}

/// Probe the LLM endpoint. The server itself always reports healthy.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let probe = state.transport().probe().await;
    tracing::debug!(status = %probe, "LLM probe finished");

    Json(HealthResponse {
        status: "healthy",
        llm_api_status: probe.to_string(),
        llm_api_url: state.settings.llm.endpoint.clone(),
        llm_model: state.settings.llm.model.clone(),
    })
}
