use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{error::AppResult, middleware::RequestId, models::CallerIdentity};

use super::AppState;

#[derive(Debug, Serialize)]
pub struct GenerateMatchesResponse {
    pub success: bool,
    #[serde(rename = "matchesFound")]
    pub matches_found: usize,
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Regenerates the caller's match set
pub async fn generate_matches(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    caller: CallerIdentity,
) -> AppResult<Json<GenerateMatchesResponse>> {
    tracing::info!(
        request_id = %request_id,
        requester = %caller.id,
        policy = %state.pipeline.policy(),
        "Processing match generation request"
    );

    let outcome = state.pipeline.run(&caller).await?;

    tracing::info!(
        request_id = %request_id,
        requester = %caller.id,
        matches_found = outcome.matches_found,
        "Match generation completed"
    );

    Ok(Json(GenerateMatchesResponse {
        success: true,
        matches_found: outcome.matches_found,
    }))
}
