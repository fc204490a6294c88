use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use penwise_assistant::AnalysisResult;
use serde::Deserialize;
use std::sync::Arc;

/// Body of `POST /analyze`.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub message: Option<String>,
}

/// Analyzes one message.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        ApiError::new(StatusCode::BAD_REQUEST, "Invalid request").with_details(rejection.body_text())
    })?;

    let analysis = state.analyzer.analyze(request.message.as_deref()).await?;
    Ok(Json(analysis))
}
