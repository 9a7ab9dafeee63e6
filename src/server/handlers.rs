//! Request handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::{body::Bytes, extract::State, Json};

use super::error::AppError;
use super::models::{AnalysisRequest, AnalysisResponse, HealthResponse, ReadyResponse};
use super::AppState;
use crate::error::AnalysisError;

/// Analyze a batch of texts.
///
/// The body is validated against [`AnalysisRequest`] before any analysis
/// runs. Analysis happens on the blocking pool so a slow model never stalls
/// the listener; a panic there surfaces as a 500 for this request only.
pub async fn analyze_batch(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<AnalysisResponse>, AppError> {
    let request: AnalysisRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::ValidationError(format!("Invalid request body: {}", e)))?;

    let start = Instant::now();
    let count = request.texts.len();
    let analyzer = state.analyzer.clone();

    let results = tokio::task::spawn_blocking(move || analyzer.analyze_batch(&request.texts))
        .await
        .map_err(|e| AnalysisError::Worker(e.to_string()))
        .and_then(|r| r)
        .map_err(|e| {
            tracing::error!("Batch of {} texts failed: {}", count, e);
            AppError::from(e)
        })?;

    tracing::debug!(
        texts = count,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "analyzed batch"
    );

    Ok(Json(AnalysisResponse { results }))
}

/// Health check endpoint (liveness)
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Readiness check endpoint, reporting the wired-in extractor
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> Json<ReadyResponse> {
    Json(ReadyResponse {
        status: "ready".to_string(),
        extractor: state.analyzer.extractor_name().to_string(),
    })
}
