//! Wire types for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::pipeline::AnalysisResult;

/// Body of `POST /analyze_batch`.
///
/// `texts` is required and must be a list of strings; other top-level fields
/// are ignored.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisRequest {
    pub texts: Vec<String>,
}

/// Response of `POST /analyze_batch`: one result per input text, same order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub results: Vec<AnalysisResult>,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Response of `GET /ready`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub status: String,
    pub extractor: String,
}
