//! HTTP surface of the sidecar.
//!
//! - `POST /analyze_batch` - annotate a list of texts
//! - `GET /health` - liveness, always `{"status": "ok"}`
//! - `GET /ready` - readiness, names the configured extractor

pub mod error;
pub mod handlers;
pub mod models;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::pipeline::Analyzer;

pub use error::AppError;
pub use models::{AnalysisRequest, AnalysisResponse, HealthResponse, ReadyResponse};

/// Shared, read-only request state.
pub struct AppState {
    pub analyzer: Analyzer,
}

/// Build the router with the default 2 MiB body limit.
pub fn router(analyzer: Analyzer) -> Router {
    router_with_limit(analyzer, crate::config::DEFAULT_MAX_BODY_BYTES)
}

/// Build the router around an analyzer.
pub fn router_with_limit(analyzer: Analyzer, max_body_bytes: usize) -> Router {
    let state = Arc::new(AppState { analyzer });

    Router::new()
        .route("/analyze_batch", post(handlers::analyze_batch))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, app: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("NLP sidecar listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await
}
