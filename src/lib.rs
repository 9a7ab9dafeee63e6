//! # nlp-sidecar: local text annotation service
//!
//! Accepts batches of raw text over HTTP and returns, per text, a sentiment
//! score, a token list, and heuristically (or model-) detected entities. It
//! is meant to run as a loopback sidecar next to a desktop application.
//!
//! ## Pipeline
//!
//! ```text
//! text → Tokenizer → SentimentScorer → EntityExtractor → AnalysisResult
//! ```
//!
//! The sentiment scorer and entity extractor are injected into an
//! [`Analyzer`] when the service is constructed; nothing is global.
//!
//! ## Example
//!
//! ```
//! use nlp_sidecar::{Analyzer, build_extractor, ExtractorKind};
//!
//! let extractor = build_extractor(ExtractorKind::Heuristic, None).unwrap();
//! let analyzer = Analyzer::with_extractor(extractor).unwrap();
//!
//! let results = analyzer
//!     .analyze_batch(&["Contact me at jane@example.com, John Smith!"])
//!     .unwrap();
//! assert_eq!(results.len(), 1);
//! assert_eq!(results[0].entities.len(), 2);
//! ```

// Core annotation modules
pub mod tokenizer;
pub mod sentiment;
pub mod entities;
pub mod pipeline;
pub mod error;

// Service plumbing
pub mod commands;
pub mod config;
pub mod server;

// Re-export key types
pub use tokenizer::Tokenizer;
pub use sentiment::{SentimentScore, SentimentScorer, VaderScorer};
pub use entities::{
    build_extractor, Entity, EntityExtractor, EntityLabel, ExtractorKind, HeuristicExtractor,
};
pub use pipeline::{AnalysisResult, Analyzer};
pub use error::{AnalysisError, ConfigError};
pub use config::{ConfigLayer, ServiceConfig};
pub use server::{router, AnalysisRequest, AnalysisResponse};

#[cfg(feature = "onnx")]
pub use entities::OnnxEntityExtractor;
