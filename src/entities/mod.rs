//! Entity extraction from raw text.
//!
//! Two interchangeable strategies implement [`EntityExtractor`]:
//!
//! - [`HeuristicExtractor`]: regex scans for URLs, emails, and capitalized
//!   word runs (always available)
//! - `OnnxEntityExtractor`: a pretrained token-classification model run
//!   through ONNX Runtime (feature: `onnx`)
//!
//! The strategy is chosen once, when the service is constructed, via
//! [`build_extractor`].

pub mod heuristic;
#[cfg(feature = "onnx")]
pub mod onnx;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, ConfigError};

pub use heuristic::HeuristicExtractor;
#[cfg(feature = "onnx")]
pub use onnx::OnnxEntityExtractor;

/// Category attached to an extracted span.
///
/// The heuristic extractor only produces the three fixed labels; model
/// labels are open-ended and carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityLabel {
    Url,
    Email,
    ProperNoun,
    Model(String),
}

impl EntityLabel {
    pub fn as_str(&self) -> &str {
        match self {
            EntityLabel::Url => "URL",
            EntityLabel::Email => "EMAIL",
            EntityLabel::ProperNoun => "PROPER_NOUN",
            EntityLabel::Model(label) => label,
        }
    }
}

impl From<String> for EntityLabel {
    fn from(label: String) -> Self {
        match label.as_str() {
            "URL" => EntityLabel::Url,
            "EMAIL" => EntityLabel::Email,
            "PROPER_NOUN" => EntityLabel::ProperNoun,
            _ => EntityLabel::Model(label),
        }
    }
}

impl From<EntityLabel> for String {
    fn from(label: EntityLabel) -> Self {
        match label {
            EntityLabel::Model(label) => label,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labeled span of the input text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
}

impl Entity {
    pub fn new(text: impl Into<String>, label: EntityLabel) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

/// Trait for entity extraction strategies.
///
/// Implementations are constructed once and shared read-only across
/// requests, so they must be `Send + Sync`.
pub trait EntityExtractor: Send + Sync {
    /// Extract entities from a single text.
    ///
    /// # Returns
    /// * `Ok(entities)` - Entities in the strategy's emission order
    /// * `Err(AnalysisError)` - The underlying model failed
    fn extract(&self, text: &str) -> Result<Vec<Entity>, AnalysisError>;

    /// Short name reported by the readiness endpoint.
    fn name(&self) -> &str;

    /// Whether results produced alongside this extractor carry a token list.
    fn emits_tokens(&self) -> bool {
        true
    }
}

/// Which extraction strategy to wire into the service.
///
/// Config files, environment variables, and CLI flags all parse through
/// [`FromStr`], so they accept the same spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ExtractorKind {
    #[default]
    Heuristic,
    Onnx,
}

impl ExtractorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractorKind::Heuristic => "heuristic",
            ExtractorKind::Onnx => "onnx",
        }
    }
}

impl FromStr for ExtractorKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "heuristic" | "regex" => Ok(ExtractorKind::Heuristic),
            "onnx" | "model" => Ok(ExtractorKind::Onnx),
            other => Err(ConfigError::Invalid(format!(
                "Unsupported extractor: '{}'. Supported extractors: heuristic, onnx",
                other
            ))),
        }
    }
}

impl TryFrom<String> for ExtractorKind {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ExtractorKind> for String {
    fn from(kind: ExtractorKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Construct the configured extractor.
///
/// # Errors
/// Returns error if the ONNX strategy is requested without a model
/// directory, the model fails to load, or the crate was built without the
/// `onnx` feature.
pub fn build_extractor(
    kind: ExtractorKind,
    model_dir: Option<&Path>,
) -> Result<Arc<dyn EntityExtractor>, ConfigError> {
    match kind {
        ExtractorKind::Heuristic => {
            let extractor = HeuristicExtractor::new()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
            Ok(Arc::new(extractor))
        }
        ExtractorKind::Onnx => build_onnx_extractor(model_dir),
    }
}

#[cfg(feature = "onnx")]
fn build_onnx_extractor(model_dir: Option<&Path>) -> Result<Arc<dyn EntityExtractor>, ConfigError> {
    let dir = model_dir.ok_or_else(|| {
        ConfigError::Invalid("The onnx extractor requires a model directory".to_string())
    })?;
    let extractor =
        OnnxEntityExtractor::load(dir).map_err(|e| ConfigError::Invalid(e.to_string()))?;
    Ok(Arc::new(extractor))
}

#[cfg(not(feature = "onnx"))]
fn build_onnx_extractor(_model_dir: Option<&Path>) -> Result<Arc<dyn EntityExtractor>, ConfigError> {
    Err(ConfigError::Invalid(
        "The onnx extractor is not available: rebuild with `--features onnx`".to_string(),
    ))
}
