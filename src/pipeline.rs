//! Text annotation pipeline.
//!
//! For each text: tokenize → score sentiment → extract entities → assemble
//! an [`AnalysisResult`]. Texts are independent; nothing is carried from one
//! text to the next, so analyzing the same batch twice yields the same
//! results.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::entities::{Entity, EntityExtractor};
use crate::error::AnalysisError;
use crate::sentiment::{SentimentScore, SentimentScorer, VaderScorer};
use crate::tokenizer::Tokenizer;

/// Annotations for a single input text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub sentiment: SentimentScore,

    /// Present only when the configured extractor emits tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<String>>,

    pub entities: Vec<Entity>,
}

/// Composes the tokenizer, sentiment scorer, and entity extractor.
///
/// All three collaborators are constructed up front and injected; the
/// analyzer itself holds no mutable state and is cheap to clone.
#[derive(Clone)]
pub struct Analyzer {
    tokenizer: Tokenizer,
    sentiment: Arc<dyn SentimentScorer>,
    extractor: Arc<dyn EntityExtractor>,
}

impl Analyzer {
    /// Create an analyzer from explicit collaborators.
    pub fn new(
        tokenizer: Tokenizer,
        sentiment: Arc<dyn SentimentScorer>,
        extractor: Arc<dyn EntityExtractor>,
    ) -> Self {
        Self {
            tokenizer,
            sentiment,
            extractor,
        }
    }

    /// Analyzer using the VADER scorer and the given extractor.
    ///
    /// # Example
    /// ```
    /// use nlp_sidecar::{Analyzer, build_extractor, ExtractorKind};
    ///
    /// let extractor = build_extractor(ExtractorKind::Heuristic, None).unwrap();
    /// let analyzer = Analyzer::with_extractor(extractor).unwrap();
    /// let result = analyzer.analyze("Visit https://example.com today").unwrap();
    /// assert_eq!(result.entities[0].text, "https://example.com");
    /// ```
    pub fn with_extractor(extractor: Arc<dyn EntityExtractor>) -> Result<Self, AnalysisError> {
        Ok(Self::new(
            Tokenizer::new()?,
            Arc::new(VaderScorer::new()),
            extractor,
        ))
    }

    /// Name of the wired-in entity extractor.
    pub fn extractor_name(&self) -> &str {
        self.extractor.name()
    }

    /// Annotate one text.
    pub fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalysisError> {
        let tokens = self
            .extractor
            .emits_tokens()
            .then(|| self.tokenizer.tokens(text));
        let sentiment = self.sentiment.score(text)?;
        let entities = self.extractor.extract(text)?;

        Ok(AnalysisResult {
            sentiment,
            tokens,
            entities,
        })
    }

    /// Annotate every text in a batch, preserving input order.
    ///
    /// # Errors
    /// Fails on the first text that cannot be analyzed; no partial results
    /// are returned.
    pub fn analyze_batch<S: AsRef<str>>(
        &self,
        texts: &[S],
    ) -> Result<Vec<AnalysisResult>, AnalysisError> {
        texts.iter().map(|text| self.analyze(text.as_ref())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{EntityLabel, HeuristicExtractor};

    fn heuristic_analyzer() -> Analyzer {
        Analyzer::with_extractor(Arc::new(HeuristicExtractor::new().unwrap())).unwrap()
    }

    struct FailingExtractor;

    impl EntityExtractor for FailingExtractor {
        fn extract(&self, text: &str) -> Result<Vec<Entity>, AnalysisError> {
            if text.contains("boom") {
                Err(AnalysisError::Model("model unavailable".to_string()))
            } else {
                Ok(Vec::new())
            }
        }

        fn name(&self) -> &str {
            "failing"
        }

        fn emits_tokens(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_analyze_single_text() {
        let result = heuristic_analyzer().analyze("I love Wellington!").unwrap();

        assert!(result.sentiment.compound > 0.0);
        assert_eq!(
            result.tokens,
            Some(vec!["I".to_string(), "love".to_string(), "Wellington".to_string(), "!".to_string()])
        );
        assert_eq!(result.entities, vec![Entity::new("Wellington", EntityLabel::ProperNoun)]);
    }

    #[test]
    fn test_batch_preserves_order_and_length() {
        let texts = ["great day", "", "awful news", "www.example.org"];
        let results = heuristic_analyzer().analyze_batch(&texts).unwrap();

        assert_eq!(results.len(), texts.len());
        assert!(results[0].sentiment.compound > 0.0);
        assert_eq!(results[1].tokens, Some(Vec::new()));
        assert!(results[2].sentiment.compound < 0.0);
        assert_eq!(results[3].entities[0].label, EntityLabel::Url);
    }

    #[test]
    fn test_empty_batch() {
        let texts: Vec<String> = Vec::new();
        assert!(heuristic_analyzer().analyze_batch(&texts).unwrap().is_empty());
    }

    #[test]
    fn test_repeated_analysis_is_identical() {
        let analyzer = heuristic_analyzer();
        let texts = ["Meet Jane Doe at jane@doe.com", "so sad :("];
        let first = analyzer.analyze_batch(&texts).unwrap();
        let second = analyzer.analyze_batch(&texts).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_extractor_without_tokens_omits_field() {
        let analyzer = Analyzer::with_extractor(Arc::new(FailingExtractor)).unwrap();
        let result = analyzer.analyze("fine").unwrap();
        assert!(result.tokens.is_none());

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("tokens").is_none());
    }

    #[test]
    fn test_batch_failure_returns_no_partial_results() {
        let analyzer = Analyzer::with_extractor(Arc::new(FailingExtractor)).unwrap();
        let result = analyzer.analyze_batch(&["ok", "boom", "ok"]);
        assert!(matches!(result, Err(AnalysisError::Model(_))));
    }
}
