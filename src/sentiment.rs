//! Lexicon-based sentiment scoring.
//!
//! The scorer is a thin adapter over the VADER analyzer: it surfaces the
//! analyzer's four polarity scores as a [`SentimentScore`] without any
//! custom weighting.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use vader_sentiment::SentimentIntensityAnalyzer;

use crate::error::AnalysisError;

/// Polarity scores for one text.
///
/// `neg`, `neu`, and `pos` lie in `[0, 1]` and sum to 1 (within rounding);
/// `compound` is the normalized aggregate in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub neg: f64,
    pub neu: f64,
    pub pos: f64,
    pub compound: f64,
}

impl SentimentScore {
    /// Score reported for text with nothing to score.
    pub const NEUTRAL: SentimentScore = SentimentScore {
        neg: 0.0,
        neu: 1.0,
        pos: 0.0,
        compound: 0.0,
    };

    /// Build a score from the analyzer's raw key/value output.
    ///
    /// # Errors
    /// Returns error if any of the four keys is missing.
    pub fn from_polarity_map(raw: &HashMap<&str, f64>) -> Result<Self, AnalysisError> {
        let get = |key: &str| {
            raw.get(key)
                .copied()
                .ok_or_else(|| AnalysisError::Sentiment(format!("analyzer output missing '{}'", key)))
        };

        let score = Self {
            neg: get("neg")?,
            neu: get("neu")?,
            pos: get("pos")?,
            compound: get("compound")?,
        };

        // Empty or whitespace-only input yields all zeros
        if score.neg == 0.0 && score.neu == 0.0 && score.pos == 0.0 {
            return Ok(Self::NEUTRAL);
        }

        Ok(score)
    }

    /// Sum of the three class scores.
    pub fn class_total(&self) -> f64 {
        self.neg + self.neu + self.pos
    }
}

/// Capability that assigns polarity scores to a text.
pub trait SentimentScorer: Send + Sync {
    /// Score a single text.
    fn score(&self, text: &str) -> Result<SentimentScore, AnalysisError>;
}

/// VADER lexicon/rule-based scorer.
pub struct VaderScorer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl VaderScorer {
    /// Load the bundled VADER lexicon.
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }
}

impl Default for VaderScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentScorer for VaderScorer {
    fn score(&self, text: &str) -> Result<SentimentScore, AnalysisError> {
        if text.trim().is_empty() {
            return Ok(SentimentScore::NEUTRAL);
        }
        let raw = self.analyzer.polarity_scores(text);
        SentimentScore::from_polarity_map(&raw)
    }
}
