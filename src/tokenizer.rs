//! Permissive word/punctuation tokenizer.
//!
//! Splits raw text into runs of word characters, apostrophe contractions
//! (`'s`, `'t`), and single punctuation marks. No case folding or accent
//! normalization is performed; this is a crude tokenizer, not a linguistic one.

use regex::Regex;

use crate::error::AnalysisError;

const TOKEN_PATTERN: &str = r"\w+|'\w+|[.!?,;]";

/// Regex-backed tokenizer.
///
/// Compiled once and shared read-only across requests.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    pattern: Regex,
}

impl Tokenizer {
    /// Compile the token pattern.
    pub fn new() -> Result<Self, AnalysisError> {
        let pattern =
            Regex::new(TOKEN_PATTERN).map_err(|e| AnalysisError::Tokenizer(e.to_string()))?;
        Ok(Self { pattern })
    }

    /// Iterate over the tokens of `text`, left to right.
    ///
    /// The iterator borrows `text`; calling `tokenize` again restarts the scan
    /// from the beginning.
    ///
    /// # Example
    /// ```
    /// use nlp_sidecar::Tokenizer;
    ///
    /// let tokenizer = Tokenizer::new().unwrap();
    /// let tokens: Vec<&str> = tokenizer.tokenize("Don't stop!").collect();
    /// assert_eq!(tokens, vec!["Don", "'t", "stop", "!"]);
    /// ```
    pub fn tokenize<'t>(&'t self, text: &'t str) -> impl Iterator<Item = &'t str> + 't {
        self.pattern.find_iter(text).map(|m| m.as_str())
    }

    /// Tokenize into owned strings, ready for serialization.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        self.tokenize(text).map(String::from).collect()
    }
}
