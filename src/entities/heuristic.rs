//! Pattern-based entity extraction.
//!
//! Runs three independent scans over the raw text and emits every match:
//! all URLs first, then all emails, then all proper-noun candidates, each
//! group in left-to-right order.
//!
//! Matches are not deduplicated across scans. A capitalized word inside a
//! URL, for instance, is reported both as part of the URL and as a proper
//! noun.

use regex::Regex;

use super::{Entity, EntityExtractor, EntityLabel};
use crate::error::AnalysisError;

const URL_PATTERN: &str = r"https?://\S+|www\.\S+";
const EMAIL_PATTERN: &str = r"[\w.-]+@[\w.-]+\.[A-Za-z]{2,}";
const PROPER_NOUN_PATTERN: &str = r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\b";

/// Characters stripped from the end of a URL match.
const URL_TRAILING: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '\'', '"'];

const SENTENCE_END: &[char] = &['.', '!', '?'];

/// Proper-noun runs must be longer than this many characters.
const MIN_PROPER_NOUN_CHARS: usize = 2;

fn compile(pattern: &str) -> Result<Regex, AnalysisError> {
    Regex::new(pattern).map_err(|e| AnalysisError::Pattern(e.to_string()))
}

/// Regex-backed extractor for URLs, emails, and proper nouns.
#[derive(Debug, Clone)]
pub struct HeuristicExtractor {
    url: Regex,
    email: Regex,
    proper_noun: Regex,
}

impl HeuristicExtractor {
    /// Compile the three scan patterns.
    pub fn new() -> Result<Self, AnalysisError> {
        Ok(Self {
            url: compile(URL_PATTERN)?,
            email: compile(EMAIL_PATTERN)?,
            proper_noun: compile(PROPER_NOUN_PATTERN)?,
        })
    }

    /// URL matches, with trailing punctuation trimmed.
    pub fn urls<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.url
            .find_iter(text)
            .filter_map(|m| trim_url(m.as_str()))
            .collect()
    }

    pub fn emails<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.email.find_iter(text).map(|m| m.as_str()).collect()
    }

    /// Runs of capitalized words.
    ///
    /// A lone capitalized word that opens a sentence is skipped, since its
    /// capital letter is grammatical rather than a naming signal.
    pub fn proper_nouns<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.proper_noun
            .find_iter(text)
            .filter(|m| m.as_str().chars().count() > MIN_PROPER_NOUN_CHARS)
            .filter(|m| {
                let single_word = !m.as_str().contains(char::is_whitespace);
                !(single_word && opens_sentence(text, m.start()))
            })
            .map(|m| m.as_str())
            .collect()
    }
}

impl EntityExtractor for HeuristicExtractor {
    fn extract(&self, text: &str) -> Result<Vec<Entity>, AnalysisError> {
        let mut entities = Vec::new();

        for url in self.urls(text) {
            entities.push(Entity::new(url, EntityLabel::Url));
        }
        for email in self.emails(text) {
            entities.push(Entity::new(email, EntityLabel::Email));
        }
        for name in self.proper_nouns(text) {
            entities.push(Entity::new(name, EntityLabel::ProperNoun));
        }

        Ok(entities)
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}

fn trim_url(raw: &str) -> Option<&str> {
    let trimmed = raw.trim_end_matches(URL_TRAILING);
    if trimmed.ends_with("://") || trimmed.eq_ignore_ascii_case("www") {
        None
    } else {
        Some(trimmed)
    }
}

fn opens_sentence(text: &str, start: usize) -> bool {
    let before = text[..start].trim_end();
    before.is_empty() || before.ends_with(SENTENCE_END)
}
