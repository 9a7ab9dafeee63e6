//! Error types for text analysis and service configuration.

use std::fmt;

/// Error raised while analyzing a text.
///
/// Every variant is an internal failure: malformed requests are rejected at
/// the HTTP boundary before any analysis runs.
#[derive(Debug, Clone)]
pub enum AnalysisError {
    Tokenizer(String),
    /// A built-in scan pattern failed to compile
    Pattern(String),
    Sentiment(String),
    Model(String),
    /// The blocking worker running the batch panicked or was cancelled
    Worker(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::Tokenizer(msg) => write!(f, "Tokenizer error: {}", msg),
            AnalysisError::Pattern(msg) => write!(f, "Invalid pattern: {}", msg),
            AnalysisError::Sentiment(msg) => write!(f, "Sentiment error: {}", msg),
            AnalysisError::Model(msg) => write!(f, "Entity model error: {}", msg),
            AnalysisError::Worker(msg) => write!(f, "Analysis worker failed: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}

/// Error raised while resolving the service configuration at startup.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Parse(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}
