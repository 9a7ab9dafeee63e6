//! Service configuration.
//!
//! Settings are resolved from several layers, highest precedence first:
//!
//! 1. CLI flags
//! 2. Environment variables (`NLP_HOST`, `NLP_PORT`, `NLP_EXTRACTOR`,
//!    `NLP_MODEL_DIR`, `NLP_MAX_BODY_BYTES`)
//! 3. YAML config file
//! 4. Built-in defaults (loopback `127.0.0.1:8000`, heuristic extractor)
//!
//! Example config file:
//!
//! ```yaml
//! host: 127.0.0.1
//! port: 8000
//! extractor: onnx
//! model_dir: models/bert-base-ner
//! ```

use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::entities::ExtractorKind;
use crate::error::ConfigError;

pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// One layer of optional settings (config file or CLI flags).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub extractor: Option<ExtractorKind>,
    #[serde(default)]
    pub model_dir: Option<PathBuf>,
    #[serde(default)]
    pub max_body_bytes: Option<usize>,
}

impl ConfigLayer {
    /// Load a layer from a YAML file.
    ///
    /// # Errors
    /// Returns error if the file can't be read or has unknown/invalid keys.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))
    }

    /// Read a layer from environment variables through `lookup`.
    pub fn from_env<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = lookup("NLP_PORT")
            .map(|v| {
                v.trim()
                    .parse::<u16>()
                    .map_err(|_| ConfigError::Invalid(format!("NLP_PORT is not a valid port: '{}'", v)))
            })
            .transpose()?;

        let extractor = lookup("NLP_EXTRACTOR")
            .map(|v| v.parse::<ExtractorKind>())
            .transpose()?;

        let max_body_bytes = lookup("NLP_MAX_BODY_BYTES")
            .map(|v| {
                v.trim().parse::<usize>().map_err(|_| {
                    ConfigError::Invalid(format!("NLP_MAX_BODY_BYTES is not a byte count: '{}'", v))
                })
            })
            .transpose()?;

        Ok(Self {
            host: lookup("NLP_HOST"),
            port,
            extractor,
            model_dir: lookup("NLP_MODEL_DIR").map(PathBuf::from),
            max_body_bytes,
        })
    }

    /// Fill every unset field from `lower`.
    pub fn or(self, lower: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            host: self.host.or(lower.host),
            port: self.port.or(lower.port),
            extractor: self.extractor.or(lower.extractor),
            model_dir: self.model_dir.or(lower.model_dir),
            max_body_bytes: self.max_body_bytes.or(lower.max_body_bytes),
        }
    }
}

/// Fully resolved service settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub host: IpAddr,
    pub port: u16,
    pub extractor: ExtractorKind,
    pub model_dir: Option<PathBuf>,
    pub max_body_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST,
            port: DEFAULT_PORT,
            extractor: ExtractorKind::default(),
            model_dir: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServiceConfig {
    /// Resolve settings from CLI flags, the process environment, and an
    /// optional config file.
    pub fn load(config_file: Option<&Path>, cli: ConfigLayer) -> Result<Self, ConfigError> {
        Self::load_with_env(config_file, cli, |key| std::env::var(key).ok())
    }

    /// Same as [`ServiceConfig::load`], reading environment variables
    /// through `lookup`.
    pub fn load_with_env<F>(
        config_file: Option<&Path>,
        cli: ConfigLayer,
        lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match config_file {
            Some(path) => ConfigLayer::load_from_file(path)?,
            None => ConfigLayer::default(),
        };
        let env = ConfigLayer::from_env(lookup)?;

        Self::resolve(cli.or(env).or(file))
    }

    /// Apply defaults to a merged layer and validate the result.
    pub fn resolve(layer: ConfigLayer) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = match layer.host {
            Some(host) => host
                .trim()
                .parse::<IpAddr>()
                .map_err(|_| ConfigError::Invalid(format!("host is not an IP address: '{}'", host)))?,
            None => defaults.host,
        };

        let config = Self {
            host,
            port: layer.port.unwrap_or(defaults.port),
            extractor: layer.extractor.unwrap_or(defaults.extractor),
            model_dir: layer.model_dir,
            max_body_bytes: layer.max_body_bytes.unwrap_or(defaults.max_body_bytes),
        };
        config.validate()?;

        if !config.host.is_loopback() {
            tracing::warn!(
                "Binding to non-loopback address {}; the sidecar has no authentication",
                config.host
            );
        }

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.extractor == ExtractorKind::Onnx && self.model_dir.is_none() {
            return Err(ConfigError::Invalid(
                "extractor 'onnx' requires model_dir (or NLP_MODEL_DIR / --model-dir)".to_string(),
            ));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid("max_body_bytes must be positive".to_string()));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::resolve(ConfigLayer::default()).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8000");
        assert_eq!(config.extractor, ExtractorKind::Heuristic);
        assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        assert_eq!(config.host, DEFAULT_HOST);
        assert!(config.host.is_loopback());
    }

    #[test]
    fn test_load_layers_file_env_and_cli() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "host: 127.0.0.5\nport: 9100\nmax_body_bytes: 4096").unwrap();

        let cli = ConfigLayer {
            port: Some(9300),
            ..Default::default()
        };
        let config = ServiceConfig::load_with_env(
            Some(file.path()),
            cli,
            env(&[("NLP_PORT", "9200"), ("NLP_MAX_BODY_BYTES", "8192")]),
        )
        .unwrap();

        assert_eq!(config.host.to_string(), "127.0.0.5");
        assert_eq!(config.port, 9300);
        assert_eq!(config.max_body_bytes, 8192);
    }

    #[test]
    fn test_load_rejects_invalid_env_extractor() {
        let err = ServiceConfig::load_with_env(
            None,
            ConfigLayer::default(),
            env(&[("NLP_EXTRACTOR", "bogus")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_file_extractor_uses_same_grammar_as_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "extractor: REGEX").unwrap();

        let layer = ConfigLayer::load_from_file(file.path()).unwrap();
        assert_eq!(layer.extractor, Some(ExtractorKind::Heuristic));
    }

    #[test]
    fn test_file_with_unknown_extractor_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "extractor: spacy").unwrap();

        let err = ConfigLayer::load_from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("spacy"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port: 9100\nextractor: heuristic\nmax_body_bytes: 4096").unwrap();

        let layer = ConfigLayer::load_from_file(file.path()).unwrap();
        assert_eq!(layer.port, Some(9100));
        assert_eq!(layer.extractor, Some(ExtractorKind::Heuristic));
        assert_eq!(layer.max_body_bytes, Some(4096));
        assert_eq!(layer.host, None);
    }

    #[test]
    fn test_unknown_file_key_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "prot: 9100").unwrap();

        let err = ConfigLayer::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_empty_file_is_empty_layer() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(ConfigLayer::load_from_file(file.path()).unwrap(), ConfigLayer::default());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ConfigLayer::load_from_file("/nonexistent/nlp.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_env_layer() {
        let layer = ConfigLayer::from_env(env(&[
            ("NLP_HOST", "0.0.0.0"),
            ("NLP_PORT", "8100"),
            ("NLP_EXTRACTOR", "onnx"),
            ("NLP_MODEL_DIR", "/opt/models/ner"),
        ]))
        .unwrap();

        assert_eq!(layer.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(layer.port, Some(8100));
        assert_eq!(layer.extractor, Some(ExtractorKind::Onnx));
        assert_eq!(layer.model_dir, Some(PathBuf::from("/opt/models/ner")));
    }

    #[test]
    fn test_env_invalid_port() {
        let err = ConfigLayer::from_env(env(&[("NLP_PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("NLP_PORT"));
    }

    #[test]
    fn test_precedence_cli_over_env_over_file() {
        let cli = ConfigLayer {
            port: Some(7000),
            ..Default::default()
        };
        let env = ConfigLayer {
            port: Some(7100),
            host: Some("127.0.0.2".to_string()),
            ..Default::default()
        };
        let file = ConfigLayer {
            port: Some(7200),
            host: Some("127.0.0.3".to_string()),
            max_body_bytes: Some(1024),
            ..Default::default()
        };

        let config = ServiceConfig::resolve(cli.or(env).or(file)).unwrap();
        assert_eq!(config.port, 7000);
        assert_eq!(config.host.to_string(), "127.0.0.2");
        assert_eq!(config.max_body_bytes, 1024);
    }

    #[test]
    fn test_onnx_requires_model_dir() {
        let layer = ConfigLayer {
            extractor: Some(ExtractorKind::Onnx),
            ..Default::default()
        };
        let err = ServiceConfig::resolve(layer).unwrap_err();
        assert!(err.to_string().contains("model_dir"));
    }

    #[test]
    fn test_invalid_host() {
        let layer = ConfigLayer {
            host: Some("localhost:80".to_string()),
            ..Default::default()
        };
        assert!(ServiceConfig::resolve(layer).is_err());
    }
}
