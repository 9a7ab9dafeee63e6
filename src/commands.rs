//! One-shot annotation from the command line.
//!
//! Runs the same pipeline the HTTP listener runs, reading texts from
//! arguments or line-by-line from a reader, and writes the JSON response a
//! `POST /analyze_batch` call would have returned.

use std::error::Error;
use std::io::{BufRead, Write};

use crate::config::ServiceConfig;
use crate::entities::build_extractor;
use crate::pipeline::Analyzer;
use crate::server::AnalysisResponse;

/// Analyze `texts` (or, when empty, every line of `input`) and write the
/// pretty-printed response to `writer`.
///
/// # Returns
///
/// Number of texts analyzed
pub fn analyze_texts<R: BufRead, W: Write>(
    config: &ServiceConfig,
    texts: Vec<String>,
    input: R,
    writer: &mut W,
) -> Result<usize, Box<dyn Error>> {
    let texts = if texts.is_empty() {
        input.lines().collect::<Result<Vec<_>, _>>()?
    } else {
        texts
    };

    let extractor = build_extractor(config.extractor, config.model_dir.as_deref())?;
    let analyzer = Analyzer::with_extractor(extractor)?;
    let results = analyzer.analyze_batch(&texts)?;

    writeln!(writer, "{}", serde_json::to_string_pretty(&AnalysisResponse { results })?)?;
    Ok(texts.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLayer;
    use crate::entities::ExtractorKind;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::io::{self, Cursor};
    use std::path::PathBuf;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn run(config: &ServiceConfig, texts: &[&str], stdin: &str) -> Value {
        let mut out = Vec::new();
        let texts = texts.iter().map(|t| t.to_string()).collect();
        analyze_texts(config, texts, Cursor::new(stdin), &mut out).unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn test_analyze_arguments() {
        let body = run(
            &ServiceConfig::default(),
            &["Write to ana@silva.pt", "The parcel arrived on Monday."],
            "ignored when texts are given",
        );

        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["entities"], json!([{"text": "ana@silva.pt", "label": "EMAIL"}]));
        assert_eq!(results[1]["entities"], json!([{"text": "Monday", "label": "PROPER_NOUN"}]));
    }

    #[test]
    fn test_analyze_reads_lines_when_no_arguments() {
        let body = run(
            &ServiceConfig::default(),
            &[],
            "Visit https://example.com today\nI love it!\n",
        );

        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0]["entities"],
            json!([{"text": "https://example.com", "label": "URL"}])
        );
        assert!(results[1]["sentiment"]["compound"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn test_analyze_empty_input_writes_empty_results() {
        let body = run(&ServiceConfig::default(), &[], "");
        assert_eq!(body, json!({"results": []}));
    }

    #[test]
    fn test_analyze_propagates_read_errors() {
        struct FailingReader;

        impl io::Read for FailingReader {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdin closed"))
            }
        }

        let mut out = Vec::new();
        let result = analyze_texts(
            &ServiceConfig::default(),
            Vec::new(),
            io::BufReader::new(FailingReader),
            &mut out,
        );
        assert!(result.is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn test_env_extractor_applies_to_analyze() {
        let config = ServiceConfig::load_with_env(
            None,
            ConfigLayer::default(),
            env(&[("NLP_EXTRACTOR", "onnx")]),
        );
        // onnx from the environment needs a model directory
        assert!(config.is_err());
    }

    #[test]
    fn test_cli_extractor_overrides_env_for_analyze() {
        let cli = ConfigLayer {
            extractor: Some(ExtractorKind::Heuristic),
            ..Default::default()
        };
        let config = ServiceConfig::load_with_env(
            None,
            cli,
            env(&[("NLP_EXTRACTOR", "onnx"), ("NLP_MODEL_DIR", "models/ner")]),
        )
        .unwrap();
        assert_eq!(config.extractor, ExtractorKind::Heuristic);
        assert_eq!(config.model_dir, Some(PathBuf::from("models/ner")));

        let body = run(&config, &["Please call John Smith"], "");
        assert_eq!(
            body["results"][0]["entities"],
            json!([{"text": "John Smith", "label": "PROPER_NOUN"}])
        );
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn test_analyze_onnx_without_feature_fails() {
        let config = ServiceConfig {
            extractor: ExtractorKind::Onnx,
            model_dir: Some(PathBuf::from("models/ner")),
            ..Default::default()
        };
        let mut out = Vec::new();
        let result = analyze_texts(&config, vec!["hi".to_string()], Cursor::new(""), &mut out);
        assert!(result.is_err());
        assert!(out.is_empty());
    }
}
