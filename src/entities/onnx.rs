//! Model-backed entity extraction with ONNX Runtime.
//!
//! Runs a HuggingFace token-classification export (BERT-style NER). The model
//! directory must contain `model.onnx`, `tokenizer.json`, and `config.json`
//! with an `id2label` map such as `{"0": "O", "1": "B-PER", "2": "I-PER"}`.
//!
//! Spans are built by merging consecutive tokens tagged with the same entity
//! type (`B-X` opens a span, `I-X` extends it). Labels are emitted without
//! the BIO prefix, in the order the model produced them.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use serde::Deserialize;
use tokenizers::Tokenizer;
use tracing::info;

use super::{Entity, EntityExtractor, EntityLabel};
use crate::error::AnalysisError;

/// Maximum sequence length fed to the model; longer texts are truncated.
const MAX_SEQUENCE_LENGTH: usize = 512;

#[derive(Debug, Deserialize)]
struct ModelConfig {
    id2label: HashMap<String, String>,
}

/// Named-entity extractor backed by a pretrained ONNX model.
pub struct OnnxEntityExtractor {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    labels: Vec<String>,
    uses_token_type_ids: bool,
}

impl OnnxEntityExtractor {
    /// Load a token-classification model from `model_dir`.
    pub fn load(model_dir: &Path) -> Result<Self, AnalysisError> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let config_path = model_dir.join("config.json");

        for path in [&model_path, &tokenizer_path, &config_path] {
            if !path.exists() {
                return Err(AnalysisError::Model(format!(
                    "{} not found in {}",
                    path.file_name().and_then(|n| n.to_str()).unwrap_or("file"),
                    model_dir.display()
                )));
            }
        }

        let session = Session::builder()
            .map_err(|e| AnalysisError::Model(format!("session builder: {}", e)))?
            .commit_from_file(&model_path)
            .map_err(|e| AnalysisError::Model(format!("load model: {}", e)))?;

        let uses_token_type_ids = session
            .inputs()
            .iter()
            .any(|input| input.name() == "token_type_ids");

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| AnalysisError::Model(format!("load tokenizer: {}", e)))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| AnalysisError::Model(format!("set truncation: {}", e)))?;

        let labels = load_labels(&config_path)?;

        info!(
            model = %model_path.display(),
            labels = labels.len(),
            "loaded entity model"
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            labels,
            uses_token_type_ids,
        })
    }

    fn tag_tokens(&self, text: &str) -> Result<Vec<TaggedToken>, AnalysisError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| AnalysisError::Model(format!("tokenize: {}", e)))?;

        let seq_len = encoding.get_ids().len();
        if seq_len == 0 {
            return Ok(Vec::new());
        }

        let to_i64 = |values: &[u32]| values.iter().map(|&v| v as i64).collect::<Vec<i64>>();
        let shape = [1i64, seq_len as i64];

        let tensor = |values: Vec<i64>| {
            Tensor::from_array((shape, values.into_boxed_slice()))
                .map_err(|e| AnalysisError::Model(format!("build tensor: {}", e)))
        };
        let ids_tensor = tensor(to_i64(encoding.get_ids()))?;
        let mask_tensor = tensor(to_i64(encoding.get_attention_mask()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| AnalysisError::Model("model session poisoned".to_string()))?;

        let run = if self.uses_token_type_ids {
            let type_tensor = tensor(to_i64(encoding.get_type_ids()))?;
            session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
                "token_type_ids" => type_tensor,
            ])
        } else {
            session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
            ])
        };
        let outputs = run.map_err(|e| AnalysisError::Model(format!("inference: {}", e)))?;

        // Logits: [1, seq_len, num_labels]
        let (output_shape, logits) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| AnalysisError::Model(format!("read logits: {}", e)))?;
        let dims: &[i64] = output_shape;
        if dims.len() != 3 || dims[0] != 1 || dims[2] as usize != self.labels.len() {
            return Err(AnalysisError::Model(format!(
                "unexpected output shape: {:?}, expected [1, {}, {}]",
                dims,
                seq_len,
                self.labels.len()
            )));
        }

        let num_labels = self.labels.len();
        let mut tagged = Vec::with_capacity(seq_len);
        for (j, (&(start, end), &special)) in encoding
            .get_offsets()
            .iter()
            .zip(encoding.get_special_tokens_mask())
            .enumerate()
            .take(dims[1] as usize)
        {
            if special == 1 || start == end {
                continue;
            }
            let row = &logits[j * num_labels..(j + 1) * num_labels];
            tagged.push(TaggedToken {
                start,
                end,
                tag: self.labels[argmax(row)].as_str().into(),
            });
        }

        Ok(tagged)
    }
}

impl EntityExtractor for OnnxEntityExtractor {
    fn extract(&self, text: &str) -> Result<Vec<Entity>, AnalysisError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let tagged = self.tag_tokens(text)?;
        Ok(merge_spans(text, &tagged))
    }

    fn name(&self) -> &str {
        "onnx"
    }

    fn emits_tokens(&self) -> bool {
        false
    }
}

/// One model token with its byte span and predicted tag.
#[derive(Debug, Clone)]
struct TaggedToken {
    start: usize,
    end: usize,
    tag: Tag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tag {
    Outside,
    Begin(String),
    Inside(String),
}

impl From<&str> for Tag {
    fn from(label: &str) -> Self {
        if let Some(kind) = label.strip_prefix("B-") {
            Tag::Begin(kind.to_string())
        } else if let Some(kind) = label.strip_prefix("I-") {
            Tag::Inside(kind.to_string())
        } else if label == "O" {
            Tag::Outside
        } else {
            // Models without BIO prefixes tag each token with a bare type
            Tag::Inside(label.to_string())
        }
    }
}

fn merge_spans(text: &str, tokens: &[TaggedToken]) -> Vec<Entity> {
    let mut entities = Vec::new();
    let mut current: Option<(usize, usize, String)> = None;

    let mut flush = |span: Option<(usize, usize, String)>| {
        if let Some((start, end, kind)) = span {
            if let Some(slice) = text.get(start..end) {
                entities.push(Entity::new(slice, EntityLabel::Model(kind)));
            }
        }
    };

    for token in tokens {
        match &token.tag {
            Tag::Outside => flush(current.take()),
            Tag::Begin(kind) => {
                flush(current.take());
                current = Some((token.start, token.end, kind.clone()));
            }
            Tag::Inside(kind) => {
                let extends = matches!(&current, Some((_, _, open)) if open == kind);
                match current.as_mut() {
                    Some((_, end, _)) if extends => *end = token.end,
                    _ => {
                        flush(current.take());
                        current = Some((token.start, token.end, kind.clone()));
                    }
                }
            }
        }
    }
    flush(current.take());

    entities
}

fn load_labels(config_path: &Path) -> Result<Vec<String>, AnalysisError> {
    let contents = fs::read_to_string(config_path)
        .map_err(|e| AnalysisError::Model(format!("read {}: {}", config_path.display(), e)))?;
    let config: ModelConfig = serde_json::from_str(&contents)
        .map_err(|e| AnalysisError::Model(format!("parse {}: {}", config_path.display(), e)))?;

    let mut labels = vec![String::new(); config.id2label.len()];
    for (id, label) in config.id2label {
        let index: usize = id
            .parse()
            .map_err(|_| AnalysisError::Model(format!("non-numeric label id '{}'", id)))?;
        let slot = labels
            .get_mut(index)
            .ok_or_else(|| AnalysisError::Model(format!("label id {} out of range", index)))?;
        *slot = label;
    }
    Ok(labels)
}

fn argmax(row: &[f32]) -> usize {
    row.iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best, best_val), (i, &v)| {
            if v > best_val {
                (i, v)
            } else {
                (best, best_val)
            }
        })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(start: usize, end: usize, tag: &str) -> TaggedToken {
        TaggedToken {
            start,
            end,
            tag: tag.into(),
        }
    }

    #[test]
    fn test_merge_bio_spans() {
        let text = "Ada Lovelace visited London";
        let tokens = vec![
            token(0, 3, "B-PER"),
            token(4, 12, "I-PER"),
            token(13, 20, "O"),
            token(21, 27, "B-LOC"),
        ];

        let entities = merge_spans(text, &tokens);
        assert_eq!(
            entities,
            vec![
                Entity::new("Ada Lovelace", EntityLabel::Model("PER".to_string())),
                Entity::new("London", EntityLabel::Model("LOC".to_string())),
            ]
        );
    }

    #[test]
    fn test_inside_of_new_type_opens_span() {
        let text = "Acme Paris";
        let tokens = vec![token(0, 4, "I-ORG"), token(5, 10, "I-LOC")];
        let labels: Vec<String> = merge_spans(text, &tokens)
            .into_iter()
            .map(|e| e.label.to_string())
            .collect();
        assert_eq!(labels, vec!["ORG", "LOC"]);
    }

    #[test]
    fn test_subword_tokens_merge() {
        let text = "Wellington";
        let tokens = vec![token(0, 4, "B-LOC"), token(4, 10, "I-LOC")];
        let entities = merge_spans(text, &tokens);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].text, "Wellington");
    }

    #[test]
    fn test_argmax() {
        assert_eq!(argmax(&[0.1, 2.5, -1.0]), 1);
        assert_eq!(argmax(&[3.0]), 0);
    }

    #[test]
    fn test_load_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"id2label": {"1": "B-PER", "0": "O", "2": "I-PER"}}"#).unwrap();
        assert_eq!(load_labels(&path).unwrap(), vec!["O", "B-PER", "I-PER"]);
    }

    #[test]
    fn test_load_missing_model_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = OnnxEntityExtractor::load(dir.path()).err().unwrap();
        assert!(err.to_string().contains("model.onnx"));
    }
}
