use std::collections::HashMap;

use candle_core::{Device, Tensor, D};
use candle_nn::ops::softmax;
use candle_transformers::models::modernbert::{
    ClassifierConfig, ClassifierPooling, Config,
    ModernBertForSequenceClassification as CandleModernBertForSequenceClassification,
};
use serde::{Deserialize, Serialize};
use tokenizers::{Encoding, Tokenizer};

use crate::error::{Result, SentimentError};
use crate::loaders::{ClassifierLoader, TokenizerLoader};
use crate::pipelines::sentiment::model::{SentimentAnalysisModel, SentimentResult};

/// Available ModernBERT model sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModernBertSize {
    /// Base model (~150M parameters).
    #[default]
    Base,
    /// Large model (~400M parameters).
    Large,
}

impl ModernBertSize {
    fn repo_id(&self) -> &'static str {
        match self {
            ModernBertSize::Base => "clapAI/modernBERT-base-multilingual-sentiment",
            ModernBertSize::Large => "clapAI/modernBERT-large-multilingual-sentiment",
        }
    }
}

impl std::fmt::Display for ModernBertSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ModernBertSize::Base => "modernbert-base",
            ModernBertSize::Large => "modernbert-large",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for ModernBertSize {
    type Err = SentimentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "base" | "modernbert-base" => Ok(ModernBertSize::Base),
            "large" | "modernbert-large" => Ok(ModernBertSize::Large),
            other => Err(SentimentError::Config(format!(
                "unknown model size '{other}': expected 'base' or 'large'"
            ))),
        }
    }
}

#[derive(Clone)]
pub struct SentimentModernBertModel {
    model: CandleModernBertForSequenceClassification,
    device: Device,
    id2label: HashMap<String, String>,
}

impl SentimentModernBertModel {
    pub fn new(size: ModernBertSize, device: Device) -> Result<Self> {
        tracing::info!(model = %size, repo = size.repo_id(), device = ?device.location(), "loading sentiment model");

        let checkpoint = ClassifierLoader::new(size.repo_id()).load::<Config>(&device)?;
        let mut config = checkpoint.config;
        patch_classifier_config(&mut config, &checkpoint.id2label);

        let model = CandleModernBertForSequenceClassification::load(checkpoint.weights, &config)?;

        Ok(Self {
            model,
            device,
            id2label: checkpoint.id2label,
        })
    }

    fn label_for(&self, pred_id: u32) -> Result<String> {
        self.id2label
            .get(&pred_id.to_string())
            .cloned()
            .ok_or_else(|| {
                let available: Vec<&str> = self.id2label.values().map(String::as_str).collect();
                SentimentError::Classifier(format!(
                    "Predicted label ID {} not in id2label. Available: {}",
                    pred_id,
                    available.join(", ")
                ))
            })
    }
}

fn encode(tokenizer: &Tokenizer, text: &str) -> Result<Encoding> {
    tokenizer.encode(text, true).map_err(|e| {
        SentimentError::Tokenization(format!(
            "Tokenization failed on '{}': {}",
            &text.chars().take(50).collect::<String>(),
            e
        ))
    })
}

impl SentimentAnalysisModel for SentimentModernBertModel {
    type Options = ModernBertSize;

    fn new(options: Self::Options, device: Device) -> Result<Self> {
        SentimentModernBertModel::new(options, device)
    }

    fn predict_with_score(&self, tokenizer: &Tokenizer, text: &str) -> Result<SentimentResult> {
        let tokens = encode(tokenizer, text)?;

        let input_ids = Tensor::new(tokens.get_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask =
            Tensor::new(tokens.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let logits = self.model.forward(&input_ids, &attention_mask)?;
        let pred_id = logits.argmax(D::Minus1)?.squeeze(0)?.to_scalar::<u32>()?;

        let probs = softmax(&logits, D::Minus1)?;
        let probs_vec = probs.squeeze(0)?.to_vec1::<f32>()?;
        let score = probs_vec.get(pred_id as usize).copied().unwrap_or(0.0);

        Ok(SentimentResult {
            label: self.label_for(pred_id)?,
            score,
        })
    }

    fn predict_with_score_batch(
        &self,
        tokenizer: &Tokenizer,
        texts: &[&str],
    ) -> Result<Vec<Result<SentimentResult>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let pad_token_id = tokenizer
            .get_padding()
            .map(|p| p.pad_id)
            .or_else(|| tokenizer.token_to_id("<pad>"))
            .or_else(|| tokenizer.token_to_id("[PAD]"))
            .unwrap_or(0);

        let mut results: Vec<Option<Result<SentimentResult>>> = Vec::with_capacity(texts.len());
        let mut valid: Vec<(usize, Encoding)> = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            match encode(tokenizer, text) {
                Ok(encoding) => {
                    valid.push((i, encoding));
                    results.push(None);
                }
                Err(e) => results.push(Some(Err(e))),
            }
        }

        if !valid.is_empty() {
            let max_len = valid.iter().map(|(_, e)| e.len()).max().unwrap_or(0);

            let mut all_token_ids: Vec<u32> = Vec::with_capacity(valid.len() * max_len);
            let mut all_attention_masks: Vec<u32> = Vec::with_capacity(valid.len() * max_len);

            for (_, encoding) in &valid {
                let mut token_ids = encoding.get_ids().to_vec();
                let mut attention_mask = encoding.get_attention_mask().to_vec();
                token_ids.resize(max_len, pad_token_id);
                attention_mask.resize(max_len, 0);
                all_token_ids.extend(token_ids);
                all_attention_masks.extend(attention_mask);
            }

            let batch_size = valid.len();
            let input_ids = Tensor::from_vec(all_token_ids, (batch_size, max_len), &self.device)?;
            let attention_mask =
                Tensor::from_vec(all_attention_masks, (batch_size, max_len), &self.device)?;

            let logits = self.model.forward(&input_ids, &attention_mask)?;
            let probs_2d = softmax(&logits, D::Minus1)?.to_vec2::<f32>()?;
            let pred_ids = logits.argmax(D::Minus1)?.to_vec1::<u32>()?;

            for (batch_idx, (orig_idx, _)) in valid.iter().enumerate() {
                let pred_id = pred_ids[batch_idx];
                let score = probs_2d[batch_idx]
                    .get(pred_id as usize)
                    .copied()
                    .unwrap_or(0.0);
                results[*orig_idx] = Some(
                    self.label_for(pred_id)
                        .map(|label| SentimentResult { label, score }),
                );
            }
        }

        Ok(results
            .into_iter()
            .map(|r| {
                r.unwrap_or_else(|| {
                    Err(SentimentError::Unexpected(
                        "Model returned no prediction".to_string(),
                    ))
                })
            })
            .collect())
    }

    fn get_tokenizer(options: Self::Options, max_length: usize) -> Result<Tokenizer> {
        TokenizerLoader::new(options.repo_id(), max_length).load()
    }

    fn device(&self) -> &Device {
        &self.device
    }
}

/// Makes sure the classifier head is sized to the checkpoint's label map.
fn patch_classifier_config(config: &mut Config, id2label: &HashMap<String, String>) {
    let current = config
        .classifier_config
        .as_ref()
        .map(|c| c.id2label.len())
        .unwrap_or(0);
    if current == id2label.len() {
        return;
    }

    let label2id = id2label
        .iter()
        .map(|(id, label)| (label.clone(), id.clone()))
        .collect();

    config.classifier_config = Some(ClassifierConfig {
        id2label: id2label.clone(),
        label2id,
        classifier_pooling: ClassifierPooling::default(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_parses_from_config_strings() {
        assert_eq!("base".parse::<ModernBertSize>().unwrap(), ModernBertSize::Base);
        assert_eq!("LARGE".parse::<ModernBertSize>().unwrap(), ModernBertSize::Large);
        assert!("huge".parse::<ModernBertSize>().is_err());
    }

    #[test]
    fn display_matches_model_name() {
        assert_eq!(ModernBertSize::Base.to_string(), "modernbert-base");
        assert_eq!(ModernBertSize::Large.to_string(), "modernbert-large");
    }
}
