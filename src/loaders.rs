use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Repo, RepoType};
use serde::Deserialize;
use tokenizers::{Tokenizer, TruncationParams};

use crate::error::{Result, SentimentError};

#[derive(Debug, Clone)]
pub struct HfLoader {
    pub repo: String,
    pub filename: String,
}

impl HfLoader {
    pub fn new(repo: &str, filename: &str) -> Self {
        Self {
            repo: repo.into(),
            filename: filename.into(),
        }
    }

    pub fn load(&self) -> Result<PathBuf> {
        let hf_api = ApiBuilder::new().build().map_err(|e| {
            SentimentError::Download(format!("Failed to initialize HuggingFace API: {e}"))
        })?;
        let hf_repo = hf_api.repo(Repo::new(self.repo.clone(), RepoType::Model));

        let max_retries = 3;
        let mut attempts = 0u32;

        for attempt in 0..max_retries {
            match hf_repo.get(self.filename.as_str()) {
                Ok(path) => return Ok(path),
                Err(e) => {
                    let error_msg = e.to_string();
                    attempts = attempt + 1;
                    if error_msg.contains("Lock acquisition failed") && attempt < max_retries - 1 {
                        let wait_time = Duration::from_millis(100 * (1 << attempt));
                        tracing::debug!(
                            file = %self.filename,
                            repo = %self.repo,
                            "hub cache locked, retrying in {wait_time:?}"
                        );
                        std::thread::sleep(wait_time);
                        continue;
                    }
                    return Err(SentimentError::Download(format!(
                        "Failed to download '{}' from '{}': {}",
                        self.filename, self.repo, error_msg
                    )));
                }
            }
        }

        Err(SentimentError::Download(format!(
            "Download timed out for '{}' from '{}' after {} attempt(s)",
            self.filename, self.repo, attempts
        )))
    }
}

/// Loads `tokenizer.json` and caps encodings at `max_length` tokens.
#[derive(Clone)]
pub struct TokenizerLoader {
    pub tokenizer_file_loader: HfLoader,
    pub max_length: usize,
}

impl TokenizerLoader {
    pub fn new(repo: &str, max_length: usize) -> Self {
        Self {
            tokenizer_file_loader: HfLoader::new(repo, "tokenizer.json"),
            max_length,
        }
    }

    pub fn load(&self) -> Result<Tokenizer> {
        let tokenizer_file_path = self.tokenizer_file_loader.load()?;
        let path_str = tokenizer_file_path.display().to_string();

        let mut tokenizer = Tokenizer::from_file(&tokenizer_file_path).map_err(|e| {
            SentimentError::Tokenization(format!(
                "Failed to load tokenizer from '{}': {}",
                path_str, e
            ))
        })?;

        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: self.max_length,
                ..Default::default()
            }))
            .map_err(|e| {
                SentimentError::Tokenization(format!(
                    "Failed to enable truncation at {} tokens: {}",
                    self.max_length, e
                ))
            })?;

        Ok(tokenizer)
    }
}

#[derive(Deserialize)]
struct ClassifierConfigJson {
    #[serde(default)]
    id2label: HashMap<String, String>,
    #[serde(default)]
    label2id: HashMap<String, u32>,
}

/// A sequence-classification checkpoint: parsed config, weights and label map.
pub struct ClassifierCheckpoint<C> {
    pub config: C,
    pub weights: VarBuilder<'static>,
    pub id2label: HashMap<String, String>,
}

/// Loads `config.json` plus `model.safetensors` (or `pytorch_model.bin`).
#[derive(Debug, Clone)]
pub struct ClassifierLoader {
    pub repo: String,
}

impl ClassifierLoader {
    pub fn new(repo: &str) -> Self {
        Self { repo: repo.into() }
    }

    pub fn load<C>(&self, device: &Device) -> Result<ClassifierCheckpoint<C>>
    where
        C: for<'de> Deserialize<'de>,
    {
        let config_path = HfLoader::new(&self.repo, "config.json").load()?;
        let weights_path = HfLoader::new(&self.repo, "model.safetensors")
            .load()
            .or_else(|_| HfLoader::new(&self.repo, "pytorch_model.bin").load())?;

        let config_str = std::fs::read_to_string(&config_path)?;
        let config: C = serde_json::from_str(&config_str)?;
        let labels: ClassifierConfigJson = serde_json::from_str(&config_str)?;

        let id2label = if labels.id2label.is_empty() {
            labels
                .label2id
                .into_iter()
                .map(|(label, id)| (id.to_string(), label))
                .collect()
        } else {
            labels.id2label
        };

        let weights = if weights_path.extension().is_some_and(|e| e == "safetensors") {
            // SAFETY: the file is owned by the hub cache and not mutated while mapped.
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)? }
        } else {
            VarBuilder::from_pth(&weights_path, DType::F32, device)?
        };

        Ok(ClassifierCheckpoint {
            config,
            weights,
            id2label,
        })
    }
}
