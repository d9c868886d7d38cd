//! Analyzer configuration file.
//!
//! Every section and field is optional:
//!
//! ```toml
//! [lexicon]
//! positive = "lexicon/positive.csv"
//! negative = "lexicon/negative.csv"
//! neutral = "lexicon/neutral.csv"
//!
//! [refinement]
//! neutral_short_circuit = false
//!
//! [batch]
//! failure_policy = "skip"
//! concurrency = 4
//! item_timeout_secs = 30
//!
//! [model]
//! size = "base"
//! device = "cpu"
//! max_length = 512
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::batch::{BatchOptions, FailurePolicy};
use crate::error::{Result, SentimentError};
use crate::lexicon::LexiconPaths;
use crate::models::ModernBertSize;
use crate::pipelines::sentiment::DEFAULT_MAX_LENGTH;
use crate::pipelines::utils::DeviceRequest;
use crate::refine::RefinementPolicy;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Keyword list locations.
    pub lexicon: LexiconPaths,
    /// Refinement rule knobs.
    pub refinement: RefinementPolicy,
    /// Batch execution.
    pub batch: BatchConfig,
    /// Base classifier.
    pub model: ModelConfig,
}

/// `[batch]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// `"abort"` or `"skip"`.
    pub failure_policy: FailurePolicy,
    /// Classifier calls in flight.
    pub concurrency: usize,
    /// Per-comment timeout; unset means none.
    pub item_timeout_secs: Option<f64>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Abort,
            concurrency: 1,
            item_timeout_secs: None,
        }
    }
}

/// `[model]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// `"base"` or `"large"`.
    pub size: ModernBertSize,
    /// `"cpu"`, `"cuda"` or `"cuda:N"`.
    pub device: String,
    /// Token budget per comment.
    pub max_length: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            size: ModernBertSize::Base,
            device: "cpu".to_string(),
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

impl ModelConfig {
    /// Parses the device string.
    pub fn device_request(&self) -> Result<DeviceRequest> {
        self.device.parse()
    }
}

impl AnalyzerConfig {
    /// Reads a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SentimentError::Config(format!(
                "failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        let config = Self::from_toml(&content)?;
        tracing::info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Parses TOML text and validates it.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.batch.concurrency == 0 {
            return Err(SentimentError::Config(
                "batch.concurrency must be at least 1".to_string(),
            ));
        }
        if let Some(secs) = self.batch.item_timeout_secs {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(SentimentError::Config(format!(
                    "batch.item_timeout_secs must be positive, got {secs}"
                )));
            }
            Duration::try_from_secs_f64(secs).map_err(|e| {
                SentimentError::Config(format!("batch.item_timeout_secs {secs} is out of range: {e}"))
            })?;
        }
        if self.model.max_length == 0 {
            return Err(SentimentError::Config(
                "model.max_length must be at least 1".to_string(),
            ));
        }
        self.model.device_request()?;
        Ok(())
    }

    /// Batch options derived from `[batch]`. Out-of-range timeouts, which
    /// [`validate`](Self::validate) rejects, fall back to no timeout.
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            failure_policy: self.batch.failure_policy,
            concurrency: self.batch.concurrency,
            item_timeout: self
                .batch
                .item_timeout_secs
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok()),
        }
    }

    /// Applies command-line overrides on top of file values, then validates.
    pub fn apply(&mut self, overrides: &ConfigOverrides) -> Result<()> {
        if overrides.positive.is_some() {
            self.lexicon.positive = overrides.positive.clone();
        }
        if overrides.negative.is_some() {
            self.lexicon.negative = overrides.negative.clone();
        }
        if overrides.neutral.is_some() {
            self.lexicon.neutral = overrides.neutral.clone();
        }
        if overrides.neutral_short_circuit {
            self.refinement.neutral_short_circuit = true;
        }
        if overrides.skip_failed {
            self.batch.failure_policy = FailurePolicy::Skip;
        }
        if let Some(n) = overrides.concurrency {
            self.batch.concurrency = n;
        }
        if overrides.item_timeout_secs.is_some() {
            self.batch.item_timeout_secs = overrides.item_timeout_secs;
        }
        if let Some(device) = &overrides.device {
            self.model.device = device.clone();
        }
        self.validate()
    }
}

/// Values given on the command line. Unset fields keep the file's value;
/// flags can only switch a setting on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    /// Positive keyword list.
    pub positive: Option<PathBuf>,
    /// Negative keyword list.
    pub negative: Option<PathBuf>,
    /// Neutral keyword list.
    pub neutral: Option<PathBuf>,
    /// Turns on the neutral short-circuit.
    pub neutral_short_circuit: bool,
    /// Switches the failure policy to skip.
    pub skip_failed: bool,
    /// Classifier calls in flight.
    pub concurrency: Option<usize>,
    /// Per-comment timeout in seconds.
    pub item_timeout_secs: Option<f64>,
    /// Device string.
    pub device: Option<String>,
}
