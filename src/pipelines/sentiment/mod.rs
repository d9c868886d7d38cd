//! Sentiment analysis pipeline.
//!
//! Classify text as Negative, Neutral or Positive with a confidence score.
//! This is the base classifier the refinement engine builds on.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use consultation_sentiment::sentiment::{SentimentAnalysisPipelineBuilder, ModernBertSize};
//!
//! # fn main() -> consultation_sentiment::error::Result<()> {
//! let pipeline = SentimentAnalysisPipelineBuilder::modernbert(ModernBertSize::Base).build()?;
//!
//! let output = pipeline.run("The new cycle lanes are a great idea")?;
//! println!(
//!     "sentiment: {} (confidence: {:.2})",
//!     output.prediction.label, output.prediction.confidence
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Supported Models
//!
//! | Model | Sizes | Builder Method |
//! |-------|-------|----------------|
//! | ModernBERT (multilingual sentiment) | `Base`, `Large` | [`SentimentAnalysisPipelineBuilder::modernbert`] |

// ============ Internal API ============

pub(crate) mod builder;
pub(crate) mod model;
pub(crate) mod pipeline;

// ============ Public API ============

pub use crate::models::ModernBertSize;
pub use crate::pipelines::stats::PipelineStats;
pub use crate::pipelines::utils::DeviceRequest;
pub use builder::{SentimentAnalysisPipelineBuilder, DEFAULT_MAX_LENGTH};
pub use pipeline::{BatchOutput, BatchResult, Output, SentimentAnalysisPipeline};

#[doc(hidden)]
pub use pipeline::SentimentInput;

/// Only for generic annotations. Use [`SentimentAnalysisPipelineBuilder::modernbert`].
pub type SentimentModernBert = crate::models::modernbert::SentimentModernBertModel;
