//! Sentiment analysis for public-consultation comments.
//!
//! A pretrained three-class classifier (ModernBERT via [Candle](https://github.com/huggingface/candle))
//! labels each comment Negative, Neutral or Positive. Keyword lexicons then
//! refine that label: Neutral comments are split by which way their keywords
//! lean, and low-confidence Positive/Negative verdicts contradicted by the
//! keywords become a Neutral variant.
//!
//! ```rust,no_run
//! use consultation_sentiment::batch::BatchAnalyzer;
//! use consultation_sentiment::comments::Comment;
//! use consultation_sentiment::lexicon::{Lexicon, LexiconPaths};
//! use consultation_sentiment::refine::Refiner;
//! use consultation_sentiment::sentiment::{ModernBertSize, SentimentAnalysisPipelineBuilder};
//!
//! # fn main() -> consultation_sentiment::error::Result<()> {
//! let lexicon = Lexicon::load(&LexiconPaths {
//!     positive: Some("lexicon/positive.csv".into()),
//!     negative: Some("lexicon/negative.csv".into()),
//!     neutral: Some("lexicon/neutral.csv".into()),
//! });
//! let pipeline = SentimentAnalysisPipelineBuilder::modernbert(ModernBertSize::Base).build()?;
//! let analyzer = BatchAnalyzer::new(pipeline, Refiner::new(lexicon));
//!
//! let output = analyzer.analyze_batch([
//!     Comment::new("The consultation period was far too short").with_author("R. Patel"),
//! ])?;
//! for r in &output.results {
//!     println!("{} / {} ({:.3})", r.sentiment_main, r.sentiment_sub, r.score);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

// ============ Internal API ============

pub(crate) mod loaders;
pub(crate) mod models;
pub(crate) mod pipelines;

// ============ Public API ============

pub mod batch;
pub mod classifier;
pub mod comments;
pub mod config;
pub mod error;
pub mod export;
pub mod lexicon;
pub mod refine;

pub use pipelines::sentiment;
