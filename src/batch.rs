//! Batch analysis of comments.
//!
//! [`BatchAnalyzer`] classifies every comment with a [`Classifier`], refines the
//! label with a [`Refiner`], and fills in author and date defaults. Output order
//! always matches input order.
//!
//! Three entry points:
//! - [`BatchAnalyzer::analyze_batch`]: sequential, fully materialized.
//! - [`BatchAnalyzer::analyze_iter`]: sequential, lazy.
//! - [`BatchAnalyzer::analyze_batch_concurrent`]: a bounded number of classifier
//!   calls in flight on Tokio's blocking pool, each with an optional timeout.
//!
//! What happens when one comment fails is set by [`FailurePolicy`].
//!
//! ```rust
//! use consultation_sentiment::batch::BatchAnalyzer;
//! use consultation_sentiment::classifier::{Classification, Classifier, Sentiment};
//! use consultation_sentiment::comments::Comment;
//! use consultation_sentiment::error::Result;
//! use consultation_sentiment::lexicon::Lexicon;
//! use consultation_sentiment::refine::{RefinedSentiment, Refiner};
//!
//! struct Stub;
//! impl Classifier for Stub {
//!     fn classify(&self, _text: &str) -> Result<Classification> {
//!         Classification::new(Sentiment::Negative, 0.99)
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let lexicon = Lexicon::from_terms(Vec::<&str>::new(), ["scam"], Vec::<&str>::new());
//! let analyzer = BatchAnalyzer::new(Stub, Refiner::new(lexicon));
//!
//! let output = analyzer.analyze_batch([Comment::new("This scheme is a total scam").with_author("A")])?;
//! assert_eq!(output.results[0].sentiment_sub, RefinedSentiment::Negative);
//! assert_eq!(output.results[0].author, "A");
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::classifier::{Classification, Classifier, Sentiment};
use crate::comments::{Comment, CommentInput};
use crate::error::{Result, SentimentError};
use crate::pipelines::stats::{PipelineStats, PipelineStatsBuilder};
use crate::refine::{RefinedSentiment, Refiner};

/// What to do when a single comment cannot be analyzed.
///
/// Only failures specific to one comment (see [`SentimentError::is_per_item`])
/// can be skipped; anything else aborts the batch under either policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first failure and return it.
    #[default]
    Abort,
    /// Record the failure and keep going.
    Skip,
}

/// Batch execution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Failure handling.
    pub failure_policy: FailurePolicy,
    /// Maximum classifier calls in flight for [`BatchAnalyzer::analyze_batch_concurrent`].
    pub concurrency: usize,
    /// Per-comment classifier timeout for [`BatchAnalyzer::analyze_batch_concurrent`].
    pub item_timeout: Option<Duration>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Abort,
            concurrency: 1,
            item_timeout: None,
        }
    }
}

/// One analyzed comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinedResult {
    /// The comment text.
    pub text: String,
    /// The classifier's label, unchanged.
    pub sentiment_main: Sentiment,
    /// The refined label.
    pub sentiment_sub: RefinedSentiment,
    /// Classifier confidence, rounded to three decimals.
    pub score: f64,
    /// Author, or `"Anonymous"`.
    pub author: String,
    /// Comment date, or the date of the analysis run.
    pub date: NaiveDate,
}

/// A comment that could not be analyzed under [`FailurePolicy::Skip`].
#[derive(Debug)]
pub struct ItemFailure {
    /// Position in the input.
    pub index: usize,
    /// The comment text.
    pub text: String,
    /// Why it failed.
    pub error: SentimentError,
}

/// Result of a batch run.
#[derive(Debug)]
pub struct BatchOutput {
    /// Analyzed comments in input order (failed ones omitted).
    pub results: Vec<RefinedResult>,
    /// Skipped comments in input order. Always empty under [`FailurePolicy::Abort`].
    pub failures: Vec<ItemFailure>,
    /// Execution statistics.
    pub stats: PipelineStats,
}

/// Classifies and refines batches of comments.
pub struct BatchAnalyzer<C: ?Sized> {
    classifier: Arc<C>,
    refiner: Arc<Refiner>,
    options: BatchOptions,
}

impl<C: Classifier> BatchAnalyzer<C> {
    /// Creates an analyzer with default options.
    pub fn new(classifier: C, refiner: Refiner) -> Self {
        Self::from_shared(Arc::new(classifier), Arc::new(refiner))
    }
}

impl<C: Classifier + ?Sized> BatchAnalyzer<C> {
    /// Creates an analyzer around already shared components.
    pub fn from_shared(classifier: Arc<C>, refiner: Arc<Refiner>) -> Self {
        Self {
            classifier,
            refiner,
            options: BatchOptions::default(),
        }
    }

    /// Replaces the options.
    pub fn with_options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Analyzes every comment in order.
    ///
    /// # Errors
    ///
    /// Under [`FailurePolicy::Abort`], the first failing comment's error wrapped
    /// in [`SentimentError::ItemFailed`].
    pub fn analyze_batch<I>(&self, comments: I) -> Result<BatchOutput>
    where
        I: IntoIterator,
        I::Item: Into<CommentInput>,
    {
        let stats = PipelineStats::start();
        let today = today();
        let mut collector = Collector::new(self.options.failure_policy);

        for (index, input) in comments.into_iter().enumerate() {
            let comment = input.into().into_comment();
            let text = comment.text.clone();
            let outcome = self.analyze_one(comment, today);
            collector.push(index, text, outcome)?;
        }

        Ok(collector.finish(stats))
    }

    /// Lazily analyzes comments one at a time. Each failure is yielded as
    /// [`SentimentError::ItemFailed`]; iteration may continue past it.
    pub fn analyze_iter<'a, I>(
        &'a self,
        comments: I,
    ) -> impl Iterator<Item = Result<RefinedResult>> + 'a
    where
        I: IntoIterator + 'a,
        I::IntoIter: 'a,
        I::Item: Into<CommentInput>,
    {
        let today = today();
        comments.into_iter().enumerate().map(move |(index, input)| {
            self.analyze_one(input.into().into_comment(), today)
                .map_err(|e| item_failed(index, e))
        })
    }

    fn analyze_one(&self, comment: Comment, today: NaiveDate) -> Result<RefinedResult> {
        let classification = self.classifier.classify(&comment.text)?;
        assemble(&self.refiner, comment, classification, today)
    }
}

impl<C: Classifier + Send + Sync + ?Sized + 'static> BatchAnalyzer<C> {
    /// Analyzes comments with up to `concurrency` classifier calls in flight.
    ///
    /// Results come back in input order. With an `item_timeout`, a classifier
    /// call that takes longer fails with [`SentimentError::ClassifierTimeout`];
    /// the blocking call itself cannot be interrupted and finishes in the
    /// background.
    ///
    /// # Errors
    ///
    /// Same as [`analyze_batch`](Self::analyze_batch).
    pub async fn analyze_batch_concurrent<I>(&self, comments: I) -> Result<BatchOutput>
    where
        I: IntoIterator,
        I::Item: Into<CommentInput>,
    {
        let stats = PipelineStats::start();
        let today = today();
        let timeout = self.options.item_timeout;
        let concurrency = self.options.concurrency.max(1);
        let mut collector = Collector::new(self.options.failure_policy);

        let comments: Vec<Comment> = comments
            .into_iter()
            .map(|input| input.into().into_comment())
            .collect();
        tracing::debug!(count = comments.len(), concurrency, "starting concurrent batch");

        let outcomes = stream::iter(comments.into_iter().map(|comment| {
            let classifier = Arc::clone(&self.classifier);
            let refiner = Arc::clone(&self.refiner);
            let text = comment.text.clone();
            async move {
                let outcome = classify_blocking(classifier, comment.text.clone(), timeout)
                    .await
                    .and_then(|c| assemble(&refiner, comment, c, today));
                (text, outcome)
            }
        }))
        .buffered(concurrency)
        .enumerate();
        futures::pin_mut!(outcomes);

        while let Some((index, (text, outcome))) = outcomes.next().await {
            collector.push(index, text, outcome)?;
        }

        Ok(collector.finish(stats))
    }
}

async fn classify_blocking<C: Classifier + Send + Sync + ?Sized + 'static>(
    classifier: Arc<C>,
    text: String,
    timeout: Option<Duration>,
) -> Result<Classification> {
    let task = tokio::task::spawn_blocking(move || classifier.classify(&text));

    let joined = match timeout {
        Some(limit) => tokio::time::timeout(limit, task).await.map_err(|_| {
            SentimentError::ClassifierTimeout {
                timeout_ms: limit.as_millis(),
            }
        })?,
        None => task.await,
    };

    joined.map_err(|e| SentimentError::Classifier(format!("classifier task failed: {e}")))?
}

fn assemble(
    refiner: &Refiner,
    comment: Comment,
    classification: Classification,
    today: NaiveDate,
) -> Result<RefinedResult> {
    let (main, sub) = refiner.refine(
        &comment.text,
        classification.label,
        classification.confidence,
    )?;
    let author = comment.author_or_default().to_string();

    Ok(RefinedResult {
        text: comment.text,
        sentiment_main: main,
        sentiment_sub: sub,
        score: round3(classification.confidence),
        author,
        date: comment.date.unwrap_or(today),
    })
}

fn round3(score: f32) -> f64 {
    (f64::from(score) * 1000.0).round() / 1000.0
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn item_failed(index: usize, error: SentimentError) -> SentimentError {
    SentimentError::ItemFailed {
        index,
        source: Box::new(error),
    }
}

/// Applies the failure policy to per-item outcomes arriving in input order.
struct Collector {
    policy: FailurePolicy,
    results: Vec<RefinedResult>,
    failures: Vec<ItemFailure>,
}

impl Collector {
    fn new(policy: FailurePolicy) -> Self {
        Self {
            policy,
            results: Vec::new(),
            failures: Vec::new(),
        }
    }

    fn push(&mut self, index: usize, text: String, outcome: Result<RefinedResult>) -> Result<()> {
        match outcome {
            Ok(result) => {
                tracing::debug!(index, main = %result.sentiment_main, sub = %result.sentiment_sub, "comment analyzed");
                self.results.push(result);
                Ok(())
            }
            Err(error) => match self.policy {
                FailurePolicy::Skip if !error.is_per_item() => {
                    tracing::error!(index, "aborting batch, failure is not specific to this comment: {error}");
                    Err(item_failed(index, error))
                }
                FailurePolicy::Abort => {
                    tracing::error!(index, "aborting batch: {error}");
                    Err(item_failed(index, error))
                }
                FailurePolicy::Skip => {
                    tracing::warn!(index, "skipping comment: {error}");
                    self.failures.push(ItemFailure { index, text, error });
                    Ok(())
                }
            },
        }
    }

    fn finish(self, stats: PipelineStatsBuilder) -> BatchOutput {
        let processed = self.results.len() + self.failures.len();
        let stats = stats.finish(processed, self.failures.len());
        tracing::info!(
            analyzed = self.results.len(),
            failed = self.failures.len(),
            elapsed_ms = stats.total_time.as_millis() as u64,
            "batch complete"
        );
        BatchOutput {
            results: self.results,
            failures: self.failures,
            stats,
        }
    }
}
