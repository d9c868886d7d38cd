use super::model::{SentimentAnalysisModel, SentimentResult};
use crate::classifier::{Classification, Classifier};
use crate::error::{Result, SentimentError};
use crate::pipelines::stats::PipelineStats;
use tokenizers::Tokenizer;

// ============ Output types ============

/// Single-text output from `run()`.
#[derive(Debug)]
pub struct Output {
    /// Sentiment prediction.
    pub prediction: Classification,
    /// Execution statistics.
    pub stats: PipelineStats,
}

/// Single result in batch output.
#[derive(Debug)]
pub struct BatchResult {
    /// Input text.
    pub text: String,
    /// Prediction or error for this input.
    pub prediction: Result<Classification>,
}

/// Batch output from `run()`.
#[derive(Debug)]
pub struct BatchOutput {
    /// Results for each input.
    pub results: Vec<BatchResult>,
    /// Execution statistics.
    pub stats: PipelineStats,
}

// ============ Input trait for type-based dispatch ============

#[doc(hidden)]
pub trait SentimentInput<'a> {
    /// Output type for `.run()`.
    type Output;

    #[doc(hidden)]
    fn into_texts(self) -> Vec<&'a str>;
    #[doc(hidden)]
    fn convert_output(
        texts: Vec<&'a str>,
        predictions: Vec<Result<Classification>>,
        stats: PipelineStats,
    ) -> Result<Self::Output>;
}

impl<'a> SentimentInput<'a> for &'a str {
    type Output = Output;

    fn into_texts(self) -> Vec<&'a str> {
        vec![self]
    }

    fn convert_output(
        _texts: Vec<&'a str>,
        mut predictions: Vec<Result<Classification>>,
        stats: PipelineStats,
    ) -> Result<Self::Output> {
        let prediction = predictions
            .pop()
            .ok_or_else(|| SentimentError::Unexpected("No predictions returned".into()))??;
        Ok(Output { prediction, stats })
    }
}

fn zip_batch<'a>(
    texts: Vec<&'a str>,
    predictions: Vec<Result<Classification>>,
    stats: PipelineStats,
) -> BatchOutput {
    let results = texts
        .into_iter()
        .zip(predictions)
        .map(|(text, prediction)| BatchResult {
            text: text.to_string(),
            prediction,
        })
        .collect();
    BatchOutput { results, stats }
}

impl<'a> SentimentInput<'a> for &'a [&'a str] {
    type Output = BatchOutput;

    fn into_texts(self) -> Vec<&'a str> {
        self.to_vec()
    }

    fn convert_output(
        texts: Vec<&'a str>,
        predictions: Vec<Result<Classification>>,
        stats: PipelineStats,
    ) -> Result<Self::Output> {
        Ok(zip_batch(texts, predictions, stats))
    }
}

impl<'a, const N: usize> SentimentInput<'a> for &'a [&'a str; N] {
    type Output = BatchOutput;

    fn into_texts(self) -> Vec<&'a str> {
        self.as_slice().to_vec()
    }

    fn convert_output(
        texts: Vec<&'a str>,
        predictions: Vec<Result<Classification>>,
        stats: PipelineStats,
    ) -> Result<Self::Output> {
        Ok(zip_batch(texts, predictions, stats))
    }
}

// ============ Pipeline ============

/// Classifies text sentiment as Negative, Neutral or Positive.
///
/// Construct with [`SentimentAnalysisPipelineBuilder`](super::SentimentAnalysisPipelineBuilder).
/// The pipeline implements [`Classifier`], so it plugs straight into a
/// [`BatchAnalyzer`](crate::batch::BatchAnalyzer).
///
/// # Examples
///
/// ```rust,no_run
/// # use consultation_sentiment::sentiment::{SentimentAnalysisPipelineBuilder, ModernBertSize};
/// # fn main() -> consultation_sentiment::error::Result<()> {
/// let pipeline = SentimentAnalysisPipelineBuilder::modernbert(ModernBertSize::Base).build()?;
///
/// // Single text - direct access
/// let output = pipeline.run("I support this proposal")?;
/// println!("{}: {:.2}", output.prediction.label, output.prediction.confidence);
///
/// // Batch - results include input text
/// let output = pipeline.run(&["Great idea!", "This is a scam."])?;
/// for r in output.results {
///     println!("{} → {}", r.text, r.prediction?.label);
/// }
/// # Ok(())
/// # }
/// ```
pub struct SentimentAnalysisPipeline<M: SentimentAnalysisModel> {
    pub(crate) model: M,
    pub(crate) tokenizer: Tokenizer,
}

impl<M: SentimentAnalysisModel> SentimentAnalysisPipeline<M> {
    /// Analyze text sentiment.
    ///
    /// Single input → [`Output`], batch → [`BatchOutput`].
    pub fn run<'a, I: SentimentInput<'a>>(&self, input: I) -> Result<I::Output> {
        let stats_builder = PipelineStats::start();
        let texts = input.into_texts();
        let item_count = texts.len();

        let predictions = self.predict(&texts)?;
        let failed = predictions.iter().filter(|p| p.is_err()).count();

        I::convert_output(texts, predictions, stats_builder.finish(item_count, failed))
    }

    /// Returns the device (CPU/GPU) the model is running on.
    pub fn device(&self) -> &candle_core::Device {
        self.model.device()
    }

    fn predict(&self, texts: &[&str]) -> Result<Vec<Result<Classification>>> {
        let results = self
            .model
            .predict_with_score_batch(&self.tokenizer, texts)?;

        Ok(results
            .into_iter()
            .map(|result| result.and_then(into_classification))
            .collect())
    }
}

fn into_classification(raw: SentimentResult) -> Result<Classification> {
    // softmax can overshoot 1.0 by an ulp
    Classification::from_raw(&raw.label, raw.score.min(1.0))
}

impl<M: SentimentAnalysisModel> Classifier for SentimentAnalysisPipeline<M> {
    fn classify(&self, text: &str) -> Result<Classification> {
        self.model
            .predict_with_score(&self.tokenizer, text)
            .and_then(into_classification)
    }

    fn classify_batch(&self, texts: &[&str]) -> Result<Vec<Result<Classification>>> {
        self.predict(texts)
    }
}
