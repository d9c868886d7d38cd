use super::model::SentimentAnalysisModel;
use super::pipeline::SentimentAnalysisPipeline;
use crate::error::{Result, SentimentError};
use crate::pipelines::utils::DeviceRequest;

crate::pipelines::utils::impl_device_methods!(SentimentAnalysisPipelineBuilder<M: SentimentAnalysisModel>);

/// Default token budget per comment; longer text is truncated.
pub const DEFAULT_MAX_LENGTH: usize = 512;

/// Builder for creating [`SentimentAnalysisPipeline`] instances.
///
/// Use [`Self::modernbert`] as the entry point.
///
/// # Examples
///
/// ```rust,no_run
/// # use consultation_sentiment::sentiment::{SentimentAnalysisPipelineBuilder, ModernBertSize};
/// # fn main() -> consultation_sentiment::error::Result<()> {
/// let pipeline = SentimentAnalysisPipelineBuilder::modernbert(ModernBertSize::Base)
///     .cuda(0)
///     .max_length(256)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct SentimentAnalysisPipelineBuilder<M: SentimentAnalysisModel> {
    options: M::Options,
    device_request: DeviceRequest,
    max_length: usize,
}

impl<M: SentimentAnalysisModel> SentimentAnalysisPipelineBuilder<M> {
    pub(crate) fn new(options: M::Options) -> Self {
        Self {
            options,
            device_request: DeviceRequest::Cpu,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }

    /// Truncate inputs to at most `max_length` tokens.
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Builds the pipeline with configured settings.
    ///
    /// # Errors
    ///
    /// Returns an error if model loading or device initialization fails.
    pub fn build(self) -> Result<SentimentAnalysisPipeline<M>> {
        if self.max_length == 0 {
            return Err(SentimentError::Config(
                "max_length must be at least 1".to_string(),
            ));
        }

        let device = self.device_request.resolve()?;
        let model = M::new(self.options.clone(), device)?;
        let tokenizer = M::get_tokenizer(self.options, self.max_length)?;

        Ok(SentimentAnalysisPipeline { model, tokenizer })
    }
}

impl SentimentAnalysisPipelineBuilder<super::SentimentModernBert> {
    /// Creates a builder for a ModernBERT sentiment analysis model.
    pub fn modernbert(size: crate::models::ModernBertSize) -> Self {
        Self::new(size)
    }
}
