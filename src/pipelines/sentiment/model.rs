use crate::error::Result;
use tokenizers::Tokenizer;

/// Raw model output: the checkpoint's own label string and its probability.
#[derive(Debug, Clone)]
pub struct SentimentResult {
    pub label: String,
    pub score: f32,
}

pub trait SentimentAnalysisModel {
    type Options: std::fmt::Debug + Clone;

    fn new(options: Self::Options, device: candle_core::Device) -> Result<Self>
    where
        Self: Sized;

    fn predict_with_score(&self, tokenizer: &Tokenizer, text: &str) -> Result<SentimentResult>;

    fn predict_with_score_batch(
        &self,
        tokenizer: &Tokenizer,
        texts: &[&str],
    ) -> Result<Vec<Result<SentimentResult>>> {
        Ok(texts
            .iter()
            .map(|text| self.predict_with_score(tokenizer, text))
            .collect())
    }

    fn get_tokenizer(options: Self::Options, max_length: usize) -> Result<Tokenizer>;

    fn device(&self) -> &candle_core::Device;
}
