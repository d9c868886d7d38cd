//! Base classifier capability.
//!
//! The refinement engine only needs a label from the three-way taxonomy and a
//! confidence score. Anything that can produce one implements [`Classifier`]:
//! the ModernBERT [`SentimentAnalysisPipeline`](crate::sentiment::SentimentAnalysisPipeline),
//! or a deterministic stub in tests.
//!
//! ```rust
//! use consultation_sentiment::classifier::{Classification, Classifier, Sentiment};
//! use consultation_sentiment::error::Result;
//!
//! struct AlwaysNeutral;
//!
//! impl Classifier for AlwaysNeutral {
//!     fn classify(&self, _text: &str) -> Result<Classification> {
//!         Classification::new(Sentiment::Neutral, 0.5)
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let c = AlwaysNeutral.classify("anything")?;
//! assert_eq!(c.label, Sentiment::Neutral);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SentimentError};

/// Base sentiment label produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sentiment {
    /// Negative sentiment.
    Negative,
    /// Neither clearly positive nor clearly negative.
    Neutral,
    /// Positive sentiment.
    Positive,
}

impl Sentiment {
    /// All labels in taxonomy order.
    pub const ALL: [Sentiment; 3] = [Sentiment::Negative, Sentiment::Neutral, Sentiment::Positive];

    /// Display name (`"Negative"`, `"Neutral"`, `"Positive"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
            Sentiment::Positive => "Positive",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a model label case-insensitively. `"POSITIVE"`, `"positive"` and
/// `"Positive"` all map to [`Sentiment::Positive`]; anything else is
/// [`SentimentError::InvalidLabel`].
impl FromStr for Sentiment {
    type Err = SentimentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            "positive" => Ok(Sentiment::Positive),
            _ => Err(SentimentError::InvalidLabel(s.to_string())),
        }
    }
}

/// Output of a [`Classifier`]: a base label and its confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// Predicted label.
    pub label: Sentiment,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
}

impl Classification {
    /// Builds a classification, rejecting confidences outside `[0, 1]`.
    pub fn new(label: Sentiment, confidence: f32) -> Result<Self> {
        check_confidence(confidence)?;
        Ok(Self { label, confidence })
    }

    /// Builds a classification from a raw model label.
    pub fn from_raw(label: &str, confidence: f32) -> Result<Self> {
        Self::new(label.parse()?, confidence)
    }
}

pub(crate) fn check_confidence(confidence: f32) -> Result<()> {
    if (0.0..=1.0).contains(&confidence) {
        Ok(())
    } else {
        Err(SentimentError::InvalidScore(confidence))
    }
}

/// A text classifier over the Negative/Neutral/Positive taxonomy.
///
/// Implementations own their truncation policy: `classify` must accept text of
/// any length.
pub trait Classifier {
    /// Classifies a single text.
    fn classify(&self, text: &str) -> Result<Classification>;

    /// Classifies several texts. The outer error is for failures that affect the
    /// whole call, the inner ones are per text.
    fn classify_batch(&self, texts: &[&str]) -> Result<Vec<Result<Classification>>> {
        Ok(texts.iter().map(|text| self.classify(text)).collect())
    }
}

impl<C: Classifier + ?Sized> Classifier for Arc<C> {
    fn classify(&self, text: &str) -> Result<Classification> {
        (**self).classify(text)
    }

    fn classify_batch(&self, texts: &[&str]) -> Result<Vec<Result<Classification>>> {
        (**self).classify_batch(texts)
    }
}

impl<C: Classifier + ?Sized> Classifier for &C {
    fn classify(&self, text: &str) -> Result<Classification> {
        (**self).classify(text)
    }

    fn classify_batch(&self, texts: &[&str]) -> Result<Vec<Result<Classification>>> {
        (**self).classify_batch(texts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_case_insensitively() {
        assert_eq!("POSITIVE".parse::<Sentiment>().unwrap(), Sentiment::Positive);
        assert_eq!("negative".parse::<Sentiment>().unwrap(), Sentiment::Negative);
        assert_eq!(" Neutral ".parse::<Sentiment>().unwrap(), Sentiment::Neutral);
    }

    #[test]
    fn rejects_unknown_label() {
        let err = "mixed".parse::<Sentiment>().unwrap_err();
        assert!(matches!(err, SentimentError::InvalidLabel(l) if l == "mixed"));
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        assert!(matches!(
            Classification::new(Sentiment::Positive, 1.2),
            Err(SentimentError::InvalidScore(_))
        ));
        assert!(matches!(
            Classification::new(Sentiment::Positive, f32::NAN),
            Err(SentimentError::InvalidScore(_))
        ));
        assert!(Classification::new(Sentiment::Positive, 0.0).is_ok());
        assert!(Classification::new(Sentiment::Positive, 1.0).is_ok());
    }
}
