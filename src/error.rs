//! Error types for this crate.
//!
//! All fallible operations return [`Result<T>`] which uses [`SentimentError`] as the error type.

use thiserror::Error;

/// A [`Result`](std::result::Result) alias using [`SentimentError`] as the error type.
pub type Result<T> = std::result::Result<T, SentimentError>;

/// The unified error type for all crate errors.
///
/// # Example
///
/// ```rust,no_run
/// use consultation_sentiment::error::SentimentError;
///
/// fn handle_error(e: SentimentError) {
///     match &e {
///         SentimentError::InvalidLabel(_) | SentimentError::InvalidScore(_) => {
///             // Broken upstream contract - fix the caller
///         }
///         SentimentError::Classifier(_) | SentimentError::ClassifierTimeout { .. } => {
///             // Model failed on this comment - retry or skip it
///         }
///         SentimentError::Download(_) => {
///             // Network issue - retry with backoff
///         }
///         _ => {
///             eprintln!("Error: {e}");
///         }
///     }
/// }
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SentimentError {
    /// A base label outside the Negative/Neutral/Positive taxonomy.
    #[error("invalid sentiment label '{0}': expected Negative, Neutral or Positive")]
    InvalidLabel(String),

    /// A confidence score outside `[0, 1]` (or NaN).
    #[error("invalid confidence score {0}: expected a value in [0, 1]")]
    InvalidScore(f32),

    /// A keyword source could not be read. Loaders downgrade this to an empty lexicon.
    #[error("failed to load lexicon from '{path}': {reason}")]
    LexiconLoad {
        /// Source the load was attempted from.
        path: String,
        /// What went wrong.
        reason: String,
    },

    /// The base classifier failed on a single text.
    #[error("classifier failed: {0}")]
    Classifier(String),

    /// The base classifier did not answer within the per-item timeout.
    #[error("classifier timed out after {timeout_ms}ms")]
    ClassifierTimeout {
        /// The configured timeout in milliseconds.
        timeout_ms: u128,
    },

    /// A batch was aborted because one of its comments failed.
    #[error("comment #{index} failed: {source}")]
    ItemFailed {
        /// Position of the failing comment in the input.
        index: usize,
        /// The underlying failure.
        #[source]
        source: Box<SentimentError>,
    },

    /// A tabular input lacks a required column.
    #[error("missing column: expected one of {0}")]
    MissingColumn(String),

    /// Invalid configuration value or file.
    #[error("{0}")]
    Config(String),

    /// Network or download failure. Retry may help.
    #[error("{0}")]
    Download(String),

    /// Tokenization failure. Check input text.
    #[error("{0}")]
    Tokenization(String),

    /// Device initialization failure. Fall back to CPU.
    #[error("{0}")]
    Device(String),

    /// CSV read or write failure.
    #[error("{0}")]
    Csv(String),

    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Internal error. Report if seen.
    #[error("{0}")]
    Unexpected(String),
}

impl SentimentError {
    /// Whether this failure belongs to a single comment rather than the whole run.
    pub fn is_per_item(&self) -> bool {
        matches!(
            self,
            SentimentError::InvalidLabel(_)
                | SentimentError::InvalidScore(_)
                | SentimentError::Classifier(_)
                | SentimentError::ClassifierTimeout { .. }
                | SentimentError::Tokenization(_)
        )
    }
}

impl From<hf_hub::api::sync::ApiError> for SentimentError {
    fn from(value: hf_hub::api::sync::ApiError) -> Self {
        SentimentError::Download(format!("HuggingFace API error: {}", value))
    }
}

impl From<candle_core::Error> for SentimentError {
    fn from(value: candle_core::Error) -> Self {
        SentimentError::Classifier(value.to_string())
    }
}

impl From<serde_json::Error> for SentimentError {
    fn from(value: serde_json::Error) -> Self {
        SentimentError::Unexpected(value.to_string())
    }
}

impl From<csv::Error> for SentimentError {
    fn from(value: csv::Error) -> Self {
        SentimentError::Csv(value.to_string())
    }
}

impl From<toml::de::Error> for SentimentError {
    fn from(value: toml::de::Error) -> Self {
        SentimentError::Config(format!("invalid configuration: {value}"))
    }
}
