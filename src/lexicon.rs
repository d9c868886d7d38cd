//! Keyword lexicons.
//!
//! Three keyword lists (positive, negative, neutral) are loaded once from CSV
//! files with a `keyword` column and then held as an immutable [`Lexicon`].
//!
//! Loading never fails the process: a missing or malformed source logs a
//! warning and yields an empty list, so refinement degrades to "no keyword
//! evidence" instead of aborting.
//!
//! ```rust
//! use consultation_sentiment::lexicon::{KeywordSet, Lexicon};
//!
//! let lexicon = Lexicon::new(
//!     KeywordSet::from_terms(["helpful", "Great"]),
//!     KeywordSet::from_terms(["scam"]),
//!     KeywordSet::default(),
//! );
//! assert!(lexicon.positive.contains("great"));
//! assert_eq!(lexicon.negative.count_hits("a total scam, scam!"), 1);
//! ```

use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SentimentError};

const KEYWORD_COLUMN: &str = "keyword";

/// A deduplicated set of lowercase keywords.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet {
    terms: HashSet<String>,
}

impl KeywordSet {
    /// Builds a set from arbitrary terms (trimmed, lowercased, blanks dropped).
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .filter_map(|t| normalize_term(t.as_ref()))
            .collect();
        Self { terms }
    }

    /// Loads keywords from a CSV file, degrading to an empty set on any failure.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(set) => {
                tracing::debug!(path = %path.display(), terms = set.len(), "loaded keyword list");
                set
            }
            Err(e) => {
                tracing::warn!("{e}; continuing with an empty keyword list");
                Self::default()
            }
        }
    }

    /// Loads keywords from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::LexiconLoad`] if the file cannot be opened or
    /// parsed, or has no `keyword` column.
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = path.display().to_string();
        let file = std::fs::File::open(path).map_err(|e| lexicon_error(&source, e))?;
        Self::read_from(file, &source)
    }

    /// Reads keywords from any CSV reader. `source` only labels errors.
    pub fn read_from<R: Read>(reader: R, source: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let column = reader
            .headers()
            .map_err(|e| lexicon_error(source, e))?
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(KEYWORD_COLUMN))
            .ok_or_else(|| lexicon_error(source, "no 'keyword' column"))?;

        let mut terms = HashSet::new();
        for record in reader.records() {
            let record = record.map_err(|e| lexicon_error(source, e))?;
            if let Some(term) = record.get(column).and_then(normalize_term) {
                terms.insert(term);
            }
        }

        Ok(Self { terms })
    }

    /// Whether `term` (case-insensitive) is in the set.
    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains(&term.to_lowercase())
    }

    /// Number of distinct terms occurring as substrings of `lowered`.
    ///
    /// `lowered` must already be lowercase. A term counts once no matter how
    /// often it occurs.
    pub fn count_hits(&self, lowered: &str) -> usize {
        self.terms
            .iter()
            .filter(|term| lowered.contains(term.as_str()))
            .count()
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the set has no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

fn normalize_term(raw: &str) -> Option<String> {
    let term = raw.trim();
    (!term.is_empty()).then(|| term.to_lowercase())
}

fn lexicon_error(source: &str, reason: impl std::fmt::Display) -> SentimentError {
    SentimentError::LexiconLoad {
        path: source.to_string(),
        reason: reason.to_string(),
    }
}

/// Locations of the three keyword lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconPaths {
    /// Positive indicator terms.
    pub positive: Option<PathBuf>,
    /// Negative indicator terms.
    pub negative: Option<PathBuf>,
    /// Neutral indicator terms.
    pub neutral: Option<PathBuf>,
}

/// Positive, negative and neutral keyword sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lexicon {
    /// Terms indicating positive sentiment.
    pub positive: KeywordSet,
    /// Terms indicating negative sentiment.
    pub negative: KeywordSet,
    /// Terms indicating neutral sentiment.
    pub neutral: KeywordSet,
}

impl Lexicon {
    /// Creates a lexicon from already-built sets.
    pub fn new(positive: KeywordSet, negative: KeywordSet, neutral: KeywordSet) -> Self {
        Self {
            positive,
            negative,
            neutral,
        }
    }

    /// Creates a lexicon from plain term lists.
    pub fn from_terms<P, N, U>(positive: P, negative: N, neutral: U) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        N: IntoIterator,
        N::Item: AsRef<str>,
        U: IntoIterator,
        U::Item: AsRef<str>,
    {
        Self::new(
            KeywordSet::from_terms(positive),
            KeywordSet::from_terms(negative),
            KeywordSet::from_terms(neutral),
        )
    }

    /// Loads all three lists. Unset paths and unreadable files yield empty lists.
    pub fn load(paths: &LexiconPaths) -> Self {
        let load = |path: &Option<PathBuf>, name: &str| match path {
            Some(p) => KeywordSet::load(p),
            None => {
                tracing::warn!("no {name} keyword list configured; using an empty list");
                KeywordSet::default()
            }
        };

        let lexicon = Self::new(
            load(&paths.positive, "positive"),
            load(&paths.negative, "negative"),
            load(&paths.neutral, "neutral"),
        );
        tracing::info!(
            positive = lexicon.positive.len(),
            negative = lexicon.negative.len(),
            neutral = lexicon.neutral.len(),
            "lexicon loaded"
        );
        lexicon
    }

    /// Whether all three lists are empty.
    pub fn is_empty(&self) -> bool {
        self.positive.is_empty() && self.negative.is_empty() && self.neutral.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_keyword_column_and_normalizes() {
        let csv = "id,Keyword\n1,Scam\n2,  FRAUD \n3,scam\n4,\n";
        let set = KeywordSet::read_from(csv.as_bytes(), "inline").unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("scam"));
        assert!(set.contains("fraud"));
    }

    #[test]
    fn missing_column_is_a_load_error() {
        let csv = "word\nscam\n";
        let err = KeywordSet::read_from(csv.as_bytes(), "inline").unwrap_err();
        assert!(matches!(err, SentimentError::LexiconLoad { .. }));
    }

    #[test]
    fn load_degrades_to_empty_on_missing_file() {
        let set = KeywordSet::load("/definitely/not/here/positive.csv");
        assert!(set.is_empty());
    }

    #[test]
    fn load_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "keyword").unwrap();
        writeln!(file, "welcome").unwrap();
        writeln!(file, "Support").unwrap();

        let set = KeywordSet::load(file.path());
        assert_eq!(set.len(), 2);
        assert!(set.contains("support"));
    }

    #[test]
    fn counts_each_term_once() {
        let set = KeywordSet::from_terms(["bad", "worse"]);
        assert_eq!(set.count_hits("bad, bad, bad and worse"), 2);
        assert_eq!(set.count_hits(""), 0);
    }

    #[test]
    fn substring_matching_is_not_word_bounded() {
        let set = KeywordSet::from_terms(["fair"]);
        assert_eq!(set.count_hits("this is unfair"), 1);
    }

    #[test]
    fn lexicon_load_with_unset_paths_is_empty() {
        let lexicon = Lexicon::load(&LexiconPaths::default());
        assert!(lexicon.is_empty());
    }
}
