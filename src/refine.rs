//! Keyword-based refinement of classifier output.
//!
//! The classifier's label is kept as the *main* sentiment. The *sub* sentiment
//! splits Neutral by which side the keyword evidence leans to, and lets
//! opposing keyword evidence pull a low-confidence Positive or Negative verdict
//! into a Neutral variant.
//!
//! | base label | keyword evidence | confidence | sub label |
//! |------------|------------------|------------|-----------|
//! | Neutral    | neg > pos        | any        | `Neutral (Dominantly Negative)` |
//! | Neutral    | pos > neg        | any        | `Neutral (Dominantly Positive)` |
//! | Neutral    | tie              | any        | `Neutral (Pure Neutral)` |
//! | Positive   | neg > pos        | < 0.95     | `Neutral (Dominantly Negative)` |
//! | Negative   | pos > neg        | < 0.95     | `Neutral (Dominantly Positive)` |
//! | Positive / Negative | otherwise | any      | unchanged |
//!
//! ```rust
//! use consultation_sentiment::classifier::Sentiment;
//! use consultation_sentiment::lexicon::Lexicon;
//! use consultation_sentiment::refine::{RefinedSentiment, Refiner};
//!
//! # fn main() -> consultation_sentiment::error::Result<()> {
//! let lexicon = Lexicon::from_terms(["benefit"], ["scam", "waste"], Vec::<&str>::new());
//! let refiner = Refiner::new(lexicon);
//!
//! let (main, sub) = refiner.refine("A scam and a waste", Sentiment::Positive, 0.80)?;
//! assert_eq!(main, Sentiment::Positive);
//! assert_eq!(sub, RefinedSentiment::DominantlyNegative);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::classifier::{check_confidence, Sentiment};
use crate::error::{Result, SentimentError};
use crate::lexicon::Lexicon;

/// Confidence at or above which keyword evidence cannot override the classifier.
pub const OVERRIDE_CONFIDENCE_THRESHOLD: f32 = 0.95;

/// Refined sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RefinedSentiment {
    /// `Positive`
    Positive,
    /// `Negative`
    Negative,
    /// `Neutral (Pure Neutral)`
    PureNeutral,
    /// `Neutral (Dominantly Positive)`
    DominantlyPositive,
    /// `Neutral (Dominantly Negative)`
    DominantlyNegative,
}

impl RefinedSentiment {
    /// All refined labels.
    pub const ALL: [RefinedSentiment; 5] = [
        RefinedSentiment::Positive,
        RefinedSentiment::Negative,
        RefinedSentiment::PureNeutral,
        RefinedSentiment::DominantlyPositive,
        RefinedSentiment::DominantlyNegative,
    ];

    /// Display name, e.g. `"Neutral (Dominantly Positive)"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            RefinedSentiment::Positive => "Positive",
            RefinedSentiment::Negative => "Negative",
            RefinedSentiment::PureNeutral => "Neutral (Pure Neutral)",
            RefinedSentiment::DominantlyPositive => "Neutral (Dominantly Positive)",
            RefinedSentiment::DominantlyNegative => "Neutral (Dominantly Negative)",
        }
    }

    /// Whether this is one of the three Neutral variants.
    pub fn is_neutral(&self) -> bool {
        matches!(
            self,
            RefinedSentiment::PureNeutral
                | RefinedSentiment::DominantlyPositive
                | RefinedSentiment::DominantlyNegative
        )
    }

    /// The label with Positive and Negative swapped.
    pub fn mirrored(&self) -> Self {
        match self {
            RefinedSentiment::Positive => RefinedSentiment::Negative,
            RefinedSentiment::Negative => RefinedSentiment::Positive,
            RefinedSentiment::PureNeutral => RefinedSentiment::PureNeutral,
            RefinedSentiment::DominantlyPositive => RefinedSentiment::DominantlyNegative,
            RefinedSentiment::DominantlyNegative => RefinedSentiment::DominantlyPositive,
        }
    }
}

impl fmt::Display for RefinedSentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RefinedSentiment {
    type Err = SentimentError;

    fn from_str(s: &str) -> Result<Self> {
        RefinedSentiment::ALL
            .into_iter()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| SentimentError::InvalidLabel(s.to_string()))
    }
}

impl Serialize for RefinedSentiment {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RefinedSentiment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Distinct keyword hits per list for one text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeywordHits {
    /// Positive terms found.
    pub positive: usize,
    /// Negative terms found.
    pub negative: usize,
    /// Neutral terms found.
    pub neutral: usize,
}

/// Knobs for the refinement rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinementPolicy {
    /// When set, a Neutral base label with any neutral keyword hit stays
    /// `Neutral (Pure Neutral)` regardless of positive/negative hits.
    pub neutral_short_circuit: bool,
}

/// Applies the refinement rules against an injected [`Lexicon`].
#[derive(Debug, Clone, Default)]
pub struct Refiner {
    lexicon: Lexicon,
    policy: RefinementPolicy,
}

impl Refiner {
    /// Creates a refiner with the default policy.
    pub fn new(lexicon: Lexicon) -> Self {
        Self {
            lexicon,
            policy: RefinementPolicy::default(),
        }
    }

    /// Replaces the policy.
    pub fn with_policy(mut self, policy: RefinementPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Counts distinct keyword hits in `text`.
    pub fn hits(&self, text: &str) -> KeywordHits {
        let lowered = text.to_lowercase();
        KeywordHits {
            positive: self.lexicon.positive.count_hits(&lowered),
            negative: self.lexicon.negative.count_hits(&lowered),
            neutral: self.lexicon.neutral.count_hits(&lowered),
        }
    }

    /// Refines a base label. Returns `(main, sub)`; `main` is always `base_label`.
    ///
    /// # Errors
    ///
    /// [`SentimentError::InvalidScore`] if `confidence` is outside `[0, 1]`.
    pub fn refine(
        &self,
        text: &str,
        base_label: Sentiment,
        confidence: f32,
    ) -> Result<(Sentiment, RefinedSentiment)> {
        check_confidence(confidence)?;
        let hits = self.hits(text);
        Ok((base_label, self.decide(base_label, confidence, hits)))
    }

    /// Like [`refine`](Self::refine) but takes a raw label string.
    ///
    /// # Errors
    ///
    /// [`SentimentError::InvalidLabel`] for a label outside the taxonomy,
    /// [`SentimentError::InvalidScore`] for an out-of-range confidence.
    pub fn refine_label(
        &self,
        text: &str,
        base_label: &str,
        confidence: f32,
    ) -> Result<(Sentiment, RefinedSentiment)> {
        self.refine(text, base_label.parse()?, confidence)
    }

    fn decide(&self, base: Sentiment, confidence: f32, hits: KeywordHits) -> RefinedSentiment {
        let overridable = confidence < OVERRIDE_CONFIDENCE_THRESHOLD;

        match base {
            Sentiment::Neutral => {
                if self.policy.neutral_short_circuit && hits.neutral > 0 {
                    RefinedSentiment::PureNeutral
                } else if hits.negative > hits.positive {
                    RefinedSentiment::DominantlyNegative
                } else if hits.positive > hits.negative {
                    RefinedSentiment::DominantlyPositive
                } else {
                    RefinedSentiment::PureNeutral
                }
            }
            Sentiment::Positive if hits.negative > hits.positive && overridable => {
                RefinedSentiment::DominantlyNegative
            }
            Sentiment::Positive => RefinedSentiment::Positive,
            Sentiment::Negative if hits.positive > hits.negative && overridable => {
                RefinedSentiment::DominantlyPositive
            }
            Sentiment::Negative => RefinedSentiment::Negative,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refiner() -> Refiner {
        Refiner::new(Lexicon::from_terms(
            ["good", "support", "welcome"],
            ["bad", "scam", "unfair"],
            ["okay", "average"],
        ))
    }

    #[test]
    fn neutral_tie_is_pure_neutral() {
        let (_, sub) = refiner()
            .refine("good but bad", Sentiment::Neutral, 0.5)
            .unwrap();
        assert_eq!(sub, RefinedSentiment::PureNeutral);

        let (_, sub) = refiner()
            .refine("nothing here", Sentiment::Neutral, 0.5)
            .unwrap();
        assert_eq!(sub, RefinedSentiment::PureNeutral);
    }

    #[test]
    fn neutral_leans_by_majority() {
        let r = refiner();
        assert_eq!(
            r.refine("bad scam", Sentiment::Neutral, 0.99).unwrap().1,
            RefinedSentiment::DominantlyNegative
        );
        assert_eq!(
            r.refine("GOOD support", Sentiment::Neutral, 0.99).unwrap().1,
            RefinedSentiment::DominantlyPositive
        );
    }

    #[test]
    fn threshold_is_exclusive() {
        let r = refiner();
        let (_, sub) = r.refine("bad scam", Sentiment::Positive, 0.95).unwrap();
        assert_eq!(sub, RefinedSentiment::Positive);
        let (_, sub) = r.refine("bad scam", Sentiment::Positive, 0.949).unwrap();
        assert_eq!(sub, RefinedSentiment::DominantlyNegative);
    }

    #[test]
    fn negative_overridden_by_positive_evidence() {
        let (main, sub) = refiner()
            .refine("good support, welcome", Sentiment::Negative, 0.6)
            .unwrap();
        assert_eq!(main, Sentiment::Negative);
        assert_eq!(sub, RefinedSentiment::DominantlyPositive);
    }

    #[test]
    fn neutral_hits_ignored_by_default() {
        let (_, sub) = refiner()
            .refine("okay but bad", Sentiment::Neutral, 0.5)
            .unwrap();
        assert_eq!(sub, RefinedSentiment::DominantlyNegative);
    }

    #[test]
    fn neutral_short_circuit_policy() {
        let r = refiner().with_policy(RefinementPolicy {
            neutral_short_circuit: true,
        });
        let (_, sub) = r.refine("okay but bad", Sentiment::Neutral, 0.5).unwrap();
        assert_eq!(sub, RefinedSentiment::PureNeutral);

        // Only the Neutral branch is affected.
        let (_, sub) = r.refine("okay but bad", Sentiment::Positive, 0.5).unwrap();
        assert_eq!(sub, RefinedSentiment::DominantlyNegative);
    }

    #[test]
    fn invalid_inputs_fail_fast() {
        let r = refiner();
        assert!(matches!(
            r.refine("x", Sentiment::Neutral, -0.1),
            Err(SentimentError::InvalidScore(_))
        ));
        assert!(matches!(
            r.refine_label("x", "Mixed", 0.5),
            Err(SentimentError::InvalidLabel(_))
        ));
    }

    #[test]
    fn hit_counts() {
        let hits = refiner().hits("Bad, BAD, unfair... but okay");
        assert_eq!(
            hits,
            KeywordHits {
                positive: 0,
                negative: 2,
                neutral: 1
            }
        );
    }

    #[test]
    fn refined_label_round_trips_through_display() {
        for label in RefinedSentiment::ALL {
            assert_eq!(label.as_str().parse::<RefinedSentiment>().unwrap(), label);
        }
    }
}
