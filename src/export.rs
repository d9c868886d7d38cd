//! Result export and summary counts.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::batch::RefinedResult;
use crate::classifier::Sentiment;
use crate::error::Result;
use crate::refine::RefinedSentiment;

/// Writes results as CSV with header
/// `text,sentiment_main,sentiment_sub,score,author,date`.
pub fn write_results_csv<W: Write>(writer: W, results: &[RefinedResult]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for result in results {
        writer.serialize(result)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes results to a CSV file, replacing it if present.
pub fn save_results_csv(path: impl AsRef<Path>, results: &[RefinedResult]) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    write_results_csv(file, results)?;
    tracing::info!(path = %path.display(), rows = results.len(), "results saved");
    Ok(())
}

/// Label counts over a set of results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SentimentSummary {
    /// Number of results.
    pub total: usize,
    /// Count per base label.
    pub by_main: BTreeMap<Sentiment, usize>,
    /// Count per refined label.
    pub by_sub: BTreeMap<RefinedSentiment, usize>,
    /// Base label counts per comment date, oldest first.
    pub by_date: BTreeMap<NaiveDate, BTreeMap<Sentiment, usize>>,
}

impl SentimentSummary {
    /// Tallies `results`.
    pub fn from_results(results: &[RefinedResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Default::default()
        };
        for r in results {
            *summary.by_main.entry(r.sentiment_main).or_default() += 1;
            *summary.by_sub.entry(r.sentiment_sub).or_default() += 1;
            *summary
                .by_date
                .entry(r.date)
                .or_default()
                .entry(r.sentiment_main)
                .or_default() += 1;
        }
        summary
    }

    /// Results with base label `label`.
    pub fn count(&self, label: Sentiment) -> usize {
        self.by_main.get(&label).copied().unwrap_or(0)
    }

    /// Results with refined label `label`.
    pub fn count_sub(&self, label: RefinedSentiment) -> usize {
        self.by_sub.get(&label).copied().unwrap_or(0)
    }

    /// Results dated `date` with base label `label`.
    pub fn count_on(&self, date: NaiveDate, label: Sentiment) -> usize {
        self.by_date
            .get(&date)
            .and_then(|counts| counts.get(&label))
            .copied()
            .unwrap_or(0)
    }

    /// Fraction of results with base label `label`; 0 when there are none.
    pub fn share(&self, label: Sentiment) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.count(label) as f64 / self.total as f64
        }
    }
}

impl std::fmt::Display for SentimentSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for label in [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral] {
            writeln!(
                f,
                "{:<8} {:>5} ({:.1}%)",
                label.as_str(),
                self.count(label),
                self.share(label) * 100.0
            )?;
        }
        writeln!(f, "{:<8} {:>5}", "Total", self.total)?;
        for label in RefinedSentiment::ALL {
            let n = self.count_sub(label);
            if n > 0 {
                writeln!(f, "  {:<30} {:>5}", label.as_str(), n)?;
            }
        }
        if self.by_date.len() > 1 {
            writeln!(f, "{:<10} {:>8} {:>8} {:>8}", "Date", "Positive", "Negative", "Neutral")?;
            for date in self.by_date.keys() {
                writeln!(
                    f,
                    "{:<10} {:>8} {:>8} {:>8}",
                    date.to_string(),
                    self.count_on(*date, Sentiment::Positive),
                    self.count_on(*date, Sentiment::Negative),
                    self.count_on(*date, Sentiment::Neutral)
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(text: &str, main: Sentiment, sub: RefinedSentiment) -> RefinedResult {
        dated(text, main, sub, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
    }

    fn dated(text: &str, main: Sentiment, sub: RefinedSentiment, date: NaiveDate) -> RefinedResult {
        RefinedResult {
            text: text.to_string(),
            sentiment_main: main,
            sentiment_sub: sub,
            score: 0.5,
            author: "Anonymous".to_string(),
            date,
        }
    }

    #[test]
    fn writes_header_and_rows() {
        let rows = vec![result(
            "Fine, \"mostly\"",
            Sentiment::Positive,
            RefinedSentiment::DominantlyNegative,
        )];
        let mut buf = Vec::new();
        write_results_csv(&mut buf, &rows).unwrap();
        let out = String::from_utf8(buf).unwrap();

        let mut lines = out.lines();
        assert_eq!(
            lines.next(),
            Some("text,sentiment_main,sentiment_sub,score,author,date")
        );
        assert_eq!(
            lines.next(),
            Some("\"Fine, \"\"mostly\"\"\",Positive,Neutral (Dominantly Negative),0.5,Anonymous,2024-01-01")
        );
    }

    #[test]
    fn summary_counts_and_shares() {
        let rows = vec![
            result("a", Sentiment::Positive, RefinedSentiment::Positive),
            result("b", Sentiment::Neutral, RefinedSentiment::PureNeutral),
            result("c", Sentiment::Neutral, RefinedSentiment::DominantlyNegative),
            result("d", Sentiment::Negative, RefinedSentiment::Negative),
        ];
        let summary = SentimentSummary::from_results(&rows);

        assert_eq!(summary.total, 4);
        assert_eq!(summary.count(Sentiment::Neutral), 2);
        assert_eq!(summary.count_sub(RefinedSentiment::DominantlyNegative), 1);
        assert_eq!(summary.share(Sentiment::Positive), 0.25);
    }

    #[test]
    fn summary_tallies_labels_per_date() {
        let jan = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let feb = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let rows = vec![
            dated("a", Sentiment::Positive, RefinedSentiment::Positive, feb),
            dated("b", Sentiment::Negative, RefinedSentiment::Negative, jan),
            dated("c", Sentiment::Positive, RefinedSentiment::Positive, jan),
            dated("d", Sentiment::Positive, RefinedSentiment::DominantlyNegative, jan),
        ];
        let summary = SentimentSummary::from_results(&rows);

        let dates: Vec<NaiveDate> = summary.by_date.keys().copied().collect();
        assert_eq!(dates, [jan, feb]);
        assert_eq!(summary.count_on(jan, Sentiment::Positive), 2);
        assert_eq!(summary.count_on(jan, Sentiment::Negative), 1);
        assert_eq!(summary.count_on(feb, Sentiment::Positive), 1);
        assert_eq!(summary.count_on(feb, Sentiment::Neutral), 0);

        let shown = summary.to_string();
        assert!(shown.contains("2024-01-01        2        1        0"));
        assert!(shown.contains("2024-02-01        1        0        0"));
    }

    #[test]
    fn empty_summary_has_zero_share() {
        let summary = SentimentSummary::from_results(&[]);
        assert_eq!(summary.share(Sentiment::Negative), 0.0);
    }
}
