//! Batch orchestration tests with deterministic stub classifiers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use consultation_sentiment::batch::{BatchAnalyzer, BatchOptions, FailurePolicy};
use consultation_sentiment::classifier::{Classification, Classifier, Sentiment};
use consultation_sentiment::comments::{Comment, CommentInput, CommentStore};
use consultation_sentiment::error::{Result, SentimentError};
use consultation_sentiment::export::{write_results_csv, SentimentSummary};
use consultation_sentiment::lexicon::Lexicon;
use consultation_sentiment::refine::{RefinedSentiment, Refiner};

/// Labels by leading word: "good..." Positive, "bad..." Negative, "fail..." errors.
struct KeywordStub {
    calls: AtomicUsize,
}

impl KeywordStub {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

impl Classifier for KeywordStub {
    fn classify(&self, text: &str) -> Result<Classification> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let lowered = text.to_lowercase();
        if lowered.starts_with("fail") {
            Err(SentimentError::Classifier("model unavailable".into()))
        } else if lowered.starts_with("good") {
            Classification::new(Sentiment::Positive, 0.9)
        } else if lowered.starts_with("bad") {
            Classification::new(Sentiment::Negative, 0.9)
        } else {
            Classification::new(Sentiment::Neutral, 0.55555)
        }
    }
}

/// Sleeps before answering; texts containing "slow" take much longer.
struct SleepyStub;

impl Classifier for SleepyStub {
    fn classify(&self, text: &str) -> Result<Classification> {
        let delay = if text.contains("slow") { 400 } else { 5 };
        std::thread::sleep(Duration::from_millis(delay));
        Classification::new(Sentiment::Neutral, 0.5)
    }
}

fn refiner() -> Refiner {
    Refiner::new(Lexicon::from_terms(
        ["great", "welcome"],
        ["scam", "waste"],
        Vec::<&str>::new(),
    ))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn scam_comment_stays_negative() -> anyhow::Result<()> {
    struct ConfidentNegative;
    impl Classifier for ConfidentNegative {
        fn classify(&self, _text: &str) -> Result<Classification> {
            Classification::new(Sentiment::Negative, 0.99)
        }
    }

    let analyzer = BatchAnalyzer::new(ConfidentNegative, refiner());
    let output = analyzer.analyze_batch([Comment::new("This scheme is a total scam")
        .with_author("A")
        .with_date(date(2024, 1, 1))])?;

    assert_eq!(output.results.len(), 1);
    let r = &output.results[0];
    assert_eq!(r.text, "This scheme is a total scam");
    assert_eq!(r.sentiment_main, Sentiment::Negative);
    assert_eq!(r.sentiment_sub, RefinedSentiment::Negative);
    assert_eq!(r.score, 0.99);
    assert_eq!(r.author, "A");
    assert_eq!(r.date, date(2024, 1, 1));
    Ok(())
}

#[test]
fn preserves_input_order() -> anyhow::Result<()> {
    let texts = ["good one", "bad scam", "meh", "good but a waste", "bad, great though"];
    let analyzer = BatchAnalyzer::new(KeywordStub::new(), refiner());
    let output = analyzer.analyze_batch(texts)?;

    let got: Vec<&str> = output.results.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(got, texts);

    let subs: Vec<RefinedSentiment> = output.results.iter().map(|r| r.sentiment_sub).collect();
    assert_eq!(
        subs,
        [
            RefinedSentiment::Positive,
            RefinedSentiment::Negative,
            RefinedSentiment::PureNeutral,
            RefinedSentiment::DominantlyNegative,
            RefinedSentiment::DominantlyPositive,
        ]
    );
    assert_eq!(output.stats.items_processed, 5);
    Ok(())
}

#[test]
fn fills_author_and_date_defaults() -> anyhow::Result<()> {
    let before = chrono::Local::now().date_naive();
    let analyzer = BatchAnalyzer::new(KeywordStub::new(), refiner());
    let output = analyzer.analyze_batch([
        CommentInput::from("bare text"),
        CommentInput::from(Comment::new("blank author").with_author("   ")),
        CommentInput::from(Comment::new("dated").with_author("B").with_date(date(2023, 5, 6))),
    ])?;
    let after = chrono::Local::now().date_naive();

    let [bare, blank, dated] = &output.results[..] else {
        panic!("expected three results");
    };
    assert_eq!(bare.author, "Anonymous");
    assert!(bare.date >= before && bare.date <= after);
    assert_eq!(blank.author, "Anonymous");
    assert_eq!(dated.author, "B");
    assert_eq!(dated.date, date(2023, 5, 6));
    assert_eq!(bare.score, 0.556);
    Ok(())
}

#[test]
fn abort_policy_stops_at_first_failure() {
    let stub = Arc::new(KeywordStub::new());
    let analyzer = BatchAnalyzer::from_shared(Arc::clone(&stub), Arc::new(refiner()));

    let err = analyzer
        .analyze_batch(["good", "fail here", "bad", "fail again"])
        .unwrap_err();

    match err {
        SentimentError::ItemFailed { index, source } => {
            assert_eq!(index, 1);
            assert!(matches!(*source, SentimentError::Classifier(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(stub.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn skip_policy_records_failures() -> anyhow::Result<()> {
    let analyzer = BatchAnalyzer::new(KeywordStub::new(), refiner()).with_options(BatchOptions {
        failure_policy: FailurePolicy::Skip,
        ..Default::default()
    });

    let output = analyzer.analyze_batch(["good", "fail here", "bad", "fail again"])?;

    let texts: Vec<&str> = output.results.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, ["good", "bad"]);
    let failed: Vec<usize> = output.failures.iter().map(|f| f.index).collect();
    assert_eq!(failed, [1, 3]);
    assert_eq!(output.failures[0].text, "fail here");
    assert_eq!(output.stats.items_processed, 4);
    assert_eq!(output.stats.items_failed, 2);
    Ok(())
}

#[test]
fn skip_policy_aborts_on_run_level_failure() {
    struct Offline;
    impl Classifier for Offline {
        fn classify(&self, text: &str) -> Result<Classification> {
            if text.starts_with("bad") {
                Err(SentimentError::Classifier("odd input".into()))
            } else {
                Err(SentimentError::Download("hub unreachable".into()))
            }
        }
    }

    let analyzer = BatchAnalyzer::new(Offline, refiner()).with_options(BatchOptions {
        failure_policy: FailurePolicy::Skip,
        ..Default::default()
    });

    let err = analyzer.analyze_batch(["bad input", "anything"]).unwrap_err();
    match err {
        SentimentError::ItemFailed { index, source } => {
            assert_eq!(index, 1);
            assert!(matches!(*source, SentimentError::Download(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn empty_batch_is_empty() -> anyhow::Result<()> {
    let analyzer = BatchAnalyzer::new(KeywordStub::new(), refiner());
    let output = analyzer.analyze_batch(Vec::<Comment>::new())?;
    assert!(output.results.is_empty());
    assert!(output.failures.is_empty());
    Ok(())
}

#[test]
fn iterator_yields_lazily() {
    let stub = Arc::new(KeywordStub::new());
    let analyzer = BatchAnalyzer::from_shared(Arc::clone(&stub), Arc::new(refiner()));

    let mut iter = analyzer.analyze_iter(vec!["good", "fail", "bad"]);
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);

    assert!(iter.next().unwrap().is_ok());
    assert!(matches!(
        iter.next().unwrap(),
        Err(SentimentError::ItemFailed { index: 1, .. })
    ));
    assert_eq!(iter.next().unwrap().unwrap().sentiment_main, Sentiment::Negative);
    assert!(iter.next().is_none());
    assert_eq!(stub.calls.load(Ordering::SeqCst), 3);
}

#[test]
fn store_feeds_the_analyzer() -> anyhow::Result<()> {
    let mut store = CommentStore::new();
    let added = store.add_lines("good plan\n\n  bad waste  \n", Some("C"), None);
    assert_eq!(added, 2);

    let analyzer = BatchAnalyzer::new(KeywordStub::new(), refiner());
    let output = analyzer.analyze_batch(store.to_inputs())?;
    let summary = SentimentSummary::from_results(&output.results);
    assert_eq!(summary.count(Sentiment::Positive), 1);
    assert_eq!(summary.count_sub(RefinedSentiment::Negative), 1);

    let mut csv = Vec::new();
    write_results_csv(&mut csv, &output.results)?;
    let csv = String::from_utf8(csv)?;
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.lines().nth(2).unwrap().starts_with("bad waste,Negative,Negative,0.9,C,"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_batch_keeps_order() -> anyhow::Result<()> {
    let texts: Vec<String> = (0..20)
        .map(|i| if i % 2 == 0 { format!("good {i}") } else { format!("bad {i}") })
        .collect();
    let analyzer = BatchAnalyzer::new(KeywordStub::new(), refiner()).with_options(BatchOptions {
        concurrency: 4,
        ..Default::default()
    });

    let output = analyzer.analyze_batch_concurrent(texts.clone()).await?;
    let got: Vec<String> = output.results.iter().map(|r| r.text.clone()).collect();
    assert_eq!(got, texts);
    assert_eq!(output.results[1].sentiment_main, Sentiment::Negative);
    Ok(())
}

#[tokio::test]
async fn concurrent_batch_matches_sequential() -> anyhow::Result<()> {
    let texts = ["good", "bad scam", "meh great", "fail", "good waste"];
    let analyzer = BatchAnalyzer::new(KeywordStub::new(), refiner()).with_options(BatchOptions {
        failure_policy: FailurePolicy::Skip,
        concurrency: 3,
        item_timeout: None,
    });

    let sequential = analyzer.analyze_batch(texts)?;
    let concurrent = analyzer.analyze_batch_concurrent(texts).await?;

    assert_eq!(sequential.results, concurrent.results);
    assert_eq!(concurrent.failures.len(), 1);
    assert_eq!(concurrent.failures[0].index, 3);
    Ok(())
}

#[tokio::test]
async fn slow_classifier_times_out() -> anyhow::Result<()> {
    let analyzer = BatchAnalyzer::new(SleepyStub, refiner()).with_options(BatchOptions {
        failure_policy: FailurePolicy::Skip,
        concurrency: 2,
        item_timeout: Some(Duration::from_millis(100)),
    });

    let output = analyzer
        .analyze_batch_concurrent(["quick", "slow one", "quick again"])
        .await?;

    let texts: Vec<&str> = output.results.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, ["quick", "quick again"]);
    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.failures[0].index, 1);
    assert!(matches!(
        output.failures[0].error,
        SentimentError::ClassifierTimeout { timeout_ms: 100 }
    ));
    Ok(())
}

#[tokio::test]
async fn timeout_aborts_under_abort_policy() {
    let analyzer = BatchAnalyzer::new(SleepyStub, refiner()).with_options(BatchOptions {
        item_timeout: Some(Duration::from_millis(50)),
        ..Default::default()
    });

    let err = analyzer
        .analyze_batch_concurrent(["slow"])
        .await
        .unwrap_err();
    assert!(matches!(err, SentimentError::ItemFailed { index: 0, .. }));
}
