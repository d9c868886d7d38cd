use consultation_sentiment::batch::BatchAnalyzer;
use consultation_sentiment::comments::CommentStore;
use consultation_sentiment::export::{write_results_csv, SentimentSummary};
use consultation_sentiment::lexicon::{Lexicon, LexiconPaths};
use consultation_sentiment::refine::Refiner;
use consultation_sentiment::sentiment::{ModernBertSize, SentimentAnalysisPipelineBuilder};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let lexicon = Lexicon::load(&LexiconPaths {
        positive: Some("lexicon/positive.csv".into()),
        negative: Some("lexicon/negative.csv".into()),
        neutral: Some("lexicon/neutral.csv".into()),
    });

    let mut store = CommentStore::new();
    store.add_lines(
        "The new cycle lanes are a real improvement\n\
         This scheme is a total scam\n\
         Please publish the traffic survey data\n\
         Good idea in principle but the cost is a waste",
        Some("Resident"),
        None,
    );

    let pipeline = SentimentAnalysisPipelineBuilder::modernbert(ModernBertSize::Base).build()?;
    let analyzer = BatchAnalyzer::new(pipeline, Refiner::new(lexicon));
    let output = analyzer.analyze_batch(store.to_inputs())?;

    for r in &output.results {
        println!(
            "{:<50} {:<9} {:<30} {:.3}",
            r.text,
            r.sentiment_main.as_str(),
            r.sentiment_sub.as_str(),
            r.score
        );
    }
    println!("\n{}", SentimentSummary::from_results(&output.results));

    write_results_csv(std::io::stdout(), &output.results)?;
    Ok(())
}
