use consultation_sentiment::error::Result;
use consultation_sentiment::sentiment::{ModernBertSize, SentimentAnalysisPipelineBuilder};

fn main() -> Result<()> {
    println!("Building pipeline...");

    let pipeline = SentimentAnalysisPipelineBuilder::modernbert(ModernBertSize::Base).build()?;

    println!("Pipeline built successfully.");

    let text = "The extended opening hours are very welcome";

    let output = pipeline.run(text)?;

    println!("\n=== Sentiment Analysis Result ===");
    println!("Text: \"{}\"", text);
    println!(
        "Sentiment: {} (confidence: {:.4})",
        output.prediction.label, output.prediction.confidence
    );
    println!(
        "Completed in {:.2}ms",
        output.stats.total_time.as_secs_f64() * 1000.0
    );

    println!("\n=== Batch Inference ===");
    let texts = &[
        "Great plan, long overdue!",
        "Another waste of council funds.",
        "When does the second phase start?",
    ];

    let output = pipeline.run(texts)?;

    for r in output.results {
        let p = r.prediction?;
        println!("{} -> {} ({:.2})", r.text, p.label, p.confidence);
    }

    Ok(())
}
