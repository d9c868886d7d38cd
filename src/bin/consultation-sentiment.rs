use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use consultation_sentiment::batch::BatchAnalyzer;
use consultation_sentiment::comments::load_comments_csv;
use consultation_sentiment::config::{AnalyzerConfig, ConfigOverrides};
use consultation_sentiment::export::{save_results_csv, SentimentSummary};
use consultation_sentiment::lexicon::Lexicon;
use consultation_sentiment::refine::Refiner;
use consultation_sentiment::sentiment::SentimentAnalysisPipelineBuilder;

/// Keyword-refined sentiment analysis of consultation comments.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    lexicon: LexiconArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct LexiconArgs {
    /// CSV with a `keyword` column of positive terms.
    #[arg(long, global = true)]
    positive: Option<PathBuf>,

    /// CSV with a `keyword` column of negative terms.
    #[arg(long, global = true)]
    negative: Option<PathBuf>,

    /// CSV with a `keyword` column of neutral terms.
    #[arg(long, global = true)]
    neutral: Option<PathBuf>,

    /// Keep Neutral comments containing any neutral keyword as Pure Neutral.
    #[arg(long, global = true)]
    neutral_short_circuit: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify and refine every comment in a CSV file.
    Analyze {
        /// Input CSV (needs a text/comment/feedback/review/message column).
        input: PathBuf,

        /// Where to write the results CSV.
        #[arg(short, long, default_value = "sentiment_results.csv")]
        output: PathBuf,

        /// Skip comments that fail instead of aborting the run.
        #[arg(long)]
        skip_failed: bool,

        /// Classifier calls in flight.
        #[arg(long)]
        concurrency: Option<usize>,

        /// Per-comment timeout in seconds.
        #[arg(long)]
        timeout: Option<f64>,

        /// Device: cpu, cuda or cuda:N.
        #[arg(long)]
        device: Option<String>,
    },
    /// Refine an already known label without running the model.
    Refine {
        /// Comment text.
        text: String,

        /// Base label: Negative, Neutral or Positive.
        #[arg(long)]
        label: String,

        /// Classifier confidence in [0, 1].
        #[arg(long)]
        confidence: f32,
    },
}

fn init_logging() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()?;

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<AnalyzerConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalyzerConfig::from_file(path)?,
        None => AnalyzerConfig::default(),
    };

    let lexicon = &cli.lexicon;
    let mut overrides = ConfigOverrides {
        positive: lexicon.positive.clone(),
        negative: lexicon.negative.clone(),
        neutral: lexicon.neutral.clone(),
        neutral_short_circuit: lexicon.neutral_short_circuit,
        ..Default::default()
    };
    if let Command::Analyze {
        skip_failed,
        concurrency,
        timeout,
        device,
        ..
    } = &cli.command
    {
        overrides.skip_failed = *skip_failed;
        overrides.concurrency = *concurrency;
        overrides.item_timeout_secs = *timeout;
        overrides.device = device.clone();
    }

    config.apply(&overrides)?;
    Ok(config)
}

async fn analyze(
    config: &AnalyzerConfig,
    refiner: Refiner,
    input: &Path,
    output: &Path,
) -> anyhow::Result<()> {
    let comments = load_comments_csv(input)
        .with_context(|| format!("Failed to read comments from {}", input.display()))?;

    let pipeline = SentimentAnalysisPipelineBuilder::modernbert(config.model.size)
        .device(config.model.device_request()?)
        .max_length(config.model.max_length)
        .build()
        .context("Failed to build sentiment pipeline")?;

    let analyzer = BatchAnalyzer::from_shared(Arc::new(pipeline), Arc::new(refiner))
        .with_options(config.batch_options());
    let batch = analyzer.analyze_batch_concurrent(comments).await?;

    for failure in &batch.failures {
        tracing::warn!(index = failure.index, "not analyzed: {}", failure.error);
    }

    save_results_csv(output, &batch.results)
        .with_context(|| format!("Failed to write results to {}", output.display()))?;

    print!("{}", SentimentSummary::from_results(&batch.results));
    println!(
        "Analyzed {} comment(s) in {:.2}s ({:.1}/s) -> {}",
        batch.results.len(),
        batch.stats.total_time.as_secs_f64(),
        batch.stats.items_per_second(),
        output.display()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let refiner = Refiner::new(Lexicon::load(&config.lexicon)).with_policy(config.refinement);

    match &cli.command {
        Command::Analyze { input, output, .. } => {
            analyze(&config, refiner, input, output).await?;
        }
        Command::Refine {
            text,
            label,
            confidence,
        } => {
            let hits = refiner.hits(text);
            let (main, sub) = refiner.refine_label(text, label, *confidence)?;
            tracing::debug!(?hits, "keyword hits");
            println!("{main}\t{sub}");
        }
    }

    Ok(())
}
