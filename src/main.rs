//! CLI entry point for the review rater.
//!
//! Samples hotel reviews, classifies each one with a language model, writes
//! the annotated sample and updates the hotel's merit score.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use review_rater::aggregate::{classify_reviews, persist_run};
use review_rater::classification::{Classification, Schema};
use review_rater::classify::{Classifier, DEFAULT_MAX_ATTEMPTS};
use review_rater::config::BackendConfig;
use review_rater::ledger::MeritLedger;
use review_rater::reviews::{DEFAULT_SAMPLE_SIZE, ReviewTable};
use review_rater::tabular::TableError;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "review_rater")]
#[command(about = "Classify hotel reviews with a language model and keep merit scores", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample reviews, classify them, write the output table and update the ledger
    Run(RunArgs),
    /// Classify a single review and print the result
    Classify {
        /// Review text to classify
        #[arg(value_name = "TEXT")]
        text: String,

        /// Output schema to request from the model
        #[arg(long, value_enum, default_value_t = Schema::Categories)]
        schema: Schema,

        /// Maximum backend calls before falling back to Neutral
        #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
        max_attempts: u32,
    },
    /// Print the merit ledger
    Ledger {
        /// Merit ledger CSV
        #[arg(short, long, default_value = "Merit.csv")]
        ledger: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Reviews CSV; must have a `reviews_text` column
    #[arg(short, long)]
    reviews: PathBuf,

    /// Merit ledger CSV, updated in place
    #[arg(short, long, default_value = "Merit.csv")]
    ledger: PathBuf,

    /// Where to write the annotated sample
    #[arg(short, long, default_value = "output.csv")]
    output: PathBuf,

    /// Hotel whose merit is adjusted (defaults to the reviews file name without extension)
    #[arg(long)]
    hotel: Option<String>,

    /// Number of reviews to sample
    #[arg(short = 'n', long, default_value_t = DEFAULT_SAMPLE_SIZE)]
    sample_size: usize,

    /// Seed for reproducible sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Output schema to request from the model
    #[arg(long, value_enum, default_value_t = Schema::Categories)]
    schema: Schema,

    /// Maximum backend calls per review before falling back to Neutral
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,

    /// Delay between attempts, in milliseconds
    #[arg(long, default_value_t = 1000)]
    retry_delay_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/review_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("review_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(args).await?,
        Commands::Classify {
            text,
            schema,
            max_attempts,
        } => {
            let config = BackendConfig::from_env()?;
            let classifier = Classifier::new(config.backend()?, schema).with_timeout(config.timeout);

            let classification = classifier.classify(&text, max_attempts).await?;
            if let Classification::FallbackAfterRetries { failures, .. } = &classification {
                for f in failures {
                    warn!(attempt = f.attempt, error = %f.error, "Attempt did not decode");
                }
            }

            println!("{}", serde_json::to_string_pretty(&classification.result().to_json())?);
            info!(status = classification.status(), "Classification finished");
        }
        Commands::Ledger { ledger } => {
            let ledger = match load_input(MeritLedger::load(&ledger), "merit ledger") {
                Some(l) => l,
                None => return Ok(()),
            };
            for (hotel, merit) in ledger.standings() {
                info!(hotel, merit, "Merit");
            }
        }
    }

    Ok(())
}

/// Input-file problems end the run quietly: log and return `None`.
fn load_input<T>(result: Result<T, TableError>, what: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            error!(error = %e, "Could not load {what}, nothing written");
            None
        }
    }
}

/// Samples, classifies and scores one hotel's reviews, then persists the
/// output table and the ledger.
#[tracing::instrument(skip_all, fields(reviews = %args.reviews.display(), ledger = %args.ledger.display()))]
async fn run(args: RunArgs) -> Result<()> {
    let hotel = match args.hotel {
        Some(h) => h,
        None => args
            .reviews
            .file_stem()
            .and_then(OsStr::to_str)
            .map(str::to_string)
            .context("could not derive a hotel name from the reviews path; pass --hotel")?,
    };

    let config = BackendConfig::from_env()?;
    info!(model = %config.model, base_url = %config.base_url, hotel = %hotel, "Backend configured");

    let Some(reviews) = load_input(ReviewTable::load(&args.reviews), "reviews") else {
        return Ok(());
    };
    let Some(mut ledger) = load_input(MeritLedger::load(&args.ledger), "merit ledger") else {
        return Ok(());
    };
    if ledger.merit(&hotel).is_none() {
        warn!(hotel = %hotel, "Hotel not found in merit ledger, merit will not be adjusted");
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let sample = reviews.sample(args.sample_size, &mut rng);

    let classifier = Classifier::new(config.backend()?, args.schema)
        .with_retry_delay(Duration::from_millis(args.retry_delay_ms))
        .with_timeout(config.timeout);

    let (output, stats) =
        classify_reviews(&classifier, &sample, &mut ledger, &hotel, args.max_attempts).await?;

    persist_run(&output, &args.output, &ledger, &args.ledger)?;

    info!(
        reviewed = stats.reviewed,
        positive = stats.positive,
        neutral = stats.neutral,
        negative = stats.negative,
        fallbacks = stats.fallbacks,
        fallback_pct = stats.fallback_pct(),
        merit_skipped = stats.merit_skipped,
        merit_delta = stats.merit_delta,
        final_merit = ?stats.final_merit,
        "Run complete"
    );
    tracing::debug!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}
