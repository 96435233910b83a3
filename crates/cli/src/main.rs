use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use data_loader::{CorpusEncoding, Field, RawMovieRecord, parse_corpus};
use pipeline::{
    CandidateSizes, PredictError, Predictor, TrainedPipeline, TrainingConfig, Vocabulary,
};
use server::BoxOfficeService;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// boxoffice - Movie box office predictor
#[derive(Parser)]
#[command(name = "boxoffice")]
#[command(about = "Predict cumulative box office with a random forest", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train on a scraped corpus and save the pipeline
    Train {
        /// CSV corpus with one movie per row
        #[arg(long)]
        corpus: PathBuf,

        /// Corpus text encoding (utf-8, gbk, latin-1)
        #[arg(long)]
        encoding: Option<CorpusEncoding>,

        /// JSON training config; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        seed: Option<u64>,

        /// Share of rows held out for scoring
        #[arg(long)]
        test_fraction: Option<f64>,

        /// Explicit candidate ensemble sizes, e.g. --candidates 10,50,100
        #[arg(long, value_delimiter = ',')]
        candidates: Option<Vec<usize>>,

        /// Where to write the trained pipeline
        #[arg(long, default_value = "box_office_model.json")]
        output: PathBuf,
    },

    /// Predict cumulative box office for one movie
    Predict {
        /// Trained pipeline written by `train`
        #[arg(long)]
        model: PathBuf,

        #[command(flatten)]
        movie: MovieArgs,
    },

    /// Show the error curve and feature importances of a trained pipeline
    Curve {
        #[arg(long)]
        model: PathBuf,

        /// Number of feature importances to show
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Print the category and country labels of a corpus
    Vocab {
        #[arg(long)]
        corpus: PathBuf,

        #[arg(long, default_value = "utf-8")]
        encoding: CorpusEncoding,
    },
}

#[derive(Args)]
struct MovieArgs {
    #[arg(long)]
    title: String,

    /// Comma-separated categories, e.g. "爱情,校园"
    #[arg(long, default_value = "")]
    category: String,

    /// Comma-separated countries
    #[arg(long, default_value = "")]
    country: String,

    #[arg(long, allow_negative_numbers = true)]
    year: i64,

    #[arg(long, allow_negative_numbers = true)]
    month: i64,

    #[arg(long, allow_negative_numbers = true)]
    day: i64,

    /// Minutes
    #[arg(long, allow_negative_numbers = true)]
    length: f64,

    #[arg(long, allow_negative_numbers = true)]
    rating: f64,

    #[arg(long, allow_negative_numbers = true)]
    rating_count: f64,

    #[arg(long, allow_negative_numbers = true)]
    wish_count: f64,

    #[arg(long, allow_negative_numbers = true)]
    first_day_box: f64,

    #[arg(long, allow_negative_numbers = true)]
    first_week_box: f64,
}

impl MovieArgs {
    fn to_record(&self) -> RawMovieRecord {
        RawMovieRecord::new()
            .with(Field::Title, self.title.as_str())
            .with(Field::Category, self.category.as_str())
            .with(Field::Country, self.country.as_str())
            .with(Field::Year, self.year.to_string())
            .with(Field::Month, self.month.to_string())
            .with(Field::Day, self.day.to_string())
            .with(Field::Length, self.length.to_string())
            .with(Field::Rating, self.rating.to_string())
            .with(Field::RatingCount, self.rating_count.to_string())
            .with(Field::WishCount, self.wish_count.to_string())
            .with(Field::FirstDayBox, self.first_day_box.to_string())
            .with(Field::FirstWeekBox, self.first_week_box.to_string())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Train {
            corpus,
            encoding,
            config,
            seed,
            test_fraction,
            candidates,
            output,
        } => {
            let mut training = match config {
                Some(path) => TrainingConfig::from_json_file(&path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?,
                None => TrainingConfig::default(),
            };
            if let Some(encoding) = encoding {
                training.encoding = encoding;
            }
            if let Some(seed) = seed {
                training = training.with_seed(seed);
            }
            if let Some(fraction) = test_fraction {
                training = training.with_test_fraction(fraction);
            }
            if let Some(sizes) = candidates {
                training = training.with_candidates(CandidateSizes::List(sizes));
            }
            handle_train(training, corpus, output).await?
        }
        Commands::Predict { model, movie } => handle_predict(model, &movie)?,
        Commands::Curve { model, top } => handle_curve(model, top)?,
        Commands::Vocab { corpus, encoding } => handle_vocab(corpus, encoding)?,
    }

    Ok(())
}

/// Handle the 'train' command
async fn handle_train(config: TrainingConfig, corpus: PathBuf, output: PathBuf) -> Result<()> {
    config.validate().context("Invalid training configuration")?;
    let service = Arc::new(BoxOfficeService::new(config));

    // Ctrl-C stops the sweep; the best finished candidate is still saved
    let watcher = {
        let service = service.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("{} Cancelling after the running candidates finish...", "!".yellow());
                service.cancel_training().await;
            }
        })
    };

    println!("Training on {}...", corpus.display());
    let start = Instant::now();
    let result = service.retrain(&corpus).await;
    watcher.abort();
    let pipeline = result.with_context(|| format!("Failed to train on {}", corpus.display()))?;

    println!("{} Trained in {:.2?}", "✓".green(), start.elapsed());
    print_report(&pipeline, 5);

    pipeline
        .save(&output)
        .with_context(|| format!("Failed to save pipeline to {}", output.display()))?;
    println!("{} Saved pipeline to {}", "✓".green(), output.display());
    Ok(())
}

/// Handle the 'predict' command
fn handle_predict(model: PathBuf, movie: &MovieArgs) -> Result<()> {
    let pipeline = load_pipeline(&model)?;
    let predictor = Predictor::new(Arc::new(pipeline));

    match predictor.predict(&movie.to_record()) {
        Ok(prediction) => {
            for warning in &prediction.warnings {
                println!("{} {}", "warning:".yellow(), warning);
            }
            println!(
                "{} {}: {}",
                "Predicted cumulative box office".bold().blue(),
                movie.title,
                format!("{:.0}", prediction.value).green()
            );
            Ok(())
        }
        Err(PredictError::Validation(err)) => {
            println!("{}", "Request rejected:".bold().red());
            for violation in &err.violations {
                println!("  {} {}", "•".red(), violation);
            }
            bail!("{} field(s) out of range", err.violations.len())
        }
        Err(e) => Err(anyhow!(e).context("Prediction failed")),
    }
}

/// Handle the 'curve' command
fn handle_curve(model: PathBuf, top: usize) -> Result<()> {
    let pipeline = load_pipeline(&model)?;
    let report = pipeline.report();

    println!("{}", "Error curve (1 - R²):".bold().blue());
    println!("{:>8}  {:>10}  {:>10}", "trees", "train", "test");
    for point in &report.curve {
        let line = format!(
            "{:>8}  {:>10.4}  {:>10.4}",
            point.n_estimators, point.train_error, point.test_error
        );
        if point.n_estimators == report.n_estimators {
            println!("{}", line.green());
        } else {
            println!("{line}");
        }
    }
    println!();
    print_report(&pipeline, top);
    Ok(())
}

/// Handle the 'vocab' command
fn handle_vocab(corpus: PathBuf, encoding: CorpusEncoding) -> Result<()> {
    let records = parse_corpus(&corpus, encoding)
        .with_context(|| format!("Failed to load corpus {}", corpus.display()))?;
    let vocabulary = Vocabulary::extract(&records);

    println!("{}", format!("Vocabulary of {} movies", records.len()).bold().blue());
    print_labels("Categories", vocabulary.category_labels().iter());
    print_labels("Countries", vocabulary.country_labels().iter());
    Ok(())
}

fn load_pipeline(path: &Path) -> Result<TrainedPipeline> {
    TrainedPipeline::load(path).with_context(|| format!("Failed to load pipeline from {}", path.display()))
}

fn print_labels<'a>(heading: &str, labels: impl ExactSizeIterator<Item = &'a String>) {
    println!("{} ({}):", heading, labels.len());
    for label in labels {
        println!("  {} {}", "•".green(), label);
    }
}

/// Helper function to print the selection summary
fn print_report(pipeline: &TrainedPipeline, top: usize) {
    let report = pipeline.report();
    let metadata = pipeline.metadata();

    println!(
        "{} {} trees, test R² {:.4}",
        "Selected:".bold(),
        report.n_estimators.to_string().green(),
        report.test_r2
    );
    println!(
        "Rows: {} train / {} test (seed {}, test fraction {})",
        metadata.train_rows, metadata.test_rows, metadata.seed, metadata.test_fraction
    );
    if report.partial {
        println!(
            "{} sweep was cancelled; {} of {} candidates finished",
            "!".yellow(),
            report.curve.len(),
            metadata.candidates.len()
        );
    }

    println!("{}", "Top features:".bold());
    for (rank, (column, importance)) in pipeline.top_importances(top).into_iter().enumerate() {
        println!("{}. {} {:.4}", (rank + 1).to_string().green(), column, importance);
    }
}
