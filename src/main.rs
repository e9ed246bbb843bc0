use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{info, warn};

use fedlens::cache::LoadCache;
use fedlens::config::Config;
use fedlens::corpus::SpeechCorpus;
use fedlens::embeddings::{load_embeddings, mean_embedding, EmbeddingSet};
use fedlens::pipeline::{build_dataset, load_cached_corpus, Dataset};

/// fedlens: build a time-aligned research dataset from central-bank
/// speeches, topic scores, and policy rates.
#[derive(Parser)]
#[command(name = "fedlens", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the full dataset and print a summary
    Build {
        /// Keep only the last score row per date instead of averaging
        #[arg(long)]
        no_average: bool,

        /// Also export the dataset to SQLite (at FEDLENS_DB_PATH unless --db is given)
        #[arg(long)]
        export: bool,

        /// SQLite file to export to (implies --export)
        #[arg(long)]
        db: Option<String>,
    },

    /// Show the per-date aggregate topic scores
    Scores {
        /// Keep only the last score row per date instead of averaging
        #[arg(long)]
        no_average: bool,

        /// Only show the most recent N dates
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show one author's score for a topic over time
    Curve {
        /// Author (speech collection name, e.g. waller)
        author: String,

        /// Topic name as it appears in the scoring runs
        topic: String,
    },

    /// Show the policy rate aligned to speech dates
    Rates,

    /// Write the global author/topic/speech/date indices as JSON
    Indices {
        /// Output file (prints to stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Check the embedding file against the corpus
    Embeddings,

    /// Show configured inputs and export status
    Status,
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fedlens=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let mut corpus_cache: LoadCache<SpeechCorpus> = LoadCache::new();

    match cli.command {
        Commands::Build {
            no_average,
            export,
            db,
        } => {
            let dataset = load_dataset(&config, &mut corpus_cache, !no_average)?;
            fedlens::output::terminal::display_summary(&dataset);

            if export || db.is_some() {
                let db_path = db.unwrap_or_else(|| config.db_path.clone());
                export_dataset(&db_path, &dataset, !no_average)?;
                println!("\nExported to: {db_path}");
            }

            println!("\n{}", "Build complete.".bold());
        }

        Commands::Scores { no_average, limit } => {
            let dataset = load_dataset(&config, &mut corpus_cache, !no_average)?;
            let mode = if no_average { "last row per date" } else { "averaged" };
            println!(
                "\n{}\n",
                format!("=== Topic scores by date ({mode}) ===").bold()
            );
            fedlens::output::terminal::display_date_scores(&dataset.date_scores, limit);
        }

        Commands::Curve { author, topic } => {
            config.require_speeches()?;
            config.require_scores()?;
            let corpus = load_cached_corpus(&mut corpus_cache, &config.inputs())?;
            if !corpus.iter().any(|s| s.author == author) {
                warn!(%author, "no speeches for author");
                println!(
                    "{} no speeches found for '{}'. Known authors: {}",
                    "Warning:".yellow(),
                    author,
                    corpus.authors().join(", ")
                );
            }
            let runs =
                fedlens::scores::read_scoring_runs(&config.score_dir, &config.scorer_key, &corpus)?;
            let curve = fedlens::scores::score_curve(&corpus, &runs, &author, &topic);
            fedlens::output::terminal::display_curve(&author, &topic, &curve);
        }

        Commands::Rates => {
            config.require_speeches()?;
            config.require_rates()?;
            let corpus = load_cached_corpus(&mut corpus_cache, &config.inputs())?;
            let raw = fedlens::rates::read_rate_file(&config.rates_file)?;
            let rates = fedlens::rates::align_rates(&raw, &corpus)
                .context("Failed to align rates to speech dates")?;
            println!("\n{}\n", "=== Policy rate on speech dates ===".bold());
            fedlens::output::terminal::display_rates(&rates);
        }

        Commands::Indices { out } => {
            let dataset = load_dataset(&config, &mut corpus_cache, true)?;
            let json = serde_json::to_string_pretty(&dataset.index)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Indices written to: {}", path.display());
                }
                None => println!("{json}"),
            }
        }

        Commands::Embeddings => {
            config.require_speeches()?;
            let corpus = load_cached_corpus(&mut corpus_cache, &config.inputs())?;
            let mut cache: LoadCache<EmbeddingSet> = LoadCache::new();
            let embeddings = load_embeddings(&mut cache, &config.embeddings_file)
                .with_context(|| {
                    format!(
                        "Failed to load embeddings from {}",
                        config.embeddings_file.display()
                    )
                })?;
            let in_corpus = embeddings.restrict_to_corpus(&corpus);
            println!("Embeddings: {} vectors ({}-dim)", embeddings.len(), embeddings.dimension());
            println!("  In corpus: {} of {} speeches", in_corpus.len(), corpus.len());
            let missing = corpus.len().saturating_sub(in_corpus.len());
            if missing > 0 {
                println!("  {} {} speeches have no embedding", "!".yellow(), missing);
            }

            for author in corpus.authors() {
                let vectors: Vec<&[f64]> = corpus
                    .iter()
                    .filter(|s| s.author == author)
                    .filter_map(|s| in_corpus.get(&s.id))
                    .collect();
                if vectors.is_empty() {
                    continue;
                }
                let count = vectors.len();
                let centroid = mean_embedding(vectors);
                let norm = centroid.iter().map(|v| v * v).sum::<f64>().sqrt();
                println!("  {author}: {count} embedded, centroid norm {norm:.4}");
            }
        }

        Commands::Status => {
            fedlens::status::show(&config)?;
        }
    }

    Ok(())
}

/// Check inputs and build the dataset, wrapping failures with the input paths.
fn load_dataset(
    config: &Config,
    corpus_cache: &mut LoadCache<SpeechCorpus>,
    average_across_runs: bool,
) -> Result<Dataset> {
    config.require_all_inputs()?;
    println!("Building dataset...");
    let dataset = build_dataset(corpus_cache, &config.inputs(), average_across_runs)
        .with_context(|| {
            format!(
                "Failed to build dataset from {}, {}, {}",
                config.speech_dir.display(),
                config.score_dir.display(),
                config.rates_file.display()
            )
        })?;
    Ok(dataset)
}

/// Write the dataset snapshot to SQLite.
#[cfg(feature = "sqlite")]
fn export_dataset(db_path: &str, dataset: &Dataset, average_across_runs: bool) -> Result<()> {
    let mut conn = fedlens::db::initialize(db_path)?;
    fedlens::db::queries::write_dataset(&mut conn, dataset, average_across_runs)
        .with_context(|| format!("Failed to export dataset to {db_path}"))?;
    info!(path = %db_path, "dataset exported");
    Ok(())
}

#[cfg(not(feature = "sqlite"))]
fn export_dataset(_db_path: &str, _dataset: &Dataset, _average_across_runs: bool) -> Result<()> {
    anyhow::bail!("SQLite export is unavailable: rebuild with the `sqlite` feature")
}
