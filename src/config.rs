use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::dates::{parse_date, DEFAULT_CUTOFF};
use crate::pipeline::DatasetInputs;

/// Scorer key used when FEDLENS_SCORER_KEY is unset.
pub const DEFAULT_SCORER_KEY: &str = "gpt-5";

/// Central configuration loaded from environment variables.
///
/// Every input path has a default under FEDLENS_DATA_DIR, so a checkout with
/// the usual `data/` layout needs no configuration at all. The .env file is
/// loaded automatically at startup via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory of per-author speech collections (one JSON file per author)
    pub speech_dir: PathBuf,
    /// Directory of scoring-run outputs (one JSON file per run)
    pub score_dir: PathBuf,
    /// Raw policy-rate rows as a JSON array of `{Date, Rate}`
    pub rates_file: PathBuf,
    /// Precomputed speech embeddings (optional input)
    pub embeddings_file: PathBuf,
    /// Key under which each scoring row stores its topic map
    pub scorer_key: String,
    /// Speeches dated before this are dropped
    pub cutoff: NaiveDate,
    /// SQLite export path
    pub db_path: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let data_dir = env::var("FEDLENS_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let path_var = |name: &str, default: &str| {
            env::var(name)
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join(default))
        };

        let cutoff = match env::var("FEDLENS_CUTOFF") {
            Ok(raw) => parse_date(&raw)
                .with_context(|| format!("FEDLENS_CUTOFF is not a valid date: {raw}"))?,
            Err(_) => DEFAULT_CUTOFF,
        };

        Ok(Self {
            speech_dir: path_var("FEDLENS_SPEECH_DIR", "text_data"),
            score_dir: path_var("FEDLENS_SCORE_DIR", "topic_scores"),
            rates_file: path_var("FEDLENS_RATES_FILE", "price_data/rates.json"),
            embeddings_file: path_var("FEDLENS_EMBEDDINGS_FILE", "speeches_with_embeddings.json"),
            scorer_key: env::var("FEDLENS_SCORER_KEY")
                .unwrap_or_else(|_| DEFAULT_SCORER_KEY.to_string()),
            cutoff,
            db_path: env::var("FEDLENS_DB_PATH").unwrap_or_else(|_| "./fedlens.db".to_string()),
        })
    }

    /// The subset of configuration the dataset pipeline needs.
    pub fn inputs(&self) -> DatasetInputs {
        DatasetInputs {
            speech_dir: self.speech_dir.clone(),
            score_dir: self.score_dir.clone(),
            rates_file: self.rates_file.clone(),
            scorer_key: self.scorer_key.clone(),
            cutoff: self.cutoff,
        }
    }

    /// Check that the speech directory exists.
    /// Call this before anything that loads the corpus.
    pub fn require_speeches(&self) -> Result<()> {
        require_dir(&self.speech_dir, "FEDLENS_SPEECH_DIR", "speech collections")
    }

    /// Check that the scoring-run directory exists.
    pub fn require_scores(&self) -> Result<()> {
        require_dir(&self.score_dir, "FEDLENS_SCORE_DIR", "scoring-run outputs")
    }

    /// Check that the rate file exists.
    pub fn require_rates(&self) -> Result<()> {
        if !self.rates_file.is_file() {
            anyhow::bail!(
                "Rate file not found at {}\n\
                 Export the rate sheet to a JSON array of {{\"Date\", \"Rate\"}} rows\n\
                 and point FEDLENS_RATES_FILE at it.",
                self.rates_file.display()
            );
        }
        Ok(())
    }

    /// Everything `build` needs.
    pub fn require_all_inputs(&self) -> Result<()> {
        self.require_speeches()?;
        self.require_scores()?;
        self.require_rates()
    }
}

fn require_dir(path: &Path, var: &str, what: &str) -> Result<()> {
    if !path.is_dir() {
        anyhow::bail!(
            "Directory of {what} not found at {}\n\
             Set {var} in your .env file (see .env.example).",
            path.display()
        );
    }
    Ok(())
}
