// Dataset pipeline — load every input once and derive all outputs.
//
// The corpus is the single point of truth: it is loaded (or fetched from the
// cache) once and shared by reference with the aggregator, the rate aligner,
// and the index builder.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::cache::LoadCache;
use crate::config::DEFAULT_SCORER_KEY;
use crate::corpus::{load_corpus_dir, SpeechCorpus};
use crate::dates::DEFAULT_CUTOFF;
use crate::error::Result;
use crate::index::{build_indices, GlobalIndex};
use crate::rates::{align_rates, read_rate_file, RateSeries, RawRateRow};
use crate::scores::{
    read_scoring_runs, scores_by_date, scores_by_speech, DateIndexedScores, ScoringRun,
    SpeechScores,
};

/// Where the inputs live and how to read them.
#[derive(Debug, Clone)]
pub struct DatasetInputs {
    pub speech_dir: PathBuf,
    pub score_dir: PathBuf,
    pub rates_file: PathBuf,
    pub scorer_key: String,
    pub cutoff: NaiveDate,
}

impl DatasetInputs {
    pub fn new(speech_dir: &Path, score_dir: &Path, rates_file: &Path) -> Self {
        Self {
            speech_dir: speech_dir.to_path_buf(),
            score_dir: score_dir.to_path_buf(),
            rates_file: rates_file.to_path_buf(),
            scorer_key: DEFAULT_SCORER_KEY.to_string(),
            cutoff: DEFAULT_CUTOFF,
        }
    }
}

/// Every derived artifact for one run.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub corpus: Arc<SpeechCorpus>,
    pub runs: Vec<ScoringRun>,
    pub speech_scores: SpeechScores,
    pub date_scores: DateIndexedScores,
    pub rates: RateSeries,
    pub index: GlobalIndex,
}

/// Load the corpus for `inputs`, reusing the cached copy when the speech
/// files and the cutoff are unchanged.
pub fn load_cached_corpus(
    cache: &mut LoadCache<SpeechCorpus>,
    inputs: &DatasetInputs,
) -> Result<Arc<SpeechCorpus>> {
    let cutoff = inputs.cutoff;
    cache.get_or_load_keyed(&inputs.speech_dir, &cutoff.to_string(), |dir| {
        load_corpus_dir(dir, cutoff)
    })
}

/// Derive every artifact from an already-loaded corpus and raw inputs.
pub fn assemble(
    corpus: Arc<SpeechCorpus>,
    runs: Vec<ScoringRun>,
    raw_rates: &[RawRateRow],
    average_across_runs: bool,
) -> Result<Dataset> {
    let speech_scores = scores_by_speech(&corpus, &runs);
    let date_scores = scores_by_date(&corpus, &runs, average_across_runs);
    let rates = align_rates(raw_rates, &corpus)?;
    let index = build_indices(&corpus, &speech_scores, &rates);

    info!(
        speeches = corpus.len(),
        scored_speeches = speech_scores.len(),
        score_dates = date_scores.len(),
        rate_dates = rates.len(),
        authors = index.authors.len(),
        topics = index.topics.len(),
        "dataset assembled"
    );

    Ok(Dataset {
        corpus,
        runs,
        speech_scores,
        date_scores,
        rates,
        index,
    })
}

/// Load all inputs from disk and build the dataset.
pub fn build_dataset(
    cache: &mut LoadCache<SpeechCorpus>,
    inputs: &DatasetInputs,
    average_across_runs: bool,
) -> Result<Dataset> {
    let corpus = load_cached_corpus(cache, inputs)?;
    let runs = read_scoring_runs(&inputs.score_dir, &inputs.scorer_key, &corpus)?;
    let raw_rates = read_rate_file(&inputs.rates_file)?;
    assemble(corpus, runs, &raw_rates, average_across_runs)
}
