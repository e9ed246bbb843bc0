// Scoring-run models and the reader for run output files.
//
// A run file is a JSON array of `{ "id": ..., "<scorer>": { topic: score } }`.
// The scorer key is configurable because different runs were produced by
// different classifiers; the scores themselves are opaque numbers.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::cache::json_files_in;
use crate::corpus::SpeechCorpus;
use crate::error::{DatasetError, Result};

/// Topic name -> score. Ordered so output and iteration are deterministic.
pub type TopicScores = BTreeMap<String, f64>;

/// One speech's scores from one scoring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicScoreRow {
    pub speech_id: String,
    pub scores: TopicScores,
}

impl TopicScoreRow {
    pub fn new(speech_id: impl Into<String>, scores: TopicScores) -> Self {
        Self {
            speech_id: speech_id.into(),
            scores,
        }
    }
}

/// The output of one independent scoring run.
#[derive(Debug, Clone, Default)]
pub struct ScoringRun {
    pub name: String,
    pub rows: Vec<TopicScoreRow>,
}

impl ScoringRun {
    pub fn new(name: impl Into<String>, rows: Vec<TopicScoreRow>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Build a run from raw JSON rows, reading scores from `scorer_key`.
    /// Every row must be well formed.
    pub fn from_json_rows(name: &str, rows: &[Value], scorer_key: &str) -> Result<Self> {
        let rows = rows
            .iter()
            .enumerate()
            .map(|(position, row)| {
                let id = row_id(name, position, row)?;
                parse_scores(name, id, row, scorer_key)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(name, rows))
    }

    /// Build a run keeping only rows whose speech is in `corpus`.
    ///
    /// Each row's id is checked first; rows for other speeches are skipped
    /// before their score map is read, so a malformed row for a speech outside
    /// the corpus never fails the load.
    pub fn from_json_rows_in(
        name: &str,
        rows: &[Value],
        scorer_key: &str,
        corpus: &SpeechCorpus,
    ) -> Result<Self> {
        let mut kept = Vec::new();
        let mut skipped = 0usize;
        for (position, row) in rows.iter().enumerate() {
            let id = row_id(name, position, row)?;
            if !corpus.contains(id) {
                skipped += 1;
                continue;
            }
            kept.push(parse_scores(name, id, row, scorer_key)?);
        }
        if skipped > 0 {
            debug!(run = %name, skipped, "rows outside corpus skipped");
        }
        Ok(Self::new(name, kept))
    }
}

fn row_id<'a>(run: &str, position: usize, row: &'a Value) -> Result<&'a str> {
    row.get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| DatasetError::schema(run, format!("#{position}"), "id"))
}

fn parse_scores(run: &str, id: &str, row: &Value, scorer_key: &str) -> Result<TopicScoreRow> {
    let scores = row
        .get(scorer_key)
        .and_then(Value::as_object)
        .ok_or_else(|| DatasetError::schema(run, id, scorer_key))?;

    let mut topics = TopicScores::new();
    for (topic, value) in scores {
        let score = value
            .as_f64()
            .ok_or_else(|| DatasetError::schema(run, id, format!("{scorer_key}.{topic}")))?;
        topics.insert(topic.clone(), score);
    }

    Ok(TopicScoreRow::new(id, topics))
}

/// Read every `*.json` file in `dir` as one scoring run, in name order.
///
/// Only rows for speeches in `corpus` are kept (see
/// [`ScoringRun::from_json_rows_in`]).
pub fn read_scoring_runs(
    dir: &Path,
    scorer_key: &str,
    corpus: &SpeechCorpus,
) -> Result<Vec<ScoringRun>> {
    let mut runs = Vec::new();
    for path in json_files_in(dir)? {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let contents = fs::read_to_string(&path).map_err(|e| DatasetError::io(&path, e))?;
        let rows: Vec<Value> =
            serde_json::from_str(&contents).map_err(|e| DatasetError::json(&path, e))?;
        let run = ScoringRun::from_json_rows_in(&name, &rows, scorer_key, corpus)?;
        debug!(run = %name, rows = run.rows.len(), "read scoring run");
        runs.push(run);
    }

    info!(
        runs = runs.len(),
        rows = runs.iter().map(|r| r.rows.len()).sum::<usize>(),
        scorer = scorer_key,
        "scoring runs loaded"
    );
    Ok(runs)
}
