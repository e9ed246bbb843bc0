// Topic score aggregation — join scoring runs to the corpus.
//
// Every view is corpus-gated: rows whose speech id is not in the corpus
// (dropped by the cutoff, or never loaded) are ignored, so they can never
// leak into downstream tables.
//
// Per-date averaging divides each topic's sum by the number of rows in the
// date's group, not by the number of rows that mention the topic. A topic
// missing from a row therefore pulls the average toward zero.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use super::models::{ScoringRun, TopicScoreRow, TopicScores};
use crate::corpus::{SpeechCorpus, SpeechRecord};

/// Per-date aggregate topic scores.
pub type DateIndexedScores = BTreeMap<NaiveDate, TopicScores>;

/// Per-speech scores, keyed by speech id.
pub type SpeechScores = BTreeMap<String, TopicScores>;

/// Rows whose speech is in the corpus, paired with that speech, in run
/// order then row order.
fn gated_rows<'a>(
    corpus: &'a SpeechCorpus,
    runs: &'a [ScoringRun],
) -> impl Iterator<Item = (&'a SpeechRecord, &'a TopicScoreRow)> + 'a {
    runs.iter()
        .flat_map(|run| run.rows.iter())
        .filter_map(move |row| corpus.get(&row.speech_id).map(|speech| (speech, row)))
}

/// Scores per speech. When several runs score the same speech, the last
/// run processed wins.
pub fn scores_by_speech(corpus: &SpeechCorpus, runs: &[ScoringRun]) -> SpeechScores {
    let mut scores = SpeechScores::new();
    for (speech, row) in gated_rows(corpus, runs) {
        scores.insert(speech.id.clone(), row.scores.clone());
    }
    debug!(speeches = scores.len(), "scores joined by speech");
    scores
}

/// Scores per speech date.
///
/// All gated rows sharing a date form one group, whether they come from
/// different speeches or from different runs over the same speech. With
/// `average_across_runs`, each topic's value is its sum over the group
/// divided by the group size. Without it, the last row of the group wins.
pub fn scores_by_date(
    corpus: &SpeechCorpus,
    runs: &[ScoringRun],
    average_across_runs: bool,
) -> DateIndexedScores {
    let mut groups: BTreeMap<NaiveDate, Vec<&TopicScores>> = BTreeMap::new();
    for (speech, row) in gated_rows(corpus, runs) {
        groups.entry(speech.date).or_default().push(&row.scores);
    }

    let aggregated: DateIndexedScores = groups
        .into_iter()
        .map(|(date, rows)| {
            let scores = if average_across_runs {
                average_group(&rows)
            } else {
                rows.last().map(|last| (*last).clone()).unwrap_or_default()
            };
            (date, scores)
        })
        .collect();

    debug!(
        dates = aggregated.len(),
        average_across_runs, "scores aggregated by date"
    );
    aggregated
}

/// Sum each topic over the group and divide by the group size.
fn average_group(rows: &[&TopicScores]) -> TopicScores {
    let mut sums = TopicScores::new();
    for row in rows {
        for (topic, value) in row.iter() {
            *sums.entry(topic.clone()).or_insert(0.0) += value;
        }
    }

    let n = rows.len() as f64;
    for value in sums.values_mut() {
        *value /= n;
    }
    sums
}

/// A single topic's score over time for one author.
///
/// Rows without the topic are skipped. When two rows land on the same date,
/// the later one wins.
pub fn score_curve(
    corpus: &SpeechCorpus,
    runs: &[ScoringRun],
    author: &str,
    topic: &str,
) -> BTreeMap<NaiveDate, f64> {
    let mut curve = BTreeMap::new();
    for (speech, row) in gated_rows(corpus, runs) {
        if speech.author != author {
            continue;
        }
        if let Some(value) = row.scores.get(topic) {
            curve.insert(speech.date, *value);
        }
    }
    curve
}

/// Distinct topic names across per-speech scores, ascending.
pub fn topic_names(scores: &SpeechScores) -> Vec<&str> {
    let mut topics: Vec<&str> = scores
        .values()
        .flat_map(|s| s.keys().map(String::as_str))
        .collect();
    topics.sort_unstable();
    topics.dedup();
    topics
}
