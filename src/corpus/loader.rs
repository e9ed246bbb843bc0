// Corpus loader — merge per-author collections into one id-keyed corpus.
//
// Author identity comes from which collection a record is in, not from
// anything inside the record. Collections are processed in the order given;
// a later collection silently replaces an earlier record with the same id.
// Replacements are recorded on the corpus and logged at debug.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use super::models::{RawSpeech, SpeechCollection, SpeechCorpus, SpeechRecord};
use crate::cache::json_files_in;
use crate::dates::{parse_date, DEFAULT_CUTOFF};
use crate::error::{DatasetError, Result};

/// Merge collections using the default cutoff (June 1, 2018).
pub fn load_corpus(sources: &[SpeechCollection]) -> Result<SpeechCorpus> {
    load_corpus_with_cutoff(sources, DEFAULT_CUTOFF)
}

/// Merge collections, dropping speeches dated strictly before `cutoff`.
///
/// Fails on the first record with a missing field or an unparseable date;
/// nothing is returned for a partially valid input.
pub fn load_corpus_with_cutoff(
    sources: &[SpeechCollection],
    cutoff: NaiveDate,
) -> Result<SpeechCorpus> {
    let mut corpus = SpeechCorpus::with_cutoff(cutoff);
    let mut dropped = 0usize;

    for collection in sources {
        if collection.records.is_empty() {
            warn!(collection = %collection.name, "collection has no records");
        }

        for (position, raw) in collection.records.iter().enumerate() {
            let Some(record) = build_record(collection, position, raw, cutoff)? else {
                dropped += 1;
                continue;
            };

            if let Some(previous) = corpus.upsert(record) {
                debug!(
                    id = raw.id.as_deref().unwrap_or_default(),
                    previous_author = %previous,
                    author = %collection.name,
                    "speech id replaced by later collection"
                );
            }
        }
    }

    info!(
        speeches = corpus.len(),
        collections = sources.len(),
        dropped_before_cutoff = dropped,
        collisions = corpus.collisions().len(),
        %cutoff,
        "corpus loaded"
    );

    Ok(corpus)
}

/// Validate and convert one raw record. `Ok(None)` means the record is
/// older than the cutoff.
fn build_record(
    collection: &SpeechCollection,
    position: usize,
    raw: &RawSpeech,
    cutoff: NaiveDate,
) -> Result<Option<SpeechRecord>> {
    let id = raw
        .id
        .as_ref()
        .ok_or_else(|| DatasetError::schema(&collection.name, format!("#{position}"), "id"))?;
    let raw_date = raw
        .date
        .as_ref()
        .ok_or_else(|| DatasetError::schema(&collection.name, id, "date"))?;
    let date = parse_date(raw_date)?;

    if date < cutoff {
        debug!(%id, %date, "speech before cutoff dropped");
        return Ok(None);
    }

    let text = raw
        .text
        .as_ref()
        .ok_or_else(|| DatasetError::schema(&collection.name, id, "text"))?;

    Ok(Some(SpeechRecord {
        id: id.clone(),
        author: collection.name.clone(),
        date,
        text: text.clone(),
    }))
}

/// Read every `*.json` file in `dir` as one collection.
///
/// The file stem up to the first `.` names the collection, so
/// `powell.json` and `powell.v2.json` both belong to `powell`. Files are
/// returned in name order.
pub fn read_collections(dir: &Path) -> Result<Vec<SpeechCollection>> {
    let files = json_files_in(dir)?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Reading speeches [{bar:30}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let mut collections = Vec::with_capacity(files.len());
    for path in &files {
        let name = collection_name(path);
        pb.set_message(name.clone());
        let contents = fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;
        let records: Vec<RawSpeech> =
            serde_json::from_str(&contents).map_err(|e| DatasetError::json(path, e))?;
        debug!(collection = %name, records = records.len(), "read collection");
        collections.push(SpeechCollection::new(name, records));
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(collections)
}

/// Read and merge a directory of collections with the given cutoff.
pub fn load_corpus_dir(dir: &Path, cutoff: NaiveDate) -> Result<SpeechCorpus> {
    let collections = read_collections(dir)?;
    load_corpus_with_cutoff(&collections, cutoff)
}

/// Speech ids grouped by date, dates ascending, ids in corpus order.
pub fn group_by_date(corpus: &SpeechCorpus) -> BTreeMap<NaiveDate, Vec<String>> {
    let mut by_date: BTreeMap<NaiveDate, Vec<String>> = BTreeMap::new();
    for record in corpus.iter() {
        by_date
            .entry(record.date)
            .or_default()
            .push(record.id.clone());
    }
    by_date
}

fn collection_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default()
        .split('.')
        .next()
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, date: &str) -> RawSpeech {
        RawSpeech {
            id: Some(id.to_string()),
            date: Some(date.to_string()),
            text: Some(format!("text of {id}")),
        }
    }

    #[test]
    fn test_author_comes_from_collection() {
        let sources = vec![SpeechCollection::new("powell", vec![raw("s1", "2019-01-04")])];
        let corpus = load_corpus(&sources).unwrap();
        assert_eq!(corpus.get("s1").unwrap().author, "powell");
    }

    #[test]
    fn test_cutoff_boundary_is_inclusive() {
        let sources = vec![SpeechCollection::new(
            "brainard",
            vec![raw("on", "2018-06-01"), raw("before", "May 31, 2018")],
        )];
        let corpus = load_corpus(&sources).unwrap();
        assert!(corpus.contains("on"));
        assert!(!corpus.contains("before"));
    }

    #[test]
    fn test_pre_cutoff_record_without_text_is_dropped_not_rejected() {
        let mut old = raw("old", "2010-01-01");
        old.text = None;
        let sources = vec![SpeechCollection::new("a", vec![old])];
        assert!(load_corpus(&sources).unwrap().is_empty());
    }

    #[test]
    fn test_missing_text_is_schema_violation() {
        let mut rec = raw("s1", "2020-01-01");
        rec.text = None;
        let sources = vec![SpeechCollection::new("a", vec![rec])];
        match load_corpus(&sources) {
            Err(DatasetError::SchemaViolation {
                source_name,
                record,
                field,
            }) => {
                assert_eq!(source_name, "a");
                assert_eq!(record, "s1");
                assert_eq!(field, "text");
            }
            other => panic!("expected SchemaViolation, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_id_reports_position() {
        let rec = RawSpeech {
            id: None,
            date: Some("2020-01-01".into()),
            text: Some("t".into()),
        };
        let sources = vec![SpeechCollection::new("a", vec![raw("s0", "2020-01-01"), rec])];
        match load_corpus(&sources) {
            Err(DatasetError::SchemaViolation { record, field, .. }) => {
                assert_eq!(record, "#1");
                assert_eq!(field, "id");
            }
            other => panic!("expected SchemaViolation, got {other:?}"),
        }
    }

    #[test]
    fn test_collision_recorded() {
        let sources = vec![
            SpeechCollection::new("a", vec![raw("x", "2020-01-01")]),
            SpeechCollection::new("b", vec![raw("x", "2020-02-01")]),
        ];
        let corpus = load_corpus(&sources).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.collisions().len(), 1);
        assert_eq!(corpus.collisions()[0].previous_author, "a");
        assert_eq!(corpus.collisions()[0].author, "b");
    }

    #[test]
    fn test_group_by_date() {
        let sources = vec![SpeechCollection::new(
            "a",
            vec![
                raw("s2", "2020-01-02"),
                raw("s1", "2020-01-02"),
                raw("s3", "2020-01-01"),
            ],
        )];
        let corpus = load_corpus(&sources).unwrap();
        let grouped = group_by_date(&corpus);
        let dates: Vec<_> = grouped.keys().map(|d| d.to_string()).collect();
        assert_eq!(dates, vec!["2020-01-01", "2020-01-02"]);
        assert_eq!(
            grouped[&NaiveDate::from_ymd_opt(2020, 1, 2).unwrap()],
            vec!["s1", "s2"]
        );
    }

    #[test]
    fn test_collection_name_from_stem() {
        assert_eq!(collection_name(Path::new("/d/powell.json")), "powell");
        assert_eq!(collection_name(Path::new("/d/powell.v2.json")), "powell");
    }
}
