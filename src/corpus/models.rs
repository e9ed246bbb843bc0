// Corpus models — speech records and the merged, id-keyed corpus.
//
// Raw records are deserialized leniently (every field optional) so a missing
// field surfaces as a SchemaViolation naming the field, not as an opaque
// serde error.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single speech as it appears in a source collection file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSpeech {
    pub id: Option<String>,
    pub date: Option<String>,
    pub text: Option<String>,
}

/// One source collection. The name is the author of every record in it.
#[derive(Debug, Clone)]
pub struct SpeechCollection {
    pub name: String,
    pub records: Vec<RawSpeech>,
}

impl SpeechCollection {
    pub fn new(name: impl Into<String>, records: Vec<RawSpeech>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }
}

/// A speech after parsing, filtering, and author tagging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechRecord {
    pub id: String,
    pub author: String,
    pub date: NaiveDate,
    pub text: String,
}

/// A later collection replaced an earlier record with the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdCollision {
    pub id: String,
    pub previous_author: String,
    pub author: String,
}

/// The merged corpus: unique ids, every date on or after the cutoff.
#[derive(Debug, Clone, Default)]
pub struct SpeechCorpus {
    records: BTreeMap<String, SpeechRecord>,
    collisions: Vec<IdCollision>,
    cutoff: Option<NaiveDate>,
}

impl SpeechCorpus {
    pub(crate) fn with_cutoff(cutoff: NaiveDate) -> Self {
        Self {
            records: BTreeMap::new(),
            collisions: Vec::new(),
            cutoff: Some(cutoff),
        }
    }

    /// Insert a record, replacing any earlier record with the same id.
    /// Returns the replaced record's author when a collision happened.
    pub(crate) fn upsert(&mut self, record: SpeechRecord) -> Option<String> {
        let id = record.id.clone();
        let author = record.author.clone();
        let previous = self.records.insert(id.clone(), record)?;
        self.collisions.push(IdCollision {
            id,
            previous_author: previous.author.clone(),
            author,
        });
        Some(previous.author)
    }

    pub fn get(&self, id: &str) -> Option<&SpeechRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &SpeechRecord> {
        self.records.values()
    }

    /// Ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Every id replacement observed while merging, in processing order.
    pub fn collisions(&self) -> &[IdCollision] {
        &self.collisions
    }

    /// The cutoff the corpus was filtered with (None for an empty default).
    pub fn cutoff(&self) -> Option<NaiveDate> {
        self.cutoff
    }

    /// Distinct speech dates, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.records.values().map(|r| r.date).collect();
        dates.sort_unstable();
        dates.dedup();
        dates
    }

    /// Distinct authors, ascending.
    pub fn authors(&self) -> Vec<&str> {
        let mut authors: Vec<&str> = self.records.values().map(|r| r.author.as_str()).collect();
        authors.sort_unstable();
        authors.dedup();
        authors
    }
}
