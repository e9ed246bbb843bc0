// Global indices — stable integer axes for matrix and graph construction.
//
// Four independent bijections: author, topic, speech id, date. Each domain is
// sorted by its natural order and numbered from zero, so the same inputs
// always produce the same numbering regardless of how they were loaded.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::corpus::SpeechCorpus;
use crate::rates::RateSeries;
use crate::scores::SpeechScores;

/// A bijection between a sorted domain and `0..len`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bijection<T: Ord + Clone> {
    values: Vec<T>,
    positions: BTreeMap<T, usize>,
}

impl<T: Ord + Clone> Bijection<T> {
    /// Build from any collection of values; duplicates collapse.
    pub fn from_values<I: IntoIterator<Item = T>>(values: I) -> Self {
        let values: Vec<T> = values.into_iter().collect::<BTreeSet<T>>().into_iter().collect();
        let positions = values
            .iter()
            .enumerate()
            .map(|(i, v)| (v.clone(), i))
            .collect();
        Self { values, positions }
    }

    pub fn index_of<Q>(&self, value: &Q) -> Option<usize>
    where
        T: std::borrow::Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.positions.get(value).copied()
    }

    pub fn value_at(&self, index: usize) -> Option<&T> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in index order.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// (index, value) pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.values.iter().enumerate()
    }
}

/// The four axes shared by every downstream matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalIndex {
    pub authors: Bijection<String>,
    pub topics: Bijection<String>,
    pub speeches: Bijection<String>,
    /// Only dates with an aligned rate, not the full calendar.
    pub dates: Bijection<NaiveDate>,
}

/// Build all four indices from the corpus, per-speech scores, and aligned
/// rates.
pub fn build_indices(
    corpus: &SpeechCorpus,
    speech_scores: &SpeechScores,
    rates: &RateSeries,
) -> GlobalIndex {
    GlobalIndex {
        authors: Bijection::from_values(corpus.iter().map(|r| r.author.clone())),
        topics: Bijection::from_values(
            speech_scores
                .values()
                .flat_map(|topics| topics.keys().cloned()),
        ),
        speeches: Bijection::from_values(corpus.ids().map(str::to_string)),
        dates: Bijection::from_values(rates.dates()),
    }
}

fn to_map<T: Ord + Clone, K: Ord>(
    bijection: &Bijection<T>,
    key: impl Fn(&T) -> K,
) -> BTreeMap<K, usize> {
    bijection.iter().map(|(i, v)| (key(v), i)).collect()
}

// Serialized as name -> index maps plus the ordered date list, so the file
// can be read back by tools that only understand plain JSON objects.
impl Serialize for GlobalIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("GlobalIndex", 5)?;
        state.serialize_field("author2idx", &to_map(&self.authors, Clone::clone))?;
        state.serialize_field("topic2idx", &to_map(&self.topics, Clone::clone))?;
        state.serialize_field("speech2idx", &to_map(&self.speeches, Clone::clone))?;
        state.serialize_field("date2idx", &to_map(&self.dates, NaiveDate::to_string))?;
        state.serialize_field("dates", self.dates.values())?;
        state.end()
    }
}
