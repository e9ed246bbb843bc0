// Speech embeddings — precomputed vectors keyed by speech id.
//
// The embedding file is produced outside this crate. It is large and read by
// several commands, so it goes through the same `LoadCache` as the corpus.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::cache::LoadCache;
use crate::corpus::SpeechCorpus;
use crate::error::{DatasetError, Result};

#[derive(Debug, Deserialize)]
struct RawEmbedding {
    id: Option<String>,
    embedding: Option<Vec<f64>>,
}

/// Embedding vectors keyed by speech id, all of one dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingSet {
    vectors: BTreeMap<String, Vec<f64>>,
    dimension: usize,
}

impl EmbeddingSet {
    /// Build from (id, vector) pairs. Later duplicates replace earlier ones.
    pub fn from_pairs<I>(source_name: &str, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, Vec<f64>)>,
    {
        let mut set = Self::default();
        for (id, vector) in pairs {
            if set.vectors.is_empty() {
                set.dimension = vector.len();
            } else if vector.len() != set.dimension {
                return Err(DatasetError::schema(source_name, id, "embedding"));
            }
            set.vectors.insert(id, vector);
        }
        Ok(set)
    }

    pub fn get(&self, id: &str) -> Option<&[f64]> {
        self.vectors.get(id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Keep only vectors whose speech is in the corpus.
    pub fn restrict_to_corpus(&self, corpus: &SpeechCorpus) -> Self {
        Self {
            vectors: self
                .vectors
                .iter()
                .filter(|(id, _)| corpus.contains(id))
                .map(|(id, v)| (id.clone(), v.clone()))
                .collect(),
            dimension: self.dimension,
        }
    }
}

/// Read an embedding file: a JSON array of `{ "id": ..., "embedding": [...] }`.
/// Other fields on each record are ignored.
pub fn read_embeddings(path: &Path) -> Result<EmbeddingSet> {
    let source_name = path.display().to_string();
    let contents = fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;
    let raw: Vec<RawEmbedding> =
        serde_json::from_str(&contents).map_err(|e| DatasetError::json(path, e))?;

    let mut pairs = Vec::with_capacity(raw.len());
    for (position, record) in raw.into_iter().enumerate() {
        let id = record
            .id
            .ok_or_else(|| DatasetError::schema(&source_name, format!("#{position}"), "id"))?;
        let vector = record
            .embedding
            .ok_or_else(|| DatasetError::schema(&source_name, &id, "embedding"))?;
        pairs.push((id, vector));
    }

    let set = EmbeddingSet::from_pairs(&source_name, pairs)?;
    info!(vectors = set.len(), dimension = set.dimension(), "embeddings loaded");
    Ok(set)
}

/// Read embeddings through the cache.
pub fn load_embeddings(cache: &mut LoadCache<EmbeddingSet>, path: &Path) -> Result<Arc<EmbeddingSet>> {
    cache.get_or_load(path, read_embeddings)
}

/// Element-wise mean of a set of vectors. Empty input gives an empty vector.
pub fn mean_embedding<'a, I>(vectors: I) -> Vec<f64>
where
    I: IntoIterator<Item = &'a [f64]>,
{
    let mut mean: Vec<f64> = Vec::new();
    let mut n = 0usize;
    for vector in vectors {
        if mean.is_empty() {
            mean = vec![0.0; vector.len()];
        }
        for (slot, &val) in mean.iter_mut().zip(vector) {
            *slot += val;
        }
        n += 1;
    }
    for val in &mut mean {
        *val /= n as f64;
    }
    mean
}
