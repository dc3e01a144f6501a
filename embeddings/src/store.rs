//! In-memory vector store.

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use tracing::{debug, info};
use uuid::Uuid;

use crate::Embedding;
use crate::error::{EmbeddingError, Result};
use crate::similarity::{cosine_similarity, relevance_score};

/// Default number of matches returned by a search.
pub const DEFAULT_MAX_RESULTS: usize = 3;

/// An entry in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry<P> {
    /// Store-assigned (or caller-supplied) identifier.
    pub id: String,

    /// The embedding vector, exactly as it was added.
    pub embedding: Embedding,

    /// The payload stored alongside the vector.
    pub payload: Option<P>,
}

/// Parameters for a relevance search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Vector to compare against.
    pub query: Embedding,

    /// Maximum number of matches to return.
    pub max_results: usize,

    /// Minimum relevance score (0.0 to 1.0).
    pub min_score: f32,
}

impl SearchRequest {
    pub fn new(query: Embedding) -> Self {
        Self {
            query,
            max_results: DEFAULT_MAX_RESULTS,
            min_score: 0.0,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }
}

/// A search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatch<P> {
    /// Relevance score in `[0, 1]`, derived from cosine similarity.
    pub score: f32,

    /// ID of the matched entry.
    pub id: String,

    /// The matched embedding.
    pub embedding: Embedding,

    /// The matched payload.
    pub payload: Option<P>,
}

/// A vector store that keeps everything in memory.
///
/// Entries are kept in insertion order. The first embedding added fixes the
/// store's dimension unless one was given up front; every later embedding
/// (and every search query) must match it.
#[derive(Debug, Clone)]
pub struct InMemoryEmbeddingStore<P> {
    entries: IndexMap<String, StoredEntry<P>>,
    dimension: Option<usize>,
}

impl<P> InMemoryEmbeddingStore<P> {
    /// Create an empty store whose dimension is set by the first add.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            dimension: None,
        }
    }

    /// Create an empty store that only accepts `dimension`-long vectors.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            entries: IndexMap::new(),
            dimension: Some(dimension),
        }
    }

    /// Add an embedding with its payload, returning the generated id.
    pub fn add(&mut self, embedding: Embedding, payload: P) -> Result<String> {
        self.insert_new(embedding, Some(payload))
    }

    /// Add an embedding without a payload, returning the generated id.
    pub fn add_embedding(&mut self, embedding: Embedding) -> Result<String> {
        self.insert_new(embedding, None)
    }

    /// Add an embedding under a caller-chosen id.
    ///
    /// An existing entry with the same id is replaced in place.
    pub fn add_with_id(
        &mut self,
        id: impl Into<String>,
        embedding: Embedding,
        payload: Option<P>,
    ) -> Result<()> {
        self.check_dimension(embedding.len())?;
        let id = id.into();
        self.commit(id, embedding, payload);
        Ok(())
    }

    /// Add several embeddings at once.
    ///
    /// Every vector is checked before anything is inserted, so a dimension
    /// error leaves the store untouched.
    pub fn add_all(&mut self, items: Vec<(Embedding, P)>) -> Result<Vec<String>> {
        let mut expected = self.dimension;
        for (embedding, _) in &items {
            match expected {
                Some(dim) if dim != embedding.len() => {
                    return Err(EmbeddingError::DimensionMismatch {
                        expected: dim,
                        actual: embedding.len(),
                    });
                }
                Some(_) => {}
                None => expected = Some(embedding.len()),
            }
        }

        let ids = items
            .into_iter()
            .map(|(embedding, payload)| {
                let id = Uuid::new_v4().to_string();
                self.commit(id.clone(), embedding, Some(payload));
                id
            })
            .collect::<Vec<_>>();

        info!("Added {} entries to in-memory store", ids.len());
        Ok(ids)
    }

    /// Remove an entry, keeping the order of the remaining ones.
    pub fn remove(&mut self, id: &str) -> Option<StoredEntry<P>> {
        self.entries.shift_remove(id)
    }

    /// Remove every listed id. Unknown ids are ignored.
    pub fn remove_all<S: AsRef<str>>(&mut self, ids: &[S]) -> usize {
        let mut removed = 0;
        for id in ids {
            let id: &str = id.as_ref();
            if self.entries.shift_remove(id).is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// Remove all entries. The dimension stays fixed.
    pub fn clear(&mut self) {
        self.entries.clear();
        info!("Cleared in-memory store");
    }

    pub fn get(&self, id: &str) -> Option<&StoredEntry<P>> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The vector length this store accepts, once known.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &StoredEntry<P>> {
        self.entries.values()
    }

    /// Iterate over payloads in insertion order, skipping bare embeddings.
    pub fn payloads(&self) -> impl Iterator<Item = &P> {
        self.entries.values().filter_map(|e| e.payload.as_ref())
    }

    /// Compute the cosine similarity between two stored entries.
    pub fn similarity(&self, id1: &str, id2: &str) -> Result<f32> {
        let entry1 = self
            .entries
            .get(id1)
            .ok_or_else(|| EmbeddingError::EntryNotFound(id1.to_string()))?;
        let entry2 = self
            .entries
            .get(id2)
            .ok_or_else(|| EmbeddingError::EntryNotFound(id2.to_string()))?;

        cosine_similarity(&entry1.embedding, &entry2.embedding)
    }

    fn insert_new(&mut self, embedding: Embedding, payload: Option<P>) -> Result<String> {
        self.check_dimension(embedding.len())?;
        let id = Uuid::new_v4().to_string();
        self.commit(id.clone(), embedding, payload);
        Ok(id)
    }

    fn check_dimension(&self, actual: usize) -> Result<()> {
        match self.dimension {
            Some(expected) if expected != actual => {
                Err(EmbeddingError::DimensionMismatch { expected, actual })
            }
            _ => Ok(()),
        }
    }

    fn commit(&mut self, id: String, embedding: Embedding, payload: Option<P>) {
        if self.dimension.is_none() {
            self.dimension = Some(embedding.len());
        }

        debug!("Added embedding to store: {id}");
        let entry = StoredEntry {
            id: id.clone(),
            embedding,
            payload,
        };
        self.entries.insert(id, entry);
    }
}

impl<P: Clone> InMemoryEmbeddingStore<P> {
    /// Find the entries most relevant to the request's query vector.
    ///
    /// Matches are ordered by descending score; equal scores keep insertion
    /// order.
    pub fn search(&self, request: &SearchRequest) -> Result<Vec<EmbeddingMatch<P>>> {
        self.check_dimension(request.query.len())?;

        let mut scored: Vec<(OrderedFloat<f32>, &StoredEntry<P>)> =
            Vec::with_capacity(self.entries.len());
        for entry in self.entries.values() {
            let score = relevance_score(cosine_similarity(&request.query, &entry.embedding)?);
            if score >= request.min_score {
                scored.push((OrderedFloat(score), entry));
            }
        }

        // Stable sort, so ties stay in insertion order
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let matches: Vec<EmbeddingMatch<P>> = scored
            .into_iter()
            .take(request.max_results)
            .map(|(score, entry)| EmbeddingMatch {
                score: score.0,
                id: entry.id.clone(),
                embedding: entry.embedding.clone(),
                payload: entry.payload.clone(),
            })
            .collect();

        debug!("Search returned {} matches", matches.len());
        Ok(matches)
    }
}

impl<P> Default for InMemoryEmbeddingStore<P> {
    fn default() -> Self {
        Self::new()
    }
}
