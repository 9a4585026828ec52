//! Immutable in-memory similarity index over embedded chunks.
//!
//! The index is built once from the whole corpus and only answers queries.
//! Adding or removing content means building a new index.

use crate::document::Chunk;
use crate::embedding::Embedder;
use crate::error::MemoryError;

#[derive(Debug, Clone)]
struct IndexEntry {
    chunk: Chunk,
    vector: Vec<f32>,
}

/// A chunk paired with its similarity to the query.
#[derive(Debug, Clone, Copy)]
pub struct ScoredChunk<'a> {
    pub chunk: &'a Chunk,
    pub score: f32,
}

#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dimensions: usize,
}

impl VectorIndex {
    /// Build an index from pre-computed vectors.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::DimensionMismatch`] if the vectors do not all
    /// share one width.
    pub fn build(items: Vec<(Chunk, Vec<f32>)>) -> Result<Self, MemoryError> {
        let dimensions = items.first().map_or(0, |(_, v)| v.len());
        let mut entries = Vec::with_capacity(items.len());
        for (chunk, vector) in items {
            if vector.len() != dimensions {
                return Err(MemoryError::DimensionMismatch {
                    expected: dimensions,
                    actual: vector.len(),
                });
            }
            entries.push(IndexEntry { chunk, vector });
        }
        Ok(Self {
            entries,
            dimensions,
        })
    }

    /// Embed every chunk with `embedder` and build the index.
    ///
    /// # Errors
    ///
    /// Returns the first embedding failure or a dimension mismatch.
    pub async fn from_chunks<E: Embedder>(
        chunks: Vec<Chunk>,
        embedder: &E,
    ) -> Result<Self, MemoryError> {
        let start = std::time::Instant::now();
        let total = chunks.len();
        let mut items = Vec::with_capacity(total);
        for chunk in chunks {
            let vector = embedder.embed(&chunk.content).await?;
            items.push((chunk, vector));
        }
        let index = Self::build(items)?;
        tracing::info!(
            chunks = total,
            dimensions = index.dimensions,
            embedder = embedder.name(),
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "vector index built"
        );
        Ok(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }

    /// Return up to `k` chunks by descending cosine similarity.
    ///
    /// No score threshold is applied. Equal scores keep insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::DimensionMismatch`] if the query width differs
    /// from the indexed vectors.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk<'_>>, MemoryError> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(MemoryError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }

        let mut scored: Vec<ScoredChunk<'_>> = self
            .entries
            .iter()
            .map(|e| ScoredChunk {
                chunk: &e.chunk,
                score: cosine_similarity(query, &e.vector),
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
