//! Top-k similarity retrieval over the corpus index.

use edumate_memory::{Chunk, Embedder, ScoredChunk, VectorIndex};

use crate::error::Result;

/// Separator between chunk texts in assembled prompt context.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Embeds queries with the same function used for the index and returns
/// the `top_k` nearest chunks.
///
/// No score threshold is applied: the nearest chunks come back even when
/// none of them is on topic.
pub struct Retriever<'a, E> {
    index: &'a VectorIndex,
    embedder: &'a E,
    top_k: usize,
}

impl<'a, E: Embedder> Retriever<'a, E> {
    #[must_use]
    pub fn new(index: &'a VectorIndex, embedder: &'a E, top_k: usize) -> Self {
        Self {
            index,
            embedder,
            top_k,
        }
    }

    #[must_use]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Chunks with their cosine scores, best first.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding the query fails or its width does not
    /// match the index.
    pub async fn retrieve_with_scores(&self, query: &str) -> Result<Vec<ScoredChunk<'a>>> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }
        let vector = self.embedder.embed(query).await?;
        let hits = self.index.search(&vector, self.top_k)?;
        tracing::debug!(
            hits = hits.len(),
            top_score = hits.first().map(|h| h.score),
            "retrieved chunks"
        );
        Ok(hits)
    }

    /// At most `top_k` chunks by descending similarity to `query`.
    ///
    /// # Errors
    ///
    /// See [`Self::retrieve_with_scores`].
    pub async fn retrieve(&self, query: &str) -> Result<Vec<Chunk>> {
        Ok(self
            .retrieve_with_scores(query)
            .await?
            .into_iter()
            .map(|hit| hit.chunk.clone())
            .collect())
    }

    /// Retrieved chunk texts joined by a blank line.
    ///
    /// # Errors
    ///
    /// See [`Self::retrieve_with_scores`].
    pub async fn context(&self, query: &str) -> Result<String> {
        let hits = self.retrieve_with_scores(query).await?;
        Ok(hits
            .iter()
            .map(|hit| hit.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR))
    }
}
