//! Text-to-vector functions shared by indexing and querying.

use std::future::Future;
use std::sync::{Arc, OnceLock};

use edumate_llm::LlmProvider;
use edumate_llm::retry::{RetryPolicy, retry_transient};

use crate::error::MemoryError;

/// Default width of [`HashedEmbedder`] vectors.
pub const DEFAULT_DIMENSIONS: usize = 384;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "do", "does", "for", "from", "how", "in",
    "is", "it", "of", "on", "or", "that", "the", "this", "to", "was", "what", "when", "where",
    "which", "who", "why", "with",
];

pub trait Embedder: Send + Sync {
    /// Embed `text`. The same function must be used for chunks and queries.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or returns a vector of unexpected width.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, MemoryError>> + Send;

    /// Vector width, if known before the first call.
    fn dimensions(&self) -> Option<usize>;

    fn name(&self) -> &str;
}

/// Deterministic offline embedder based on feature hashing.
///
/// Each lower-cased alphanumeric token (minus a short stopword list) is hashed
/// with blake3 into a signed bucket; the result is L2-normalised so cosine
/// similarity reduces to a dot product.
#[derive(Debug, Clone, Copy)]
pub struct HashedEmbedder {
    dimensions: usize,
}

impl HashedEmbedder {
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    #[must_use]
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let lowered = text.to_lowercase();
        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty() && !STOPWORDS.contains(t))
        {
            let hash = blake3::hash(token.as_bytes());
            let bytes = hash.as_bytes();
            let mut index_bytes = [0u8; 8];
            index_bytes.copy_from_slice(&bytes[..8]);
            #[expect(clippy::cast_possible_truncation)]
            let bucket = (u64::from_le_bytes(index_bytes) % self.dimensions as u64) as usize;
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        normalize(&mut vector);
        vector
    }
}

impl Default for HashedEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl Embedder for HashedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        Ok(self.embed_sync(text))
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.dimensions)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "hashed"
    }
}

/// Delegates to the provider's embedding endpoint.
///
/// Transient provider errors are retried under the same policy as generation.
/// The width of the first vector returned is pinned; later vectors of a
/// different width are rejected.
#[derive(Debug)]
pub struct ProviderEmbedder<P> {
    provider: Arc<P>,
    policy: RetryPolicy,
    dimensions: OnceLock<usize>,
}

impl<P: LlmProvider> ProviderEmbedder<P> {
    #[must_use]
    pub fn new(provider: Arc<P>, policy: RetryPolicy) -> Self {
        Self {
            provider,
            policy,
            dimensions: OnceLock::new(),
        }
    }
}

impl<P: LlmProvider> Embedder for ProviderEmbedder<P> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        let vector =
            retry_transient(self.provider.name(), &self.policy, || self.provider.embed(text))
                .await?;
        let expected = *self.dimensions.get_or_init(|| vector.len());
        if vector.len() != expected {
            return Err(MemoryError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }

    fn dimensions(&self) -> Option<usize> {
        self.dimensions.get().copied()
    }

    fn name(&self) -> &str {
        self.provider.name()
    }
}

/// Runtime choice between the embedding backends.
#[derive(Debug)]
pub enum AnyEmbedder<P> {
    Hashed(HashedEmbedder),
    Provider(ProviderEmbedder<P>),
}

impl<P: LlmProvider> Embedder for AnyEmbedder<P> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        match self {
            Self::Hashed(e) => e.embed(text).await,
            Self::Provider(e) => e.embed(text).await,
        }
    }

    fn dimensions(&self) -> Option<usize> {
        match self {
            Self::Hashed(e) => e.dimensions(),
            Self::Provider(e) => e.dimensions(),
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Hashed(e) => e.name(),
            Self::Provider(e) => e.name(),
        }
    }
}

fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}
