//! Corpus ingestion, chunking, embedding, the vector index and session memory.

pub mod document;
pub mod embedding;
pub mod error;
pub mod index;
pub mod session;

pub use document::{Chunk, Corpus, Document, IngestReport, SplitterConfig, TextSplitter};
pub use embedding::{AnyEmbedder, Embedder, HashedEmbedder, ProviderEmbedder};
pub use error::MemoryError;
pub use index::{ScoredChunk, VectorIndex};
pub use session::{SessionGuard, SessionStore, Turn};
