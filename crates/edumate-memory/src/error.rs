#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("LLM error: {0}")]
    Llm(#[from] edumate_llm::LlmError),

    #[error("document error: {0}")]
    Document(#[from] crate::document::DocumentError),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("{0}")]
    Other(String),
}
