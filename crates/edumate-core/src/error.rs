use std::path::PathBuf;

use edumate_llm::LlmError;
use edumate_memory::MemoryError;
use edumate_memory::document::DocumentError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("{provider} requires an API key; set {keys}")]
    MissingCredential { provider: String, keys: String },
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    #[error("generation failed: {0}")]
    Generation(#[from] LlmError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
