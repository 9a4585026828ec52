use std::str::FromStr;

use super::Config;

/// Parse an env var, warning and returning `None` when the value is malformed.
fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    if let Ok(v) = raw.trim().parse::<T>() {
        Some(v)
    } else {
        tracing::warn!("ignoring invalid {key} value: {raw}");
        None
    }
}

/// Parse a lowercase serde enum from an env var.
fn parse_env_enum<T: serde::de::DeserializeOwned>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    if let Ok(v) = serde_json::from_value(serde_json::Value::String(raw.trim().to_lowercase())) {
        Some(v)
    } else {
        tracing::warn!("ignoring invalid {key} value: {raw}");
        None
    }
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_llm();
        self.apply_env_overrides_pipeline();
    }

    fn apply_env_overrides_llm(&mut self) {
        if let Some(kind) = parse_env_enum("EDUMATE_LLM_PROVIDER") {
            self.llm.provider = kind;
        }
        if let Ok(v) = std::env::var("EDUMATE_LLM_NAME") {
            self.llm.name = v;
        }
        if let Ok(v) = std::env::var("EDUMATE_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("EDUMATE_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(n) = parse_env("EDUMATE_LLM_MAX_TOKENS") {
            self.llm.max_tokens = n;
        }
        if let Ok(v) = std::env::var("EDUMATE_LLM_EMBEDDING_MODEL") {
            self.llm.embedding_model = Some(v).filter(|m| !m.is_empty());
        }
        if let Some(n) = parse_env("EDUMATE_LLM_MAX_RETRIES") {
            self.llm.retry.max_retries = n;
        }
    }

    fn apply_env_overrides_pipeline(&mut self) {
        if let Ok(v) = std::env::var("EDUMATE_CORPUS_PATH") {
            self.corpus.path = v;
        }
        if let Some(n) = parse_env("EDUMATE_CORPUS_MAX_FILE_SIZE") {
            self.corpus.max_file_size = n;
        }
        if let Some(n) = parse_env("EDUMATE_CHUNK_SIZE") {
            self.chunking.chunk_size = n;
        }
        if let Some(n) = parse_env("EDUMATE_CHUNK_OVERLAP") {
            self.chunking.chunk_overlap = n;
        }
        if let Some(b) = parse_env("EDUMATE_CHUNK_BOUNDARY_AWARE") {
            self.chunking.boundary_aware = b;
        }
        if let Some(backend) = parse_env_enum("EDUMATE_EMBEDDING_BACKEND") {
            self.embedding.backend = backend;
        }
        if let Some(n) = parse_env("EDUMATE_EMBEDDING_DIMENSIONS") {
            self.embedding.dimensions = n;
        }
        if let Some(n) = parse_env("EDUMATE_RETRIEVAL_TOP_K") {
            self.retrieval.top_k = n;
        }
        if let Some(n) = parse_env("EDUMATE_SESSION_HISTORY_LIMIT") {
            self.session.history_limit = n;
        }
    }
}
