mod env;
mod types;


pub use types::*;

use std::path::Path;

use crate::error::ConfigError;
use crate::vault::{Secret, VaultProvider};

/// Vault keys searched for the provider API key, in order.
pub const API_KEY_VARS: [&str; 2] = ["EDUMATE_API_KEY", "GROQ_API_KEY"];

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str::<Self>(&content)?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.chunking;
        if c.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunking.chunk_size must be > 0".into()));
        }
        if c.chunk_overlap >= c.chunk_size {
            return Err(ConfigError::Invalid(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                c.chunk_overlap, c.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::Invalid("retrieval.top_k must be > 0".into()));
        }
        if self.session.history_limit == 0 {
            return Err(ConfigError::Invalid(
                "session.history_limit must be > 0".into(),
            ));
        }
        if self.embedding.dimensions == 0 {
            return Err(ConfigError::Invalid(
                "embedding.dimensions must be > 0".into(),
            ));
        }
        if self.embedding.backend == EmbeddingBackend::Provider
            && self.llm.embedding_model.is_none()
        {
            return Err(ConfigError::Invalid(
                "embedding.backend = \"provider\" requires llm.embedding_model".into(),
            ));
        }
        Ok(())
    }

    /// Resolve sensitive configuration values through the vault.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault backend fails.
    pub async fn resolve_secrets(&mut self, vault: &dyn VaultProvider) -> anyhow::Result<()> {
        for key in API_KEY_VARS {
            if let Some(val) = vault.get_secret(key).await? {
                tracing::debug!(key, "resolved API key");
                self.secrets.api_key = Some(Secret::new(val));
                break;
            }
        }
        Ok(())
    }
}
