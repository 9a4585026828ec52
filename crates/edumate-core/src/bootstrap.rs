//! Application bootstrap: config resolution, secrets, provider and engine construction.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use edumate_llm::{LlmProvider, RetryPolicy};
use edumate_llm::any::AnyProvider;
use edumate_llm::compatible::CompatibleProvider;
use edumate_llm::ollama::OllamaProvider;
use edumate_llm::openai::OpenAiProvider;
use edumate_memory::{AnyEmbedder, HashedEmbedder, ProviderEmbedder};

use crate::config::{API_KEY_VARS, Config, EmbeddingBackend, EmbeddingConfig, ProviderKind};
use crate::engine::StudyAssistant;
use crate::error::ConfigError;
use crate::vault::{EnvVaultProvider, VaultProvider};

pub const CONFIG_ENV_VAR: &str = "EDUMATE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

pub struct AppBuilder {
    config: Config,
    config_path: PathBuf,
}

impl AppBuilder {
    /// Load the config at `config_path` and resolve secrets from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be loaded or fails validation.
    pub async fn from_path(config_path: PathBuf) -> anyhow::Result<Self> {
        Self::with_vault(config_path, &EnvVaultProvider).await
    }

    /// Like [`Self::from_path`] with an explicit secret backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be loaded, fails validation or
    /// the vault lookup fails.
    pub async fn with_vault(
        config_path: PathBuf,
        vault: &dyn VaultProvider,
    ) -> anyhow::Result<Self> {
        let mut config = Config::load(&config_path)
            .with_context(|| format!("loading config from {}", config_path.display()))?;
        config.validate()?;
        config.resolve_secrets(vault).await?;
        tracing::debug!(path = %config_path.display(), "configuration loaded");

        Ok(Self {
            config,
            config_path,
        })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Construct the configured provider and probe it when it is local.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] if a remote provider has no key.
    pub async fn build_provider(&self) -> Result<AnyProvider, ConfigError> {
        let provider = create_provider(&self.config)?;
        health_check(&provider).await;
        Ok(provider)
    }

    /// Build the provider, then ingest and index the corpus.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be constructed or the index
    /// build fails.
    pub async fn build_assistant(&self) -> anyhow::Result<StudyAssistant<AnyProvider>> {
        let provider = self.build_provider().await?;
        let assistant = StudyAssistant::build(&self.config, provider)
            .await
            .context("building corpus index")?;
        Ok(assistant)
    }
}

/// Priority: `--config` argument > `EDUMATE_CONFIG` env var > `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.is_empty()
    {
        return PathBuf::from(path);
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

/// Instantiate the provider named by `config.llm.provider`.
///
/// # Errors
///
/// Returns [`ConfigError::MissingCredential`] if a remote provider has no
/// resolved API key.
pub fn create_provider(config: &Config) -> Result<AnyProvider, ConfigError> {
    let llm = &config.llm;
    match llm.provider {
        ProviderKind::Ollama => Ok(AnyProvider::Ollama(OllamaProvider::new(
            &llm.base_url,
            llm.model.clone(),
            llm.embedding_model.clone(),
        ))),
        ProviderKind::OpenAi => {
            let api_key = require_api_key(config, "openai")?;
            Ok(AnyProvider::OpenAi(OpenAiProvider::new(
                api_key,
                llm.base_url.clone(),
                llm.model.clone(),
                llm.max_tokens,
                llm.embedding_model.clone(),
            )))
        }
        ProviderKind::Compatible => {
            let api_key = require_api_key(config, &llm.name)?;
            Ok(AnyProvider::Compatible(CompatibleProvider::new(
                llm.name.clone(),
                api_key,
                llm.base_url.clone(),
                llm.model.clone(),
                llm.max_tokens,
                llm.embedding_model.clone(),
            )))
        }
    }
}

fn require_api_key(config: &Config, provider: &str) -> Result<String, ConfigError> {
    config
        .secrets
        .api_key
        .as_ref()
        .map(|key| key.expose().to_owned())
        .ok_or_else(|| ConfigError::MissingCredential {
            provider: provider.to_owned(),
            keys: API_KEY_VARS.join(" or "),
        })
}

/// Select the embedding backend; the provider backend shares `provider` and
/// retries transient failures under `policy`.
#[must_use]
pub fn create_embedder<P: LlmProvider>(
    config: &EmbeddingConfig,
    provider: Arc<P>,
    policy: RetryPolicy,
) -> AnyEmbedder<P> {
    match config.backend {
        EmbeddingBackend::Hashed => AnyEmbedder::Hashed(HashedEmbedder::new(config.dimensions)),
        EmbeddingBackend::Provider => {
            AnyEmbedder::Provider(ProviderEmbedder::new(provider, policy))
        }
    }
}

async fn health_check(provider: &AnyProvider) {
    if let AnyProvider::Ollama(ollama) = provider
        && let Err(e) = ollama.health_check().await
    {
        tracing::warn!("Ollama health check failed: {e}");
    }
}
