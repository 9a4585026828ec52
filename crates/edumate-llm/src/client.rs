use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message};
use crate::retry::{RetryPolicy, retry_transient};

/// Normalized generation result, independent of the backend's response shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
}

/// Sends a fully rendered prompt to a provider and returns its text.
///
/// Transient failures (rate limits, 5xx, timeouts, connection errors) are
/// retried according to the configured [`RetryPolicy`]; anything else is
/// surfaced on the first attempt.
#[derive(Debug)]
pub struct GenerationClient<P> {
    provider: Arc<P>,
    policy: RetryPolicy,
}

impl<P> Clone for GenerationClient<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            policy: self.policy,
        }
    }
}

impl<P: LlmProvider> GenerationClient<P> {
    #[must_use]
    pub fn new(provider: P, policy: RetryPolicy) -> Self {
        Self {
            provider: Arc::new(provider),
            policy,
        }
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Handle on the provider for components that share it, such as an
    /// embedder backed by the same endpoint.
    #[must_use]
    pub fn shared_provider(&self) -> Arc<P> {
        Arc::clone(&self.provider)
    }

    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Generate a completion for a single user-role prompt.
    ///
    /// # Errors
    ///
    /// Returns the provider error once retries are exhausted or on the first
    /// permanent failure.
    pub async fn generate(&self, prompt: &str) -> Result<Completion, LlmError> {
        self.generate_messages(&[Message::user(prompt)]).await
    }

    /// Generate a completion for an explicit message list.
    ///
    /// # Errors
    ///
    /// See [`GenerationClient::generate`].
    pub async fn generate_messages(&self, messages: &[Message]) -> Result<Completion, LlmError> {
        let name = self.provider.name();
        let started = std::time::Instant::now();
        let text = retry_transient(name, &self.policy, || self.provider.chat(messages)).await?;
        tracing::debug!(
            provider = name,
            chars = text.chars().count(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "generation complete"
        );
        Ok(Completion { text })
    }
}
