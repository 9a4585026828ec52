use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::LlmError;

/// Bounded exponential backoff with jitter for transient provider failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Upper bound of the delay before retry number `attempt + 1`.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Backoff with "equal jitter": uniformly drawn from `[ceiling / 2, ceiling]`.
    #[must_use]
    pub fn jittered(&self, attempt: u32) -> Duration {
        let ceiling = u64::try_from(self.backoff(attempt).as_millis()).unwrap_or(u64::MAX);
        if ceiling == 0 {
            return Duration::ZERO;
        }
        let floor = ceiling - ceiling / 2;
        Duration::from_millis(rand::thread_rng().gen_range(floor..=ceiling))
    }
}

/// Parse the `Retry-After` header value as whole seconds.
pub(crate) fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Run `f`, retrying up to `policy.max_retries` times while the error is transient.
///
/// A server-provided `Retry-After` hint wins over the computed backoff but is
/// still capped at `policy.max_delay`.
///
/// # Errors
///
/// Returns the first permanent error, or the last transient one once all
/// attempts are exhausted.
pub async fn retry_transient<T, F, Fut>(
    provider_name: &str,
    policy: &RetryPolicy,
    mut f: F,
) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                let delay = e
                    .retry_after()
                    .map_or_else(|| policy.jittered(attempt), |d| d.min(policy.max_delay));
                tracing::warn!(
                    provider = provider_name,
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "transient provider failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
