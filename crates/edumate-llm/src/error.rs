use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },

    #[error("{provider} request failed (status {status})")]
    Status { provider: String, status: u16 },

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("empty response from {provider}")]
    EmptyResponse { provider: String },

    #[error("embedding not supported by {provider}")]
    EmbedUnsupported { provider: String },

    #[error("{0}")]
    Other(String),
}

impl LlmError {
    /// Whether a retry has a chance of succeeding.
    ///
    /// Rate limits, server-side failures, timeouts and dropped connections are
    /// transient. Client errors, malformed payloads and capability mismatches
    /// are permanent and surface immediately.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.is_server_error())
            }
            Self::RateLimited { .. } | Self::Unavailable(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 408,
            Self::Json(_)
            | Self::EmptyResponse { .. }
            | Self::EmbedUnsupported { .. }
            | Self::Other(_) => false,
        }
    }

    /// Server-provided delay hint, if any.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Relabel provider-tagged variants, used by wrappers that reuse another
    /// backend's wire protocol under their own name.
    #[must_use]
    pub fn with_provider(self, name: &str) -> Self {
        match self {
            Self::Status { status, .. } => Self::Status {
                provider: name.to_owned(),
                status,
            },
            Self::EmptyResponse { .. } => Self::EmptyResponse {
                provider: name.to_owned(),
            },
            Self::EmbedUnsupported { .. } => Self::EmbedUnsupported {
                provider: name.to_owned(),
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;
