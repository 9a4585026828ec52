//! Generation client abstraction and provider backends.

pub mod any;
pub mod client;
pub mod compatible;
pub mod error;
pub mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod retry;

pub use client::{Completion, GenerationClient};
pub use error::LlmError;
pub use provider::LlmProvider;
pub use retry::RetryPolicy;

#[cfg(test)]
pub(crate) mod testing;
