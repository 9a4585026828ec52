//! Configuration, retrieval, prompt synthesis and the study assistant engine.

pub mod bootstrap;
pub mod config;
pub mod engine;
pub mod error;
pub mod prompt;
pub mod retriever;
pub mod vault;

pub use config::Config;
pub use engine::{StudyAssistant, TaskRequest};
pub use error::{ConfigError, CoreError};
pub use retriever::Retriever;
