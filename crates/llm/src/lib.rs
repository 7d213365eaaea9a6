//! Hosted LLM backends
//!
//! Provides the `LlmBackend` trait plus the Cerebras implementation
//! (OpenAI-compatible chat completions). Used in two places:
//! - the retrieval engine, for strict grounded answer synthesis
//! - the session composer, for spoken reply generation

pub mod backend;
pub mod cerebras;

pub use backend::{BackendConfig, FinishReason, GenerationResult, LlmBackend};
pub use cerebras::CerebrasBackend;

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Request error: {0}")]
    Request(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Response parse error: {0}")]
    Parse(String),
}

impl From<LlmError> for aidy_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Configuration(msg) => aidy_core::Error::Configuration(msg),
            other => aidy_core::Error::Llm(other.to_string()),
        }
    }
}
