//! Conversational agent layer
//!
//! Features:
//! - Per-utterance turn controller with knowledge base retrieval
//! - Filler-phrase skip heuristic and context-enriched queries
//! - Layered system prompt composition (fixed directives + editable persona)
//! - Conversation transcript logging (text + JSON)
//! - Session composition over injected STT/LLM/TTS seams

pub mod history;
pub mod logger;
pub mod prompt;
pub mod session;
pub mod turn;

pub use history::RecentHistory;
pub use logger::ConversationLogger;
pub use prompt::{build_system_prompt, compose_system_prompt, load_persona, CORE_PROMPT};
pub use session::{Session, SessionConfig, TextToSpeech};
pub use turn::{
    build_contextual_query, should_query_knowledge_base, TurnController, TurnDisposition,
};

use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Logging error: {0}")]
    Logging(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("LLM error: {0}")]
    Llm(String),
}

impl From<AgentError> for aidy_core::Error {
    fn from(err: AgentError) -> Self {
        aidy_core::Error::Session(err.to_string())
    }
}

impl From<aidy_llm::LlmError> for AgentError {
    fn from(err: aidy_llm::LlmError) -> Self {
        AgentError::Llm(err.to_string())
    }
}
