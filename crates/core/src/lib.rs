//! Core types and traits for the voice orchestration layer
//!
//! This crate provides the foundational types shared across all other crates:
//! - Error taxonomy and `Result` alias
//! - Conversation state types (roles, messages, chat context)
//! - Finalized-utterance transcript types
//! - Retrieval data model (documents, sources, outcomes)
//! - Frontend notification events
//! - Traits for pluggable backends (knowledge base, notification channel,
//!   transcript sink)

pub mod conversation;
pub mod events;
pub mod retrieval;
pub mod traits;
pub mod transcript;

pub use conversation::{is_knowledge_injection, ChatContext, Message, Role, KNOWLEDGE_PREFIX};
pub use events::NotificationEvent;
pub use retrieval::{DocumentRecord, DocumentStatus, RetrievalOutcome, RetrievedSource};
pub use traits::{KnowledgeBase, NotificationChannel, TranscriptSink};
pub use transcript::{FinalizedUtterance, TranscriptSegment};

use thiserror::Error;

/// Top-level error type
///
/// Only `Configuration` is allowed to abort a process. Everything else is
/// contained at the boundary where it occurs: retrieval failures degrade the
/// turn, notification failures are swallowed after logging, and an unknown
/// document id on delete is a boolean outcome rather than an error.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing credentials or invalid config - fatal at startup
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A document could not be read or parsed during ingestion
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// Query-time knowledge base failure - the turn proceeds ungrounded
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Side-channel send failure - logged and swallowed
    #[error("Notification error: {0}")]
    Notification(String),

    /// Language model backend failure
    #[error("LLM error: {0}")]
    Llm(String),

    /// Session lifecycle failure
    #[error("Session error: {0}")]
    Session(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias using the core error type
pub type Result<T> = std::result::Result<T, Error>;
