//! Traits for pluggable backends
//!
//! These seams exist so the turn controller depends on constructor-injected
//! handles rather than concrete services:
//! - `KnowledgeBase`: the retrieval engine contract
//! - `NotificationChannel`: best-effort frontend side-channel
//! - `TranscriptSink`: append-only conversation log
//!
//! All are object-safe and async so implementations can suspend on I/O
//! without blocking the audio turn loop.

use async_trait::async_trait;

use crate::events::NotificationEvent;
use crate::retrieval::RetrievalOutcome;
use crate::Result;

/// Query interface of the retrieval engine as seen by the turn controller
///
/// Implementations must tolerate concurrent queries from independent
/// sessions. An empty knowledge base is an `Ok` outcome carrying the fixed
/// empty-knowledge-base sentence, never an error.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Query and return only the synthesized answer text
    async fn query(&self, question: &str) -> Result<String>;

    /// Query and return the answer plus ranked source fragments
    async fn query_with_sources(&self, question: &str) -> Result<RetrievalOutcome>;
}

/// Best-effort delivery channel towards the frontend
///
/// Send failures are reported so the caller can log them, but by contract a
/// broken channel must never abort the turn that emitted the event.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, event: &NotificationEvent) -> Result<()>;
}

/// Append-only conversation log sink
///
/// Append order is guaranteed to match call order within one session.
#[async_trait]
pub trait TranscriptSink: Send + Sync {
    async fn log_user(&self, message: &str) -> Result<()>;

    async fn log_agent(&self, message: &str) -> Result<()>;

    /// Record a system event (retrieval failure, session marker)
    async fn log_system(&self, event: &str) -> Result<()>;
}
