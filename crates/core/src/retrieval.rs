//! Retrieval data model
//!
//! Shared types for the knowledge base: tracked documents, ranked retrieval
//! sources and the combined answer/sources outcome.

use serde::{Deserialize, Serialize};

/// Indexing status of a tracked document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Fragments are embedded and searchable
    #[default]
    Indexed,
    /// Ingestion accepted but not yet searchable
    Pending,
    /// Ingestion failed
    Failed,
}

/// Metadata for one retrievable document
///
/// `id` is server-generated and unique across the live collection; once a
/// document is deleted the id is not reused within the same session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    /// Display name (the original upload filename)
    pub filename: String,
    /// Source location; only meaningful during ingestion
    pub filepath: String,
    /// Number of index fragments produced from this document
    #[serde(default)]
    pub chunk_count: usize,
    #[serde(default)]
    pub status: DocumentStatus,
}

/// One ranked source fragment backing a retrieved answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedSource {
    /// Fragment preview, truncated to 300 characters with an ellipsis suffix
    pub text: String,
    /// Similarity score rounded to 3 decimals, when the store reports one
    pub score: Option<f32>,
    /// Display name of the owning document
    pub filename: String,
    /// Id of the owning document
    pub doc_id: String,
}

/// Answer text plus the ranked sources it was grounded in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalOutcome {
    pub answer: String,
    pub sources: Vec<RetrievedSource>,
}

impl RetrievalOutcome {
    pub fn new(answer: impl Into<String>, sources: Vec<RetrievedSource>) -> Self {
        Self {
            answer: answer.into(),
            sources,
        }
    }

    /// Outcome with no supporting sources
    pub fn unsourced(answer: impl Into<String>) -> Self {
        Self::new(answer, Vec::new())
    }
}
