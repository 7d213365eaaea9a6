//! Retrieval engine for the voice orchestration layer
//!
//! Features:
//! - Semantic chunking with embedding-similarity breakpoints
//! - Dense vector search via Qdrant
//! - Hosted Gemini embeddings (deterministic hash embedder for tests)
//! - Strict grounded answer synthesis via a hosted LLM
//! - Persisted document metadata with atomic rewrite
//! - Core KnowledgeBase trait implementation

pub mod chunker;
pub mod embeddings;
pub mod engine;
pub mod metadata;
pub mod reader;
pub mod synthesis;
pub mod vector_store;

pub use chunker::{ChunkConfig, SemanticChunker};
pub use embeddings::{Embedder, EmbeddingConfig, GeminiEmbedder, HashEmbedder};
pub use engine::{EngineConfig, RagEngine};
pub use metadata::MetadataStore;
pub use synthesis::AnswerSynthesizer;
pub use vector_store::{
    Fragment, FragmentHit, FragmentIndex, MemoryIndex, VectorStore, VectorStoreConfig,
};

use thiserror::Error;

/// Retrieval engine errors
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

impl From<RagError> for aidy_core::Error {
    fn from(err: RagError) -> Self {
        match err {
            RagError::Ingestion(msg) => aidy_core::Error::Ingestion(msg),
            RagError::Connection(msg) => aidy_core::Error::Configuration(msg),
            other => aidy_core::Error::Retrieval(other.to_string()),
        }
    }
}
