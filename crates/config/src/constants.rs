//! Centralized constants
//!
//! Single source of truth for fixed sentences, retrieval limits and default
//! endpoints used across the codebase.

/// Service endpoints (defaults for local development)
pub mod endpoints {
    /// Qdrant vector store endpoint (REST API port)
    pub const QDRANT_DEFAULT: &str = "http://127.0.0.1:6333";

    /// Cerebras OpenAI-compatible chat completions API
    pub const CEREBRAS_DEFAULT: &str = "https://api.cerebras.ai/v1";

    /// Google Generative Language API (Gemini embeddings)
    pub const GEMINI_DEFAULT: &str = "https://generativelanguage.googleapis.com/v1beta";
}

/// Retrieval parameters
pub mod rag {
    /// Top-K fragments retrieved per query
    pub const TOP_K: usize = 5;

    /// Maximum characters in a source preview before truncation
    pub const PREVIEW_MAX_CHARS: usize = 300;

    /// Decimal places for similarity scores in source previews
    pub const SCORE_DECIMALS: u32 = 3;

    /// Default embedding dimension (gemini-embedding-001)
    pub const DEFAULT_VECTOR_DIM: usize = 3072;

    /// Percentile threshold for semantic chunk breakpoints
    pub const BREAKPOINT_PERCENTILE: f32 = 95.0;
}

/// Fixed user-visible sentences
///
/// These are contract text: tests and the frontend rely on the exact
/// wording, so change them only deliberately.
pub mod sentences {
    /// Returned by `query` when the knowledge base holds no documents
    pub const EMPTY_KB: &str = "Knowledge base is empty. Please upload documents first.";

    /// Answer text of `query_with_sources` on an empty knowledge base
    pub const EMPTY_KB_SHORT: &str = "Knowledge base is empty.";

    /// Emitted by the synthesis layer when retrieved context is insufficient
    pub const NOT_IN_DOCUMENTS: &str =
        "This information is not available in the provided documents.";

    /// Spoken refusal when the agent has no grounded answer
    pub const SPOKEN_REFUSAL: &str = "I don't have that information right now.";
}

/// Prompt layer defaults
pub mod prompts {
    /// Fallback persona when the prompt file is missing or empty
    pub const DEFAULT_PERSONA: &str = "You are a helpful voice assistant.";
}

/// Environment variable names for hosted-provider credentials
pub mod env_keys {
    /// Gemini embeddings API key (required)
    pub const EMBEDDINGS_API_KEY: &str = "GOOGLE_API_KEY";

    /// Cerebras LLM API key (required)
    pub const LLM_API_KEY: &str = "CEREBRAS_API_KEY";

    /// Qdrant API key (optional, cloud deployments only)
    pub const VECTOR_STORE_API_KEY: &str = "QDRANT_API_KEY";
}
