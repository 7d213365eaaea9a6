//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{endpoints, env_keys, rag};
use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// HTTP control plane configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Retrieval engine configuration
    #[serde(default)]
    pub rag: RagConfig,

    /// Language model configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Filesystem paths
    #[serde(default)]
    pub paths: PathsConfig,

    /// Logging configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rag.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rag.top_k".to_string(),
                message: "top_k must be at least 1".to_string(),
            });
        }

        if self.rag.vector_dim == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rag.vector_dim".to_string(),
                message: "vector_dim must be non-zero".to_string(),
            });
        }

        if !(0.0..=100.0).contains(&self.rag.breakpoint_percentile) {
            return Err(ConfigError::InvalidValue {
                field: "rag.breakpoint_percentile".to_string(),
                message: format!(
                    "Must be between 0.0 and 100.0, got {}",
                    self.rag.breakpoint_percentile
                ),
            });
        }

        if self.llm.max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "llm.max_tokens".to_string(),
                message: "max_tokens must be non-zero".to_string(),
            });
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Command used to spawn the voice-session worker process
    #[serde(default = "default_agent_command")]
    pub agent_command: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            agent_command: default_agent_command(),
        }
    }
}

fn default_port() -> u16 {
    8000
}

fn default_true() -> bool {
    true
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://localhost:3000".to_string(),
    ]
}

fn default_agent_command() -> String {
    "aidy-session".to_string()
}

/// Retrieval engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Qdrant endpoint URL
    #[serde(default = "default_qdrant_endpoint")]
    pub qdrant_endpoint: String,

    /// Qdrant collection name
    #[serde(default = "default_qdrant_collection")]
    pub qdrant_collection: String,

    /// Embedding dimension; an existing collection with a different
    /// dimension is dropped and recreated on connect
    #[serde(default = "default_vector_dim")]
    pub vector_dim: usize,

    /// Top-K fragments per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Embedding model name
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Embeddings API endpoint
    #[serde(default = "default_embeddings_endpoint")]
    pub embeddings_endpoint: String,

    /// Percentile threshold for semantic chunk breakpoints
    #[serde(default = "default_breakpoint_percentile")]
    pub breakpoint_percentile: f32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            qdrant_endpoint: default_qdrant_endpoint(),
            qdrant_collection: default_qdrant_collection(),
            vector_dim: default_vector_dim(),
            top_k: default_top_k(),
            embedding_model: default_embedding_model(),
            embeddings_endpoint: default_embeddings_endpoint(),
            breakpoint_percentile: default_breakpoint_percentile(),
        }
    }
}

fn default_qdrant_endpoint() -> String {
    endpoints::QDRANT_DEFAULT.to_string()
}

fn default_qdrant_collection() -> String {
    "knowledge-base".to_string()
}

fn default_vector_dim() -> usize {
    rag::DEFAULT_VECTOR_DIM
}

fn default_top_k() -> usize {
    rag::TOP_K
}

fn default_embedding_model() -> String {
    "gemini-embedding-001".to_string()
}

fn default_embeddings_endpoint() -> String {
    endpoints::GEMINI_DEFAULT.to_string()
}

fn default_breakpoint_percentile() -> f32 {
    rag::BREAKPOINT_PERCENTILE
}

/// Language model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Chat completions endpoint (OpenAI-compatible)
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    /// Model used for answer synthesis in the retrieval engine
    #[serde(default = "default_synthesis_model")]
    pub synthesis_model: String,

    /// Model used for spoken reply generation
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Maximum tokens per generation
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            synthesis_model: default_synthesis_model(),
            chat_model: default_chat_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_seconds: default_llm_timeout(),
        }
    }
}

fn default_llm_endpoint() -> String {
    endpoints::CEREBRAS_DEFAULT.to_string()
}

fn default_synthesis_model() -> String {
    "llama-3.3-70b".to_string()
}

fn default_chat_model() -> String {
    "llama3.1-8b".to_string()
}

fn default_max_tokens() -> usize {
    256
}

fn default_temperature() -> f32 {
    0.7
}

fn default_llm_timeout() -> u64 {
    30
}

/// Filesystem paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory of seed documents for batch ingestion
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Directory where uploaded files are stored
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: String,

    /// User-editable persona prompt file
    #[serde(default = "default_prompt_file")]
    pub prompt_file: String,

    /// Persisted document metadata (JSON, keyed by document id)
    #[serde(default = "default_metadata_file")]
    pub metadata_file: String,

    /// Conversation transcript directory
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            uploads_dir: default_uploads_dir(),
            prompt_file: default_prompt_file(),
            metadata_file: default_metadata_file(),
            log_dir: default_log_dir(),
        }
    }
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_uploads_dir() -> String {
    "uploads".to_string()
}

fn default_prompt_file() -> String {
    "prompt/prompt.md".to_string()
}

fn default_metadata_file() -> String {
    "rag_metadata/docs_metadata.json".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON-formatted logs
    #[serde(default)]
    pub log_json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Hosted-provider credentials resolved from the environment
///
/// Construction fails when a required key is absent; this is the only error
/// allowed to abort startup.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Gemini embeddings API key
    pub embeddings_api_key: String,
    /// Cerebras LLM API key
    pub llm_api_key: String,
    /// Qdrant API key (cloud deployments only)
    pub qdrant_api_key: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        let embeddings_api_key = require_env(env_keys::EMBEDDINGS_API_KEY)?;
        let llm_api_key = require_env(env_keys::LLM_API_KEY)?;
        let qdrant_api_key = std::env::var(env_keys::VECTOR_STORE_API_KEY)
            .ok()
            .filter(|v| !v.is_empty());

        Ok(Self {
            embeddings_api_key,
            llm_api_key,
            qdrant_api_key,
        })
    }
}

fn require_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingCredential(name.to_string()))
}

/// Load settings from files and environment
///
/// Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("AIDY")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.rag.top_k, 5);
        assert_eq!(settings.rag.vector_dim, 3072);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_top_k() {
        let mut settings = Settings::default();
        settings.rag.top_k = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_percentile() {
        let mut settings = Settings::default();
        settings.rag.breakpoint_percentile = 120.0;
        assert!(settings.validate().is_err());
    }
}
