//! Shared startup plumbing for the control plane and session worker
//!
//! Both binaries resolve the same configuration, credentials and hosted
//! providers; the wiring lives here so they cannot drift apart.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use aidy_config::{Credentials, Settings};
use aidy_llm::backend::BackendConfig;
use aidy_llm::CerebrasBackend;
use aidy_rag::{
    AnswerSynthesizer, ChunkConfig, EmbeddingConfig, EngineConfig, GeminiEmbedder, MetadataStore,
    RagEngine, SemanticChunker, VectorStore, VectorStoreConfig,
};

/// Initialize the tracing subscriber from config and RUST_LOG
pub fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("aidy={},tower_http=debug", config.observability.log_level).into()
    });

    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Build the retrieval engine against the hosted providers
pub async fn build_engine(
    config: &Settings,
    credentials: &Credentials,
) -> anyhow::Result<RagEngine> {
    let embedder = GeminiEmbedder::new(
        &config.rag.embeddings_endpoint,
        &config.rag.embedding_model,
        &credentials.embeddings_api_key,
        EmbeddingConfig {
            embedding_dim: config.rag.vector_dim,
            ..Default::default()
        },
    )?;

    let store = VectorStore::new(VectorStoreConfig {
        endpoint: config.rag.qdrant_endpoint.clone(),
        collection: config.rag.qdrant_collection.clone(),
        vector_dim: config.rag.vector_dim,
        api_key: credentials.qdrant_api_key.clone(),
    })
    .await?;

    let metadata = MetadataStore::open(&config.paths.metadata_file)?;

    let backend = CerebrasBackend::new(
        BackendConfig::new(&credentials.llm_api_key)
            .with_endpoint(&config.llm.endpoint)
            .with_model(&config.llm.synthesis_model)
            .with_max_tokens(config.llm.max_tokens)
            .with_temperature(config.llm.temperature)
            .with_timeout(Duration::from_secs(config.llm.timeout_seconds)),
    )?;
    let synthesizer = AnswerSynthesizer::new(Arc::new(backend));

    let chunker = SemanticChunker::new(ChunkConfig {
        breakpoint_percentile: config.rag.breakpoint_percentile,
        ..Default::default()
    });

    let engine = RagEngine::new(
        EngineConfig {
            top_k: config.rag.top_k,
            ..Default::default()
        },
        Arc::new(embedder),
        Arc::new(store),
        metadata,
        synthesizer,
        chunker,
    );

    engine.connect().await?;
    tracing::info!(
        endpoint = %config.rag.qdrant_endpoint,
        collection = %config.rag.qdrant_collection,
        "Retrieval engine ready"
    );

    Ok(engine)
}

/// Build the backend used for spoken reply generation
pub fn build_chat_backend(
    config: &Settings,
    credentials: &Credentials,
) -> anyhow::Result<CerebrasBackend> {
    Ok(CerebrasBackend::new(
        BackendConfig::new(&credentials.llm_api_key)
            .with_endpoint(&config.llm.endpoint)
            .with_model(&config.llm.chat_model)
            .with_max_tokens(config.llm.max_tokens)
            .with_temperature(config.llm.temperature)
            .with_timeout(Duration::from_secs(config.llm.timeout_seconds)),
    )?)
}
