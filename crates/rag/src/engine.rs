//! Retrieval engine
//!
//! Orchestrates the full document lifecycle: read, chunk, embed, index,
//! search, synthesize. Mutations (add/delete/clear) are serialized behind a
//! single async mutex so the metadata registry and the vector index never
//! diverge under concurrent writers; queries run without the lock.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use aidy_config::constants::{rag as rag_limits, sentences};
use aidy_core::retrieval::{DocumentRecord, DocumentStatus, RetrievalOutcome, RetrievedSource};
use aidy_core::traits::KnowledgeBase;

use crate::chunker::SemanticChunker;
use crate::embeddings::Embedder;
use crate::metadata::MetadataStore;
use crate::reader;
use crate::synthesis::AnswerSynthesizer;
use crate::vector_store::{Fragment, FragmentHit, FragmentIndex};
use crate::RagError;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Fragments retrieved per query
    pub top_k: usize,
    /// Source preview truncation limit (characters)
    pub preview_max_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_k: rag_limits::TOP_K,
            preview_max_chars: rag_limits::PREVIEW_MAX_CHARS,
        }
    }
}

/// Document retrieval engine
pub struct RagEngine {
    config: EngineConfig,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn FragmentIndex>,
    metadata: MetadataStore,
    synthesizer: AnswerSynthesizer,
    chunker: SemanticChunker,
    write_lock: Mutex<()>,
}

impl RagEngine {
    pub fn new(
        config: EngineConfig,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn FragmentIndex>,
        metadata: MetadataStore,
        synthesizer: AnswerSynthesizer,
        chunker: SemanticChunker,
    ) -> Self {
        Self {
            config,
            embedder,
            index,
            metadata,
            synthesizer,
            chunker,
            write_lock: Mutex::new(()),
        }
    }

    /// Prepare the fragment index (create or reconcile the collection)
    pub async fn connect(&self) -> Result<(), RagError> {
        self.index.ensure_ready().await
    }

    /// Ingest one document and return its generated id
    ///
    /// `display_name` is what list/delete responses and source previews show;
    /// `path` is where the bytes live right now.
    pub async fn add_document(
        &self,
        path: &Path,
        display_name: &str,
    ) -> Result<String, RagError> {
        let _guard = self.write_lock.lock().await;

        let content = reader::read_document(path).await?;
        let chunks = self.chunker.chunk(&content, self.embedder.as_ref()).await?;

        if chunks.is_empty() {
            return Err(RagError::Ingestion(format!(
                "No indexable content in {}",
                display_name
            )));
        }

        let doc_id = Uuid::new_v4().simple().to_string()[..8].to_string();

        let fragments: Vec<Fragment> = chunks
            .iter()
            .map(|chunk| Fragment {
                id: Uuid::new_v4().to_string(),
                content: chunk.clone(),
                filename: display_name.to_string(),
                doc_id: doc_id.clone(),
            })
            .collect();

        let embeddings = self.embedder.embed_batch(&chunks).await?;
        self.index.upsert(&fragments, &embeddings).await?;

        self.metadata.insert(DocumentRecord {
            id: doc_id.clone(),
            filename: display_name.to_string(),
            filepath: path.display().to_string(),
            chunk_count: fragments.len(),
            status: DocumentStatus::Indexed,
        })?;

        tracing::info!(
            doc_id = %doc_id,
            filename = %display_name,
            chunks = fragments.len(),
            "Document indexed"
        );

        Ok(doc_id)
    }

    /// List every tracked document
    pub fn list_documents(&self) -> Vec<DocumentRecord> {
        self.metadata.list()
    }

    /// Remove a document; `false` when the id is unknown
    ///
    /// The metadata entry is removed first, so a failed vector purge leaves
    /// orphaned fragments rather than a listed-but-unsearchable document.
    /// Orphans are logged and cleaned up by the next `clear_index`.
    pub async fn delete_document(&self, doc_id: &str) -> Result<bool, RagError> {
        let _guard = self.write_lock.lock().await;

        let removed = self.metadata.remove(doc_id)?;
        let Some(record) = removed else {
            return Ok(false);
        };

        if let Err(e) = self.index.delete_by_doc(doc_id).await {
            tracing::warn!(
                doc_id = %doc_id,
                filename = %record.filename,
                error = %e,
                "Vector purge failed, fragments orphaned until next clear"
            );
        } else {
            tracing::info!(doc_id = %doc_id, filename = %record.filename, "Document deleted");
        }

        Ok(true)
    }

    /// Drop every document and fragment
    pub async fn clear_index(&self) -> Result<(), RagError> {
        let _guard = self.write_lock.lock().await;

        self.index.clear().await?;
        self.metadata.clear()?;

        tracing::info!("Knowledge base cleared");
        Ok(())
    }

    /// Whether the knowledge base currently holds no documents
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    /// Ingest every supported file in a directory; returns how many indexed
    ///
    /// Individual file failures are logged and skipped so one bad upload does
    /// not block the rest of the directory.
    pub async fn load_directory(
        &self,
        dir: &Path,
        force_reload: bool,
    ) -> Result<usize, RagError> {
        if force_reload {
            self.clear_index().await?;
        }

        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| RagError::Ingestion(format!("Failed to read {}: {}", dir.display(), e)))?;

        let mut indexed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RagError::Ingestion(e.to_string()))?
        {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
                continue;
            };
            if !reader::is_supported(&name) {
                continue;
            }

            match self.add_document(&path, &name).await {
                Ok(_) => indexed += 1,
                Err(e) => {
                    tracing::warn!(filename = %name, error = %e, "Skipping document");
                },
            }
        }

        Ok(indexed)
    }

    /// Query and return only the synthesized answer
    pub async fn query_text(&self, question: &str) -> Result<String, RagError> {
        if self.is_empty() {
            return Ok(sentences::EMPTY_KB.to_string());
        }

        let hits = self.retrieve(question).await?;
        self.synthesizer.synthesize(question, &hits).await
    }

    /// Query and return the answer plus ranked source previews
    pub async fn query_sources(&self, question: &str) -> Result<RetrievalOutcome, RagError> {
        if self.is_empty() {
            return Ok(RetrievalOutcome::unsourced(sentences::EMPTY_KB_SHORT));
        }

        let hits = self.retrieve(question).await?;
        let answer = self.synthesizer.synthesize(question, &hits).await?;

        let sources = hits
            .iter()
            .map(|hit| RetrievedSource {
                text: preview(&hit.content, self.config.preview_max_chars),
                score: Some(round_score(hit.score)),
                filename: hit.filename.clone(),
                doc_id: hit.doc_id.clone(),
            })
            .collect();

        Ok(RetrievalOutcome::new(answer, sources))
    }

    /// Blocking variant of [`query_text`] for callers outside the runtime
    pub fn query_text_blocking(&self, question: &str) -> Result<String, RagError> {
        futures::executor::block_on(self.query_text(question))
    }

    /// Blocking variant of [`query_sources`]
    pub fn query_sources_blocking(&self, question: &str) -> Result<RetrievalOutcome, RagError> {
        futures::executor::block_on(self.query_sources(question))
    }

    async fn retrieve(&self, question: &str) -> Result<Vec<FragmentHit>, RagError> {
        let embedding = self.embedder.embed(question).await?;
        self.index.search(&embedding, self.config.top_k).await
    }
}

#[async_trait]
impl KnowledgeBase for RagEngine {
    async fn query(&self, question: &str) -> aidy_core::Result<String> {
        Ok(self.query_text(question).await?)
    }

    async fn query_with_sources(&self, question: &str) -> aidy_core::Result<RetrievalOutcome> {
        Ok(self.query_sources(question).await?)
    }
}

/// Truncate a fragment for display, appending an ellipsis only when cut
fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}...", truncated)
}

/// Round a similarity score to three decimals
fn round_score(score: f32) -> f32 {
    (score * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::MemoryIndex;
    use crate::embeddings::{EmbeddingConfig, HashEmbedder};
    use crate::ChunkConfig;
    use aidy_llm::backend::{FinishReason, GenerationResult, LlmBackend};
    use aidy_llm::LlmError;
    use aidy_core::Message;
    use std::io::Write;

    struct CannedBackend;

    #[async_trait]
    impl LlmBackend for CannedBackend {
        async fn generate(&self, _messages: &[Message]) -> Result<GenerationResult, LlmError> {
            Ok(GenerationResult {
                text: "canned answer".to_string(),
                tokens: 2,
                total_time_ms: 1,
                finish_reason: FinishReason::Stop,
            })
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    /// Index stub whose purge always fails
    struct BrokenPurgeIndex {
        inner: MemoryIndex,
    }

    #[async_trait]
    impl FragmentIndex for BrokenPurgeIndex {
        async fn ensure_ready(&self) -> Result<(), RagError> {
            self.inner.ensure_ready().await
        }

        async fn upsert(
            &self,
            fragments: &[Fragment],
            embeddings: &[Vec<f32>],
        ) -> Result<(), RagError> {
            self.inner.upsert(fragments, embeddings).await
        }

        async fn search(
            &self,
            query_embedding: &[f32],
            top_k: usize,
        ) -> Result<Vec<FragmentHit>, RagError> {
            self.inner.search(query_embedding, top_k).await
        }

        async fn delete_by_doc(&self, _doc_id: &str) -> Result<(), RagError> {
            Err(RagError::VectorStore("index unreachable".to_string()))
        }

        async fn clear(&self) -> Result<(), RagError> {
            self.inner.clear().await
        }
    }

    fn engine_with_index(dir: &Path, index: Arc<dyn FragmentIndex>) -> RagEngine {
        let embedder = Arc::new(HashEmbedder::new(EmbeddingConfig {
            embedding_dim: 64,
            ..Default::default()
        }));
        let metadata = MetadataStore::open(dir.join("docs_metadata.json")).unwrap();
        let synthesizer = AnswerSynthesizer::new(Arc::new(CannedBackend));
        let chunker = SemanticChunker::new(ChunkConfig::default());

        RagEngine::new(
            EngineConfig::default(),
            embedder,
            index,
            metadata,
            synthesizer,
            chunker,
        )
    }

    fn empty_engine(dir: &Path) -> RagEngine {
        engine_with_index(dir, Arc::new(MemoryIndex::new()))
    }

    fn write_doc(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "{}", content).unwrap();
        path
    }

    #[test]
    fn test_preview_no_truncation_below_limit() {
        assert_eq!(preview("short text", 300), "short text");
    }

    #[test]
    fn test_preview_truncates_with_ellipsis() {
        let long = "x".repeat(400);
        let p = preview(&long, 300);
        assert_eq!(p.chars().count(), 303);
        assert!(p.ends_with("..."));
    }

    #[test]
    fn test_preview_exact_limit_untouched() {
        let exact = "y".repeat(300);
        assert_eq!(preview(&exact, 300), exact);
    }

    #[test]
    fn test_round_score_three_decimals() {
        assert_eq!(round_score(0.123_456), 0.123);
        assert_eq!(round_score(0.999_9), 1.0);
        assert_eq!(round_score(0.000_4), 0.0);
    }

    #[tokio::test]
    async fn test_empty_kb_query_sentence() {
        let dir = tempfile::tempdir().unwrap();
        let engine = empty_engine(dir.path());

        let answer = engine.query_text("anything?").await.unwrap();
        assert_eq!(answer, sentences::EMPTY_KB);
    }

    #[tokio::test]
    async fn test_empty_kb_sources_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let engine = empty_engine(dir.path());

        let outcome = engine.query_sources("anything?").await.unwrap();
        assert_eq!(outcome.answer, sentences::EMPTY_KB_SHORT);
        assert!(outcome.sources.is_empty());
    }

    #[tokio::test]
    async fn test_empty_kb_is_not_an_error_via_trait() {
        let dir = tempfile::tempdir().unwrap();
        let engine = empty_engine(dir.path());

        let kb: &dyn KnowledgeBase = &engine;
        assert!(kb.query("hello").await.is_ok());
        assert!(kb.query_with_sources("hello").await.is_ok());
    }

    #[tokio::test]
    async fn test_add_then_list_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let engine = empty_engine(dir.path());
        let doc = write_doc(
            dir.path(),
            "policy.txt",
            "Refunds are accepted within thirty days of purchase.",
        );

        let doc_id = engine.add_document(&doc, "policy.txt").await.unwrap();
        assert_eq!(doc_id.len(), 8);

        let docs = engine.list_documents();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, doc_id);
        assert_eq!(docs[0].filename, "policy.txt");
        assert_eq!(docs[0].status, DocumentStatus::Indexed);
        assert!(docs[0].chunk_count >= 1);
        assert!(!engine.is_empty());
    }

    #[tokio::test]
    async fn test_query_after_add_returns_sources() {
        let dir = tempfile::tempdir().unwrap();
        let engine = empty_engine(dir.path());
        let doc = write_doc(
            dir.path(),
            "policy.txt",
            "Refunds are accepted within thirty days of purchase.",
        );
        engine.add_document(&doc, "policy.txt").await.unwrap();

        let outcome = engine.query_sources("What is the refund window?").await.unwrap();
        assert_eq!(outcome.answer, "canned answer");
        assert!(!outcome.sources.is_empty());
        assert_eq!(outcome.sources[0].filename, "policy.txt");
        assert!(outcome.sources[0].score.is_some());
    }

    #[tokio::test]
    async fn test_delete_known_id_true_unknown_false() {
        let dir = tempfile::tempdir().unwrap();
        let engine = empty_engine(dir.path());
        let doc = write_doc(dir.path(), "policy.txt", "Refunds take thirty days.");
        let doc_id = engine.add_document(&doc, "policy.txt").await.unwrap();

        assert!(!engine.delete_document("missing1").await.unwrap());
        assert!(engine.delete_document(&doc_id).await.unwrap());
        assert!(engine.list_documents().is_empty());
    }

    #[tokio::test]
    async fn test_delete_true_despite_failing_purge() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with_index(
            dir.path(),
            Arc::new(BrokenPurgeIndex {
                inner: MemoryIndex::new(),
            }),
        );
        let doc = write_doc(dir.path(), "policy.txt", "Refunds take thirty days.");
        let doc_id = engine.add_document(&doc, "policy.txt").await.unwrap();

        // The document is gone from the registry even though fragments linger
        assert!(engine.delete_document(&doc_id).await.unwrap());
        assert!(engine.is_empty());
    }

    #[tokio::test]
    async fn test_clear_then_query_fixed_sentence() {
        let dir = tempfile::tempdir().unwrap();
        let engine = empty_engine(dir.path());
        let doc = write_doc(dir.path(), "policy.txt", "Refunds take thirty days.");
        engine.add_document(&doc, "policy.txt").await.unwrap();

        engine.clear_index().await.unwrap();
        assert!(engine.is_empty());

        let answer = engine.query_text("What is the refund window?").await.unwrap();
        assert_eq!(answer, sentences::EMPTY_KB);
    }
}
