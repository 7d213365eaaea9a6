//! Vector store using Qdrant
//!
//! Dense fragment storage and similarity search. Each point is one document
//! fragment, tagged with the owning document's id so deletes can purge by
//! filter.

use async_trait::async_trait;
use parking_lot::Mutex;
use qdrant_client::{
    qdrant::{
        value::Kind, Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter,
        PointStruct, SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
    },
    Qdrant,
};
use std::collections::HashMap;

use aidy_config::constants::endpoints;

use crate::RagError;

/// Vector store configuration
#[derive(Debug, Clone)]
pub struct VectorStoreConfig {
    /// Qdrant endpoint
    pub endpoint: String,
    /// Collection name
    pub collection: String,
    /// Vector dimension
    pub vector_dim: usize,
    /// API key (optional)
    pub api_key: Option<String>,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            endpoint: endpoints::QDRANT_DEFAULT.to_string(),
            collection: "knowledge-base".to_string(),
            vector_dim: 3072,
            api_key: None,
        }
    }
}

/// One indexed document fragment
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Point ID (UUID)
    pub id: String,
    /// Fragment text
    pub content: String,
    /// Display name of the owning document
    pub filename: String,
    /// Id of the owning document
    pub doc_id: String,
}

/// Search hit from the vector store
#[derive(Debug, Clone)]
pub struct FragmentHit {
    /// Similarity score
    pub score: f32,
    /// Fragment text
    pub content: String,
    /// Display name of the owning document
    pub filename: String,
    /// Id of the owning document
    pub doc_id: String,
}

/// Fragment index contract
///
/// The engine talks to the index through this seam so tests can substitute
/// an in-memory implementation, mirroring the `Embedder` trait.
#[async_trait]
pub trait FragmentIndex: Send + Sync {
    /// Prepare the index for use (create collections, reconcile schema)
    async fn ensure_ready(&self) -> Result<(), RagError>;

    /// Insert fragments with their embeddings
    async fn upsert(&self, fragments: &[Fragment], embeddings: &[Vec<f32>])
        -> Result<(), RagError>;

    /// Search by vector, most similar first
    async fn search(&self, query_embedding: &[f32], top_k: usize)
        -> Result<Vec<FragmentHit>, RagError>;

    /// Delete all fragments tagged with the given document id
    async fn delete_by_doc(&self, doc_id: &str) -> Result<(), RagError>;

    /// Purge every fragment
    async fn clear(&self) -> Result<(), RagError>;
}

/// Vector store client
pub struct VectorStore {
    client: Qdrant,
    config: VectorStoreConfig,
}

impl VectorStore {
    /// Create a new vector store connection
    pub async fn new(config: VectorStoreConfig) -> Result<Self, RagError> {
        let mut builder = Qdrant::from_url(&config.endpoint);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
            tracing::info!("Qdrant connection using API key authentication");
        }

        let client = builder
            .build()
            .map_err(|e| RagError::Connection(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Read the vector size of the existing collection
    async fn existing_dimension(&self) -> Result<Option<u64>, RagError> {
        let info = self
            .client
            .collection_info(&self.config.collection)
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        let dim = info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config)
            .and_then(|c| match c {
                qdrant_client::qdrant::vectors_config::Config::Params(params) => Some(params.size),
                _ => None,
            });

        Ok(dim)
    }

    async fn create_collection(&self) -> Result<(), RagError> {
        tracing::info!(
            collection = %self.config.collection,
            dim = self.config.vector_dim,
            "Creating Qdrant collection"
        );

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.config.collection).vectors_config(
                    VectorParamsBuilder::new(self.config.vector_dim as u64, Distance::Cosine),
                ),
            )
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl FragmentIndex for VectorStore {
    /// Create the collection if missing and reconcile its dimension
    ///
    /// An existing collection whose vector size differs from the configured
    /// dimension is dropped and recreated. Callers tolerate the pause; the
    /// alternative (erroring) would leave the engine permanently unusable
    /// after an embedding-model change.
    async fn ensure_ready(&self) -> Result<(), RagError> {
        let exists = self
            .client
            .collection_exists(&self.config.collection)
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        if exists {
            match self.existing_dimension().await {
                Ok(Some(dim)) if dim != self.config.vector_dim as u64 => {
                    tracing::warn!(
                        collection = %self.config.collection,
                        existing_dim = dim,
                        expected_dim = self.config.vector_dim,
                        "Collection dimension mismatch, deleting and recreating"
                    );
                    self.client
                        .delete_collection(&self.config.collection)
                        .await
                        .map_err(|e| RagError::VectorStore(e.to_string()))?;
                },
                Ok(_) => return Ok(()),
                Err(e) => {
                    tracing::warn!(error = %e, "Could not read collection dimension, keeping as-is");
                    return Ok(());
                },
            }
        }

        self.create_collection().await
    }

    /// Insert fragments with their embeddings
    async fn upsert(
        &self,
        fragments: &[Fragment],
        embeddings: &[Vec<f32>],
    ) -> Result<(), RagError> {
        if fragments.len() != embeddings.len() {
            return Err(RagError::VectorStore(
                "Fragment and embedding count mismatch".to_string(),
            ));
        }

        let points: Vec<PointStruct> = fragments
            .iter()
            .zip(embeddings.iter())
            .map(|(fragment, emb)| {
                let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
                payload.insert("text".to_string(), fragment.content.clone().into());
                payload.insert("filename".to_string(), fragment.filename.clone().into());
                payload.insert("doc_id".to_string(), fragment.doc_id.clone().into());

                PointStruct::new(fragment.id.clone(), emb.clone(), payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.config.collection, points))
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        Ok(())
    }

    /// Search by vector
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<FragmentHit>, RagError> {
        let results = self
            .client
            .search_points(
                SearchPointsBuilder::new(
                    &self.config.collection,
                    query_embedding.to_vec(),
                    top_k as u64,
                )
                .with_payload(true),
            )
            .await
            .map_err(|e| RagError::Search(e.to_string()))?;

        let hits: Vec<FragmentHit> = results
            .result
            .into_iter()
            .map(|point| {
                let mut content = String::new();
                let mut filename = String::from("unknown");
                let mut doc_id = String::new();

                for (k, v) in point.payload {
                    if let Some(Kind::StringValue(s)) = v.kind {
                        match k.as_str() {
                            "text" => content = s,
                            "filename" => filename = s,
                            "doc_id" => doc_id = s,
                            _ => {},
                        }
                    }
                }

                FragmentHit {
                    score: point.score,
                    content,
                    filename,
                    doc_id,
                }
            })
            .collect();

        Ok(hits)
    }

    /// Delete all fragments tagged with the given document id
    async fn delete_by_doc(&self, doc_id: &str) -> Result<(), RagError> {
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.config.collection)
                    .points(Filter::must([Condition::matches(
                        "doc_id",
                        doc_id.to_string(),
                    )]))
                    .wait(true),
            )
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        Ok(())
    }

    /// Purge every fragment by dropping and recreating the collection
    async fn clear(&self) -> Result<(), RagError> {
        // delete_collection on a missing collection is not an error we care about
        if let Err(e) = self.client.delete_collection(&self.config.collection).await {
            tracing::warn!(error = %e, "Failed to delete collection during clear");
        }

        self.create_collection().await
    }
}

/// In-memory fragment index for testing (no Qdrant required)
#[derive(Default)]
pub struct MemoryIndex {
    entries: Mutex<Vec<(Fragment, Vec<f32>)>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl FragmentIndex for MemoryIndex {
    async fn ensure_ready(&self) -> Result<(), RagError> {
        Ok(())
    }

    async fn upsert(
        &self,
        fragments: &[Fragment],
        embeddings: &[Vec<f32>],
    ) -> Result<(), RagError> {
        if fragments.len() != embeddings.len() {
            return Err(RagError::VectorStore(
                "Fragment and embedding count mismatch".to_string(),
            ));
        }

        let mut entries = self.entries.lock();
        for (fragment, emb) in fragments.iter().zip(embeddings.iter()) {
            entries.retain(|(f, _)| f.id != fragment.id);
            entries.push((fragment.clone(), emb.clone()));
        }
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<FragmentHit>, RagError> {
        let entries = self.entries.lock();
        let mut hits: Vec<FragmentHit> = entries
            .iter()
            .map(|(fragment, emb)| FragmentHit {
                score: cosine(query_embedding, emb),
                content: fragment.content.clone(),
                filename: fragment.filename.clone(),
                doc_id: fragment.doc_id.clone(),
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn delete_by_doc(&self, doc_id: &str) -> Result<(), RagError> {
        self.entries.lock().retain(|(f, _)| f.doc_id != doc_id);
        Ok(())
    }

    async fn clear(&self) -> Result<(), RagError> {
        self.entries.lock().clear();
        Ok(())
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
