//! Document metadata persistence
//!
//! The registry of indexed documents survives restarts as a JSON file next
//! to the vector index. Every mutation rewrites the file atomically (temp
//! file in the same directory, then rename) so a crash mid-write never
//! leaves a truncated registry behind.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use aidy_core::retrieval::DocumentRecord;

use crate::RagError;

/// Persisted registry of indexed documents
pub struct MetadataStore {
    path: PathBuf,
    records: RwLock<HashMap<String, DocumentRecord>>,
}

impl MetadataStore {
    /// Open the store, loading any existing registry file
    ///
    /// A missing file means an empty registry, not an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RagError> {
        let path = path.into();

        let records = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                RagError::Metadata(format!("Corrupt metadata file {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(RagError::Metadata(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            },
        };

        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    /// Register a document and persist
    pub fn insert(&self, record: DocumentRecord) -> Result<(), RagError> {
        {
            let mut records = self.records.write();
            records.insert(record.id.clone(), record);
        }
        self.persist()
    }

    /// Remove a document and persist; returns the removed record if present
    pub fn remove(&self, doc_id: &str) -> Result<Option<DocumentRecord>, RagError> {
        let removed = {
            let mut records = self.records.write();
            records.remove(doc_id)
        };

        if removed.is_some() {
            self.persist()?;
        }
        Ok(removed)
    }

    /// All registered documents
    pub fn list(&self) -> Vec<DocumentRecord> {
        let records = self.records.read();
        let mut list: Vec<DocumentRecord> = records.values().cloned().collect();
        list.sort_by(|a, b| a.filename.cmp(&b.filename));
        list
    }

    pub fn get(&self, doc_id: &str) -> Option<DocumentRecord> {
        self.records.read().get(doc_id).cloned()
    }

    pub fn contains(&self, doc_id: &str) -> bool {
        self.records.read().contains_key(doc_id)
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Drop every record and persist the empty registry
    pub fn clear(&self) -> Result<(), RagError> {
        self.records.write().clear();
        self.persist()
    }

    fn persist(&self) -> Result<(), RagError> {
        let json = {
            let records = self.records.read();
            serde_json::to_string_pretty(&*records)
                .map_err(|e| RagError::Metadata(e.to_string()))?
        };

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)
            .map_err(|e| RagError::Metadata(format!("Failed to create {}: {}", dir.display(), e)))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| RagError::Metadata(e.to_string()))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| RagError::Metadata(e.to_string()))?;
        tmp.persist(&self.path)
            .map_err(|e| RagError::Metadata(e.to_string()))?;

        Ok(())
    }
}
