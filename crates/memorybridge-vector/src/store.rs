//! Storage seam for photos, embeddings, graphs and processing status.
//!
//! The document database is an external collaborator; `MemoryStore` is the
//! contract the pipeline and search need from it. `InMemoryStore` backs tests
//! and the CLI.

use std::collections::HashMap;
use std::future::Future;
use std::sync::RwLock;

use tracing::debug;

use memorybridge_core::error::{MemoryBridgeError, Result};
use memorybridge_core::types::{MemoryStatus, PhotoRecord, SimilarityEdge, StoredEmbedding};

/// Persistence operations keyed by memory id.
pub trait MemoryStore: Send + Sync {
    /// Photos of a memory in upload order. Unknown ids are `NotFound`.
    fn fetch_photos(&self, memory_id: &str) -> impl Future<Output = Result<Vec<PhotoRecord>>> + Send;

    /// Persist one caption embedding, replacing any previous one at the same index.
    fn store_embedding(
        &self,
        memory_id: &str,
        embedding: StoredEmbedding,
    ) -> impl Future<Output = Result<()>> + Send;

    /// All stored embeddings ordered by caption index.
    fn load_embeddings(
        &self,
        memory_id: &str,
    ) -> impl Future<Output = Result<Vec<StoredEmbedding>>> + Send;

    /// Replace the stored edge list.
    fn store_graph(
        &self,
        memory_id: &str,
        edges: &[SimilarityEdge],
    ) -> impl Future<Output = Result<()>> + Send;

    fn load_graph(&self, memory_id: &str)
        -> impl Future<Output = Result<Vec<SimilarityEdge>>> + Send;

    fn set_status(
        &self,
        memory_id: &str,
        status: MemoryStatus,
    ) -> impl Future<Output = Result<()>> + Send;

    /// `None` when the memory does not exist.
    fn status(&self, memory_id: &str) -> impl Future<Output = Result<Option<MemoryStatus>>> + Send;
}

#[derive(Debug, Default)]
struct MemoryRecord {
    photos: Vec<PhotoRecord>,
    embeddings: Vec<StoredEmbedding>,
    edges: Vec<SimilarityEdge>,
    status: MemoryStatus,
}

/// Process-local `MemoryStore`.
///
/// Writes against a memory that was never inserted fail with `NotFound`;
/// reads of an unknown memory return empty results, except `fetch_photos`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<String, MemoryRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a memory and its photos with status `Processing`.
    pub fn insert_memory(&self, memory_id: &str, photos: Vec<PhotoRecord>) -> Result<()> {
        let mut records = self.write()?;
        records.insert(
            memory_id.to_string(),
            MemoryRecord {
                photos,
                ..MemoryRecord::default()
            },
        );
        debug!(memory_id, "Memory registered");
        Ok(())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, MemoryRecord>>> {
        self.records
            .read()
            .map_err(|e| MemoryBridgeError::Storage(format!("Lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, MemoryRecord>>> {
        self.records
            .write()
            .map_err(|e| MemoryBridgeError::Storage(format!("Lock poisoned: {}", e)))
    }

    fn with_record<T>(&self, memory_id: &str, f: impl FnOnce(&mut MemoryRecord) -> T) -> Result<T> {
        let mut records = self.write()?;
        let record = records
            .get_mut(memory_id)
            .ok_or_else(|| MemoryBridgeError::NotFound(format!("memory {}", memory_id)))?;
        Ok(f(record))
    }
}

impl MemoryStore for InMemoryStore {
    async fn fetch_photos(&self, memory_id: &str) -> Result<Vec<PhotoRecord>> {
        self.read()?
            .get(memory_id)
            .map(|r| r.photos.clone())
            .ok_or_else(|| MemoryBridgeError::NotFound(format!("memory {}", memory_id)))
    }

    async fn store_embedding(&self, memory_id: &str, embedding: StoredEmbedding) -> Result<()> {
        self.with_record(memory_id, |record| {
            match record
                .embeddings
                .binary_search_by_key(&embedding.caption_index, |e| e.caption_index)
            {
                Ok(pos) => record.embeddings[pos] = embedding,
                Err(pos) => record.embeddings.insert(pos, embedding),
            }
        })
    }

    async fn load_embeddings(&self, memory_id: &str) -> Result<Vec<StoredEmbedding>> {
        Ok(self
            .read()?
            .get(memory_id)
            .map(|r| r.embeddings.clone())
            .unwrap_or_default())
    }

    async fn store_graph(&self, memory_id: &str, edges: &[SimilarityEdge]) -> Result<()> {
        self.with_record(memory_id, |record| record.edges = edges.to_vec())
    }

    async fn load_graph(&self, memory_id: &str) -> Result<Vec<SimilarityEdge>> {
        Ok(self
            .read()?
            .get(memory_id)
            .map(|r| r.edges.clone())
            .unwrap_or_default())
    }

    async fn set_status(&self, memory_id: &str, status: MemoryStatus) -> Result<()> {
        self.with_record(memory_id, |record| record.status = status)?;
        debug!(memory_id, status = status.as_str(), "Memory status updated");
        Ok(())
    }

    async fn status(&self, memory_id: &str) -> Result<Option<MemoryStatus>> {
        Ok(self.read()?.get(memory_id).map(|r| r.status))
    }
}
