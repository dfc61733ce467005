//! Text search over a memory's stored caption embeddings.
//!
//! `MemorySearch` embeds the query with the configured service, loads the
//! memory's embeddings from the store and ranks them with `retrieve_top_k`.

use std::sync::Arc;

use tracing::{debug, info, warn};

use memorybridge_core::error::Result;
use memorybridge_core::types::{MemoryNode, RetrievalHit};

use crate::embedding::{DynEmbeddingService, EmbeddingService};
use crate::retrieval::{format_hits_with_limit, retrieve_top_k, DIGEST_CAPTION_MAX_CHARS};
use crate::store::MemoryStore;

/// Query-time retrieval against stored embeddings.
///
/// Uses dynamic dispatch (`Box<dyn DynEmbeddingService>`) so the binary can
/// pick a backend at runtime while tests use `MockEmbedding`.
pub struct MemorySearch<S: MemoryStore> {
    embedder: Box<dyn DynEmbeddingService>,
    store: Arc<S>,
    caption_max_chars: usize,
}

impl<S: MemoryStore> MemorySearch<S> {
    pub fn new(store: Arc<S>, embedder: impl EmbeddingService + 'static) -> Self {
        Self::new_dyn(store, Box::new(embedder))
    }

    pub fn new_dyn(store: Arc<S>, embedder: Box<dyn DynEmbeddingService>) -> Self {
        Self {
            embedder,
            store,
            caption_max_chars: DIGEST_CAPTION_MAX_CHARS,
        }
    }

    /// Override the caption cut-off used by [`MemorySearch::search_digest`].
    pub fn with_caption_max_chars(mut self, max_chars: usize) -> Self {
        self.caption_max_chars = max_chars;
        self
    }

    /// Rebuild graph nodes from stored embeddings, in caption order.
    ///
    /// Entries with an empty embedding are skipped.
    pub async fn load_nodes(&self, memory_id: &str) -> Result<Vec<MemoryNode>> {
        let stored = self.store.load_embeddings(memory_id).await?;
        let total = stored.len();

        let nodes: Vec<MemoryNode> = stored
            .into_iter()
            .filter(|e| {
                if e.embedding.is_empty() {
                    warn!(memory_id, index = e.caption_index, "Stored embedding is empty");
                    return false;
                }
                true
            })
            .map(|e| {
                MemoryNode::new(
                    format!("{}_{}", memory_id, e.caption_index),
                    e.caption,
                    e.embedding,
                    e.date,
                )
            })
            .collect();

        debug!(memory_id, stored = total, usable = nodes.len(), "Loaded memory nodes");
        Ok(nodes)
    }

    /// The `k` captions most similar to `query`.
    ///
    /// A memory with no usable embeddings returns an empty list without
    /// calling the embedding service.
    pub async fn search(&self, memory_id: &str, query: &str, k: usize) -> Result<Vec<RetrievalHit>> {
        let nodes = self.load_nodes(memory_id).await?;
        if nodes.is_empty() {
            info!(memory_id, "No stored embeddings to search");
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed_boxed(query).await?;
        let hits = retrieve_top_k(&query_embedding, &nodes, k)?;

        info!(
            memory_id,
            k,
            results = hits.len(),
            backend = self.embedder.backend(),
            "Memory search complete"
        );
        Ok(hits)
    }

    /// [`MemorySearch::search`] rendered as the caption digest.
    pub async fn search_digest(&self, memory_id: &str, query: &str, k: usize) -> Result<String> {
        let hits = self.search(memory_id, query, k).await?;
        Ok(format_hits_with_limit(&hits, self.caption_max_chars))
    }
}
