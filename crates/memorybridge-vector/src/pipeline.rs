//! MemoryBridge graph pipeline.
//!
//! `GraphPipeline` turns the photos of one memory into graph nodes: fetch,
//! cap, embed each caption, store the embeddings, build and store the
//! similarity graph, then mark the memory ready.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use memorybridge_core::config::GraphConfig;
use memorybridge_core::error::{MemoryBridgeError, Result};
use memorybridge_core::types::{MemoryNode, MemoryStatus, SimilarityEdge, StoredEmbedding};

use crate::embedding::EmbeddingService;
use crate::graph::build_graph;
use crate::store::MemoryStore;

/// Nodes and edges produced for one memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphOutcome {
    pub nodes: Vec<MemoryNode>,
    pub edges: Vec<SimilarityEdge>,
}

impl GraphOutcome {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Builds and persists the semantic graph of a memory.
pub struct GraphPipeline<E: EmbeddingService, S: MemoryStore> {
    embedder: E,
    store: Arc<S>,
    threshold: f64,
    max_nodes: usize,
}

impl<E: EmbeddingService, S: MemoryStore> GraphPipeline<E, S> {
    pub fn new(embedder: E, store: Arc<S>, threshold: f64, max_nodes: usize) -> Self {
        Self {
            embedder,
            store,
            threshold,
            max_nodes,
        }
    }

    /// Create a pipeline using the `[graph]` config section.
    pub fn from_config(embedder: E, store: Arc<S>, config: &GraphConfig) -> Self {
        Self::new(embedder, store, config.similarity_threshold, config.max_nodes)
    }

    /// Process every captioned photo of `memory_id`.
    ///
    /// A memory without photos yields an empty outcome and its status is left
    /// alone. Blank captions are skipped but keep their position, so node
    /// `{memory_id}_{i}` always refers to photo `i`. Any failure after the
    /// photos are fetched (embedding, graph build, graph store) sets the
    /// status to `Error` and is returned.
    pub async fn process_memory(&self, memory_id: &str) -> Result<GraphOutcome> {
        let mut photos = self.store.fetch_photos(memory_id).await?;
        if photos.is_empty() {
            warn!(memory_id, "No photos found for memory");
            return Ok(GraphOutcome::default());
        }

        if photos.len() > self.max_nodes {
            warn!(
                memory_id,
                photos = photos.len(),
                max_nodes = self.max_nodes,
                "Too many photos, truncating"
            );
            photos.truncate(self.max_nodes);
        }

        info!(
            memory_id,
            photos = photos.len(),
            backend = self.embedder.backend(),
            "Generating caption embeddings"
        );

        let mut nodes = Vec::with_capacity(photos.len());
        for (index, photo) in photos.iter().enumerate() {
            let caption = photo.caption.trim();
            if caption.is_empty() {
                debug!(memory_id, index, "Skipping photo with empty caption");
                continue;
            }

            let started = Instant::now();
            let embedding = match self.embedder.embed(caption).await {
                Ok(v) => v,
                Err(e) => {
                    error!(memory_id, index, error = %e, "Caption embedding failed");
                    return Err(self.mark_failed(memory_id, e).await);
                }
            };
            debug!(
                memory_id,
                index,
                chars = caption.chars().count(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Caption embedded"
            );

            self.store
                .store_embedding(
                    memory_id,
                    StoredEmbedding {
                        caption_index: index,
                        caption: caption.to_string(),
                        embedding: embedding.clone(),
                        date: photo.date.clone(),
                    },
                )
                .await?;

            nodes.push(MemoryNode::new(
                format!("{}_{}", memory_id, index),
                caption,
                embedding,
                photo.date.as_str(),
            ));
        }

        let edges = match build_graph(&nodes, self.threshold) {
            Ok(edges) => edges,
            Err(e) => {
                error!(memory_id, error = %e, "Graph build failed");
                return Err(self.mark_failed(memory_id, e).await);
            }
        };
        if let Err(e) = self.store.store_graph(memory_id, &edges).await {
            error!(memory_id, error = %e, "Storing graph failed");
            return Err(self.mark_failed(memory_id, e).await);
        }
        self.store.set_status(memory_id, MemoryStatus::Ready).await?;

        info!(
            memory_id,
            nodes = nodes.len(),
            edges = edges.len(),
            "Memory graph ready"
        );
        Ok(GraphOutcome { nodes, edges })
    }

    /// Set the memory's status to `Error` and hand back the original failure.
    async fn mark_failed(&self, memory_id: &str, cause: MemoryBridgeError) -> MemoryBridgeError {
        if let Err(e) = self.store.set_status(memory_id, MemoryStatus::Error).await {
            warn!(memory_id, error = %e, "Could not record error status");
        }
        cause
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn max_nodes(&self) -> usize {
        self.max_nodes
    }
}
