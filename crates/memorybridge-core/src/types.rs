use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::era::era_from_date;

// =============================================================================
// Graph entities
// =============================================================================

/// A single photo caption together with its semantic embedding.
///
/// Nodes are immutable once built. Every node compared inside one graph must
/// carry an embedding of the same length.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryNode {
    /// Unique identifier, typically `{memory_id}_{caption_index}`.
    pub id: String,
    /// Caption text that was embedded.
    pub text: String,
    /// L2-normalized embedding vector.
    pub embedding: Vec<f32>,
    /// ISO-8601 or partial date string; may be empty.
    pub date: String,
    /// Decade label derived from `date`, or "unknown".
    pub era: String,
}

impl MemoryNode {
    /// Build a node, deriving its era from `date`.
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        embedding: Vec<f32>,
        date: impl Into<String>,
    ) -> Self {
        let date = date.into();
        let era = era_from_date(&date);
        Self {
            id: id.into(),
            text: text.into(),
            embedding,
            date,
            era,
        }
    }
}

/// Undirected similarity relationship between two nodes.
///
/// `source_id` is the node that came first in the input sequence. The order
/// only exists to rule out duplicate pairs and carries no direction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimilarityEdge {
    pub source_id: String,
    pub target_id: String,
    /// Cosine similarity rounded to 4 decimal places.
    pub similarity: f64,
}

/// A ranked retrieval result. Produced per query, never stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub node: MemoryNode,
    pub score: f64,
}

/// Cluster label (`cluster_{era}_{ordinal}`) mapped to member node ids.
///
/// Labels iterate and serialize in discovery order, so `cluster_unknown_2`
/// comes before `cluster_unknown_10`. Members keep the order of the node
/// sequence the clusters were built from.
pub type ClusterMap = IndexMap<String, Vec<String>>;

// =============================================================================
// Storage shapes
// =============================================================================

/// Photo metadata as held by the document store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoRecord {
    pub caption: String,
    /// "YYYY" or "YYYY-MM-DD", possibly empty.
    pub date: String,
    /// Era code, e.g. "1980s" or "childhood".
    pub era: String,
    pub photo_url: String,
}

/// One persisted caption embedding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredEmbedding {
    pub caption_index: usize,
    pub caption: String,
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub date: String,
}

/// Processing status of a memory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryStatus {
    /// Embeddings are being generated.
    #[default]
    Processing,
    /// All embeddings and the graph are stored.
    Ready,
    /// At least one caption failed to embed.
    Error,
}

impl MemoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Error => "error",
        }
    }
}
