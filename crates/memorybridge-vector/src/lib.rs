//! MemoryBridge Vector crate - similarity, semantic graph, retrieval, embeddings and pipeline.
//!
//! Provides exact cosine similarity over caption embeddings, the pairwise
//! similarity graph, top-k retrieval with its caption digest, an embedding
//! service trait with remote, local ONNX, fallback and mock implementations,
//! the storage seam, and the pipeline that ties them together per memory.

pub mod embedding;
pub mod graph;
pub mod pipeline;
pub mod retrieval;
pub mod search;
pub mod similarity;
pub mod store;

mod properties;

pub use embedding::{
    DynEmbeddingService, EmbeddingService, FallbackEmbedding, LocalEmbeddingService,
    MockEmbedding, RemoteEmbeddingService,
};
pub use graph::build_graph;
pub use pipeline::{GraphOutcome, GraphPipeline};
pub use retrieval::{format_hits, retrieve_top_k};
pub use search::MemorySearch;
pub use similarity::cosine_similarity;
pub use store::{InMemoryStore, MemoryStore};
