//! MemoryBridge Insight crate - memory clustering and knowledge base generation.
//!
//! Provides:
//! - Union-find clustering of the semantic graph into era-labelled groups
//! - Markdown knowledge base documents for the voice companion

pub mod cluster;
pub mod error;
pub mod knowledge_base;

pub use cluster::{find_clusters, MemoryClusterer};
pub use error::InsightError;
pub use knowledge_base::{
    build_knowledge_base, summarize_caption, validate_knowledge_base, KnowledgeBaseBuilder,
    KnowledgeBaseCheck, PhotoMemory,
};
