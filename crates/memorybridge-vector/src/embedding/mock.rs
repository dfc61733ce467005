use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use memorybridge_core::error::MemoryBridgeError;

use super::{reject_empty, EmbeddingService};
use crate::similarity::l2_normalize;

const DEFAULT_DIMENSIONS: usize = 384;

/// Mock embedding service built on feature hashing.
///
/// Each lowercased word is hashed to a bucket and a sign; the bucket counts
/// are L2-normalized. Identical texts give identical vectors and captions
/// that share words score higher than ones that don't, which is enough to
/// exercise graph building and retrieval without a model.
#[derive(Debug, Clone)]
pub struct MockEmbedding {
    dimensions: usize,
}

impl MockEmbedding {
    pub fn new() -> Self {
        Self::with_dimensions(DEFAULT_DIMENSIONS)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn hash_to_vector(&self, text: &str) -> Vec<f32> {
        let mut result = vec![0.0f32; self.dimensions];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let bucket = (h % self.dimensions as u64) as usize;
            let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
            result[bucket] += sign;
        }
        l2_normalize(&mut result);
        result
    }
}

impl Default for MockEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingService for MockEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryBridgeError> {
        reject_empty(text)?;
        Ok(self.hash_to_vector(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn backend(&self) -> &'static str {
        "mock"
    }
}
