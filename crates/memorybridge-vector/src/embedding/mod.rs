//! Embedding service trait and implementations.
//!
//! - `RemoteEmbeddingService` calls an OpenAI-style `/embeddings` endpoint
//!   on an accelerator host.
//! - `LocalEmbeddingService` runs a sentence-transformer ONNX export on the
//!   CPU through a process-wide model loaded on first use.
//! - `FallbackEmbedding` tries one service and switches to another on error.
//! - `MockEmbedding` gives deterministic hashed bag-of-words vectors for tests.

mod fallback;
mod local;
mod mock;
mod remote;

use std::future::Future;
use std::pin::Pin;

use memorybridge_core::error::MemoryBridgeError;

pub use fallback::{Embedded, FallbackEmbedding};
pub use local::LocalEmbeddingService;
pub use mock::MockEmbedding;
pub use remote::RemoteEmbeddingService;

/// Service for generating text embeddings.
///
/// Implementations return L2-normalized vectors of a fixed dimension. Used
/// for captions at ingestion and for queries at search time.
pub trait EmbeddingService: Send + Sync {
    /// Generate an embedding vector for the given text.
    fn embed(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<Vec<f32>, MemoryBridgeError>> + Send;

    /// Return the dimensionality of vectors produced by this service.
    fn dimensions(&self) -> usize;

    /// Short label for logs ("remote", "local", ...).
    fn backend(&self) -> &'static str;
}

/// Boxed future returned by [`DynEmbeddingService::embed_boxed`].
pub type EmbedFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<f32>, MemoryBridgeError>> + Send + 'a>>;

/// Object-safe version of [`EmbeddingService`] for dynamic dispatch.
///
/// `EmbeddingService::embed` returns `impl Future` and so cannot sit behind
/// `dyn`. Every `EmbeddingService` gets this trait through the blanket impl.
pub trait DynEmbeddingService: Send + Sync {
    /// Generate an embedding vector for the given text (boxed future).
    fn embed_boxed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a>;

    /// Return the dimensionality of vectors produced by this service.
    fn dimensions(&self) -> usize;

    /// Short label for logs.
    fn backend(&self) -> &'static str;
}

impl<T: EmbeddingService> DynEmbeddingService for T {
    fn embed_boxed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a> {
        Box::pin(self.embed(text))
    }

    fn dimensions(&self) -> usize {
        EmbeddingService::dimensions(self)
    }

    fn backend(&self) -> &'static str {
        EmbeddingService::backend(self)
    }
}

pub(crate) fn reject_empty(text: &str) -> Result<(), MemoryBridgeError> {
    if text.trim().is_empty() {
        return Err(MemoryBridgeError::Embedding(
            "Cannot embed empty text".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dyn_dispatch_matches_static() {
        let service = MockEmbedding::new();
        let boxed: Box<dyn DynEmbeddingService> = Box::new(MockEmbedding::new());

        let a = service.embed("family picnic").await.unwrap();
        let b = boxed.embed_boxed("family picnic").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(DynEmbeddingService::dimensions(boxed.as_ref()), 384);
        assert_eq!(DynEmbeddingService::backend(boxed.as_ref()), "mock");
    }

    #[test]
    fn test_reject_empty() {
        assert!(reject_empty("").is_err());
        assert!(reject_empty("   \n").is_err());
        assert!(reject_empty("a").is_ok());
    }
}
