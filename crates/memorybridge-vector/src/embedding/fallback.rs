use tracing::warn;

use memorybridge_core::error::MemoryBridgeError;

use super::EmbeddingService;

/// An embedding together with the backend that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedded {
    pub vector: Vec<f32>,
    pub backend: &'static str,
}

/// Tries `primary` first and falls back to `secondary` when it fails.
///
/// With no primary configured every call goes straight to the secondary.
/// A primary failure is logged at warn level and never reaches the caller
/// unless the secondary fails too.
#[derive(Debug, Clone)]
pub struct FallbackEmbedding<P, S> {
    primary: Option<P>,
    secondary: S,
}

impl<P: EmbeddingService, S: EmbeddingService> FallbackEmbedding<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self {
            primary: Some(primary),
            secondary,
        }
    }

    pub fn secondary_only(secondary: S) -> Self {
        Self {
            primary: None,
            secondary,
        }
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    /// Embed `text` and report which backend answered.
    pub async fn embed_tagged(&self, text: &str) -> Result<Embedded, MemoryBridgeError> {
        if let Some(primary) = &self.primary {
            match primary.embed(text).await {
                Ok(vector) => {
                    return Ok(Embedded {
                        vector,
                        backend: primary.backend(),
                    })
                }
                Err(e) => {
                    warn!(
                        primary = primary.backend(),
                        secondary = self.secondary.backend(),
                        error = %e,
                        "Primary embedding backend failed, falling back"
                    );
                }
            }
        }

        let vector = self.secondary.embed(text).await?;
        Ok(Embedded {
            vector,
            backend: self.secondary.backend(),
        })
    }
}

impl<P: EmbeddingService, S: EmbeddingService> EmbeddingService for FallbackEmbedding<P, S> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryBridgeError> {
        self.embed_tagged(text).await.map(|e| e.vector)
    }

    fn dimensions(&self) -> usize {
        match &self.primary {
            Some(primary) => primary.dimensions(),
            None => self.secondary.dimensions(),
        }
    }

    fn backend(&self) -> &'static str {
        "fallback"
    }
}
