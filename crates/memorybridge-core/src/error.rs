use thiserror::Error;

/// Top-level error type for the MemoryBridge engine.
///
/// Only `DimensionMismatch` comes out of the pure graph and retrieval code.
/// The remaining variants belong to the collaborators around it (embedding
/// providers, the memory store, configuration loading).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MemoryBridgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for MemoryBridgeError {
    fn from(err: toml::de::Error) -> Self {
        MemoryBridgeError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for MemoryBridgeError {
    fn from(err: toml::ser::Error) -> Self {
        MemoryBridgeError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for MemoryBridgeError {
    fn from(err: serde_json::Error) -> Self {
        MemoryBridgeError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for MemoryBridge operations.
pub type Result<T> = std::result::Result<T, MemoryBridgeError>;
