use thiserror::Error;

use memorybridge_core::error::MemoryBridgeError;

/// Errors that can occur while clustering or building knowledge bases.
#[derive(Error, Debug)]
pub enum InsightError {
    #[error("knowledge base content is empty")]
    EmptyDocument,
    #[error("knowledge base is {:.1} KB, exceeds the {} KB limit", kilobytes(.size), .limit / 1024)]
    TooLarge { size: usize, limit: usize },
    #[error(transparent)]
    Core(#[from] MemoryBridgeError),
}

fn kilobytes(size: &usize) -> f64 {
    *size as f64 / 1024.0
}
