use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{MemoryBridgeError, Result};

/// Top-level configuration for MemoryBridge.
///
/// Loaded from `~/.memorybridge/config.toml` by default, then patched by
/// environment variables (see [`MemoryBridgeConfig::apply_env_overrides`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryBridgeConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub knowledge_base: KnowledgeBaseConfig,
}

impl MemoryBridgeConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MemoryBridgeConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| MemoryBridgeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Recognised keys: `SIMILARITY_THRESHOLD`, `RETRIEVAL_TOP_K`,
    /// `EMBEDDING_ENDPOINT`, `EMBEDDING_API_KEY`, `EMBEDDING_MODEL`,
    /// `EMBEDDING_MODEL_DIR`. Numeric values that fail to parse are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("SIMILARITY_THRESHOLD") {
            match raw.trim().parse::<f64>() {
                Ok(v) => self.graph.similarity_threshold = v,
                Err(_) => warn!(value = %raw, "Ignoring unparseable SIMILARITY_THRESHOLD"),
            }
        }
        if let Some(raw) = lookup("RETRIEVAL_TOP_K") {
            match raw.trim().parse::<usize>() {
                Ok(v) => self.retrieval.top_k = v,
                Err(_) => warn!(value = %raw, "Ignoring unparseable RETRIEVAL_TOP_K"),
            }
        }
        if let Some(endpoint) = lookup("EMBEDDING_ENDPOINT") {
            self.embedding.endpoint = endpoint.trim().trim_end_matches('/').to_string();
        }
        if let Some(key) = lookup("EMBEDDING_API_KEY") {
            self.embedding.api_key = key;
        }
        if let Some(model) = lookup("EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Some(dir) = lookup("EMBEDDING_MODEL_DIR") {
            self.embedding.local_model_dir = dir;
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Semantic graph construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Minimum cosine similarity for an edge.
    pub similarity_threshold: f64,
    /// Maximum captions embedded per memory.
    pub max_nodes: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.7,
            max_nodes: 30,
        }
    }
}

/// Retrieval and digest formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Default number of hits per query.
    pub top_k: usize,
    /// Captions longer than this are cut in the digest.
    pub caption_max_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            caption_max_chars: 200,
        }
    }
}

/// Embedding provider selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Base URL of the remote embedding service. Empty disables it.
    pub endpoint: String,
    /// Bearer token for the remote service.
    pub api_key: String,
    /// Model id sent to the remote service.
    pub model: String,
    /// Remote request timeout.
    pub timeout_secs: u64,
    /// Directory holding `model.onnx` and `tokenizer.json` for local inference.
    pub local_model_dir: String,
    /// Expected output dimension.
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            timeout_secs: 30,
            local_model_dir: String::new(),
            dimensions: 384,
        }
    }
}

impl EmbeddingConfig {
    /// True when a remote endpoint is configured.
    pub fn remote_enabled(&self) -> bool {
        !self.endpoint.trim().is_empty()
    }
}

/// Knowledge-base document limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeBaseConfig {
    /// Maximum document size in KB.
    pub max_kb: usize,
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self { max_kb: 50 }
    }
}
