//! CLI argument definitions for the MemoryBridge tool.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// MemoryBridge - semantic photo memory graph and retrieval.
#[derive(Parser, Debug)]
#[command(name = "memorybridge", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Similarity threshold for graph edges.
    #[arg(short = 't', long = "threshold", global = true)]
    pub threshold: Option<f64>,

    /// Use the deterministic mock embedder instead of a model.
    #[arg(long = "mock", global = true)]
    pub mock: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the similarity graph for a captions file and print edges and clusters as JSON.
    Graph {
        /// JSON array of `{"caption", "date"}` objects.
        captions: PathBuf,
    },
    /// Rank captions against a natural-language query.
    Search {
        captions: PathBuf,
        query: String,
        /// Number of results (defaults to `[retrieval] top_k`).
        #[arg(short = 'k', long = "top-k")]
        k: Option<usize>,
    },
    /// Print the decade label for a date string.
    Era { date: String },
    /// Render the markdown knowledge base for a captions file.
    KnowledgeBase {
        captions: PathBuf,
        /// Name of the person the memories belong to.
        #[arg(short = 'n', long = "name")]
        name: String,
    },
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > MEMORYBRIDGE_CONFIG env var > ~/.memorybridge/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("MEMORYBRIDGE_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the graph threshold: --threshold flag > config value.
    pub fn resolve_threshold(&self, config_threshold: f64) -> f64 {
        self.threshold.unwrap_or(config_threshold)
    }

    /// Resolve the log level: --log-level flag > config value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".memorybridge").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".memorybridge").join("config.toml");
    }
    PathBuf::from("config.toml")
}
