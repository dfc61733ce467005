//! MemoryBridge application binary - composition root.
//!
//! Ties the MemoryBridge crates into a single executable:
//! 1. Load configuration from TOML, then env overrides, then CLI flags
//! 2. Pick an embedding backend (remote, local ONNX, fallback, or mock)
//! 3. Load a captions file into an in-memory store
//! 4. Run the requested command against it

mod cli;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;

use memorybridge_core::config::MemoryBridgeConfig;
use memorybridge_core::era::era_from_date;
use memorybridge_core::types::PhotoRecord;
use memorybridge_insight::{find_clusters, KnowledgeBaseBuilder};
use memorybridge_vector::embedding::{
    EmbeddingService, FallbackEmbedding, LocalEmbeddingService, MockEmbedding,
    RemoteEmbeddingService,
};
use memorybridge_vector::{GraphPipeline, InMemoryStore, MemorySearch};

use crate::cli::{CliArgs, Command};

/// Memory id used for the single memory a captions file describes.
const CLI_MEMORY_ID: &str = "cli";

/// Read a JSON array of photo records.
fn read_captions(path: &Path) -> Result<Vec<PhotoRecord>, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    let photos: Vec<PhotoRecord> = serde_json::from_str(&raw)?;
    tracing::info!(path = %path.display(), photos = photos.len(), "Captions loaded");
    Ok(photos)
}

fn load_store(path: &Path) -> Result<Arc<InMemoryStore>, Box<dyn std::error::Error>> {
    let store = Arc::new(InMemoryStore::new());
    store.insert_memory(CLI_MEMORY_ID, read_captions(path)?)?;
    Ok(store)
}

/// Commands that need an embedder.
async fn run_with_embedder<E>(
    command: Command,
    config: &MemoryBridgeConfig,
    embedder: E,
) -> Result<(), Box<dyn std::error::Error>>
where
    E: EmbeddingService + Clone + 'static,
{
    match command {
        Command::Graph { captions } => {
            let store = load_store(&captions)?;
            let pipeline = GraphPipeline::from_config(embedder, store, &config.graph);
            let outcome = pipeline.process_memory(CLI_MEMORY_ID).await?;
            let clusters = find_clusters(&outcome.nodes, &outcome.edges);

            let report = serde_json::json!({
                "edges": outcome.edges,
                "clusters": clusters,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Search { captions, query, k } => {
            let store = load_store(&captions)?;
            let pipeline =
                GraphPipeline::from_config(embedder.clone(), Arc::clone(&store), &config.graph);
            pipeline.process_memory(CLI_MEMORY_ID).await?;

            let search = MemorySearch::new(store, embedder)
                .with_caption_max_chars(config.retrieval.caption_max_chars);
            let k = k.unwrap_or(config.retrieval.top_k);
            println!("{}", search.search_digest(CLI_MEMORY_ID, &query, k).await?);
        }
        other => return Err(format!("command does not use an embedder: {:?}", other).into()),
    }
    Ok(())
}

/// Choose the embedding backend from config and run `command` with it.
async fn dispatch(
    command: Command,
    config: &MemoryBridgeConfig,
    force_mock: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let emb = &config.embedding;
    let mock = MockEmbedding::with_dimensions(emb.dimensions);

    if force_mock {
        tracing::info!("Using mock embedder (--mock)");
        return run_with_embedder(command, config, mock).await;
    }

    let has_local = !emb.local_model_dir.trim().is_empty();
    match (emb.remote_enabled(), has_local) {
        (true, true) => {
            tracing::info!(endpoint = %emb.endpoint, model_dir = %emb.local_model_dir, "Remote embedder with local fallback");
            let local = LocalEmbeddingService::new(&emb.local_model_dir, emb.dimensions);
            if let Err(e) = local.warm_up() {
                tracing::warn!(error = %e, "Local fallback model unavailable");
            }
            let embedder = FallbackEmbedding::new(RemoteEmbeddingService::from_config(emb)?, local);
            run_with_embedder(command, config, embedder).await
        }
        (true, false) => {
            tracing::info!(endpoint = %emb.endpoint, "Remote embedder");
            run_with_embedder(command, config, RemoteEmbeddingService::from_config(emb)?).await
        }
        (false, true) => {
            tracing::info!(model_dir = %emb.local_model_dir, "Local embedder");
            let local = LocalEmbeddingService::new(&emb.local_model_dir, emb.dimensions);
            local.warm_up()?;
            tracing::info!(loaded = LocalEmbeddingService::is_loaded(), "Local model ready");
            run_with_embedder(command, config, local).await
        }
        (false, false) => {
            tracing::warn!("No embedding endpoint or local model configured, using mock embedder");
            run_with_embedder(command, config, mock).await
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = MemoryBridgeConfig::load_or_default(&config_file);
    config.apply_env_overrides();
    config.graph.similarity_threshold = args.resolve_threshold(config.graph.similarity_threshold);

    // Tracing. RUST_LOG wins over the configured level.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting MemoryBridge v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        path = %config_file.display(),
        threshold = config.graph.similarity_threshold,
        "Configuration loaded"
    );

    match args.command {
        Command::Era { date } => {
            println!("{}", era_from_date(&date));
            Ok(())
        }
        Command::KnowledgeBase { captions, name } => {
            let store = load_store(&captions)?;
            let builder = KnowledgeBaseBuilder::from_config(&config.knowledge_base);
            let document = builder
                .build_from_store(store.as_ref(), CLI_MEMORY_ID, &name)
                .await?;
            println!("{}", document);
            Ok(())
        }
        command => dispatch(command, &config, args.mock).await,
    }
}
