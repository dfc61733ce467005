//! Benchmarks for graph building and retrieval at the per-memory node cap.
//!
//! A memory holds at most 30 captions, so one graph build is at most 435
//! cosine comparisons. These benches track that bound with realistic
//! 384-dimensional vectors from `MockEmbedding`.
//!
//! ```bash
//! cargo bench -p memorybridge-vector
//! ```

use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use memorybridge_core::types::MemoryNode;
use memorybridge_vector::embedding::{EmbeddingService, MockEmbedding};
use memorybridge_vector::graph::build_graph;
use memorybridge_vector::retrieval::{format_hits, retrieve_top_k};

/// Caption templates mixed so that some pairs share words and some don't.
const TEMPLATES: &[&str] = &[
    "Birthday party at the old house with cake and candles",
    "Fishing trip on the lake with dad and the old boat",
    "Wedding day at the chapel with the whole family",
    "Christmas morning by the tree opening presents",
    "First day of school in a new coat",
    "Summer picnic in the park with cousins",
];

fn build_nodes(count: usize) -> Vec<MemoryNode> {
    let embedder = MockEmbedding::new();
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build tokio runtime");

    (0..count)
        .map(|i| {
            let caption = format!("{} photo {}", TEMPLATES[i % TEMPLATES.len()], i);
            let embedding = rt.block_on(embedder.embed(&caption)).expect("embed failed");
            MemoryNode::new(format!("mem_{}", i), caption, embedding, "1985")
        })
        .collect()
}

fn bench_build_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_graph");
    group.measurement_time(Duration::from_secs(5));

    for &n in &[10usize, 30] {
        let nodes = build_nodes(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &nodes, |b, nodes| {
            b.iter(|| build_graph(nodes, 0.5).expect("graph failed"));
        });
    }
    group.finish();
}

fn bench_retrieval(c: &mut Criterion) {
    let nodes = build_nodes(30);
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build tokio runtime");
    let query = rt
        .block_on(MockEmbedding::new().embed("birthday cake"))
        .expect("query embed failed");

    let mut group = c.benchmark_group("retrieval");
    group.bench_function("top5_of_30", |b| {
        b.iter(|| retrieve_top_k(&query, &nodes, 5).expect("retrieval failed"));
    });
    group.bench_function("top5_of_30_with_digest", |b| {
        b.iter(|| {
            let hits = retrieve_top_k(&query, &nodes, 5).expect("retrieval failed");
            format_hits(&hits)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_build_graph, bench_retrieval);
criterion_main!(benches);
