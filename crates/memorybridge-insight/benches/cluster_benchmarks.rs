//! Clustering benchmark at the per-memory node cap (30 nodes).

use criterion::{criterion_group, criterion_main, Criterion};

use memorybridge_core::types::{MemoryNode, SimilarityEdge};
use memorybridge_insight::{find_clusters, MemoryClusterer};

fn nodes(count: usize) -> Vec<MemoryNode> {
    (0..count)
        .map(|i| {
            let angle = (i % 5) as f32 * 0.3;
            MemoryNode::new(
                format!("mem_{}", i),
                format!("caption {}", i),
                vec![angle.cos(), angle.sin(), 0.1 * (i % 3) as f32],
                if i % 2 == 0 { "1978" } else { "1991-04-02" },
            )
        })
        .collect()
}

fn bench_clusters(c: &mut Criterion) {
    let nodes = nodes(30);
    let clusterer = MemoryClusterer::new(0.9);
    let (edges, _) = clusterer.cluster(&nodes).expect("cluster failed");

    c.bench_function("find_clusters_30", |b| {
        b.iter(|| find_clusters(&nodes, &edges));
    });

    // Worst case: every pair connected.
    let dense: Vec<SimilarityEdge> = (0..nodes.len())
        .flat_map(|i| ((i + 1)..nodes.len()).map(move |j| (i, j)))
        .map(|(i, j)| SimilarityEdge {
            source_id: nodes[i].id.clone(),
            target_id: nodes[j].id.clone(),
            similarity: 1.0,
        })
        .collect();
    c.bench_function("find_clusters_30_dense", |b| {
        b.iter(|| find_clusters(&nodes, &dense));
    });

    c.bench_function("graph_and_clusters_30", |b| {
        b.iter(|| clusterer.cluster(&nodes).expect("cluster failed"));
    });
}

criterion_group!(benches, bench_clusters);
criterion_main!(benches);
