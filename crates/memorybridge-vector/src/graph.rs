//! Semantic graph construction.
//!
//! Every unordered pair of nodes is compared once; pairs at or above the
//! threshold become edges. The caller bounds N (30 captions per memory gives
//! at most 435 comparisons), so no approximate index is involved.

use tracing::info;

use memorybridge_core::error::Result;
use memorybridge_core::types::{MemoryNode, SimilarityEdge};

use crate::similarity::{cosine_similarity, round4};

/// Number of pair comparisons `build_graph` performs for `n` nodes.
pub fn max_comparisons(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Build the undirected similarity graph over `nodes`.
///
/// Pairs `(i, j)` with `i < j` are enumerated by position, so the earlier node
/// is always the source and no pair is seen twice. The raw similarity is
/// compared against `threshold`; only the stored value is rounded to 4
/// decimals. Edges come back sorted by similarity descending, ties in
/// enumeration order.
///
/// Fails with `DimensionMismatch` if two embeddings differ in length.
pub fn build_graph(nodes: &[MemoryNode], threshold: f64) -> Result<Vec<SimilarityEdge>> {
    let n = nodes.len();
    info!(
        nodes = n,
        threshold,
        max_comparisons = max_comparisons(n),
        "Building semantic graph"
    );

    let mut edges = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            let sim = cosine_similarity(&nodes[i].embedding, &nodes[j].embedding)?;
            if sim >= threshold {
                edges.push(SimilarityEdge {
                    source_id: nodes[i].id.clone(),
                    target_id: nodes[j].id.clone(),
                    similarity: round4(sim),
                });
            }
        }
    }

    // Stable: equal similarities keep enumeration order.
    edges.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

    info!(edges = edges.len(), threshold, "Semantic graph built");
    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use memorybridge_core::error::MemoryBridgeError;
    use std::collections::HashSet;

    fn node(id: &str, embedding: Vec<f32>) -> MemoryNode {
        MemoryNode::new(id, format!("caption {}", id), embedding, "")
    }

    #[test]
    fn test_two_identical_one_orthogonal() {
        let nodes = vec![
            node("node0", vec![1.0, 0.0]),
            node("node1", vec![1.0, 0.0]),
            node("node2", vec![0.0, 1.0]),
        ];
        let edges = build_graph(&nodes, 0.9).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source_id, "node0");
        assert_eq!(edges[0].target_id, "node1");
        assert_eq!(edges[0].similarity, 1.0);
        assert!(edges
            .iter()
            .all(|e| e.source_id != "node2" && e.target_id != "node2"));
    }

    #[test]
    fn test_empty_and_single_node() {
        assert!(build_graph(&[], 0.7).unwrap().is_empty());
        assert!(build_graph(&[node("only", vec![1.0])], 0.0).unwrap().is_empty());
    }

    #[test]
    fn test_single_node_skips_dimension_check() {
        // Nothing to compare, so nothing to mismatch.
        assert!(build_graph(&[node("a", vec![1.0, 2.0, 3.0])], 0.5)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_sorted_by_similarity_descending() {
        let nodes = vec![
            node("a", vec![1.0, 0.0]),
            node("b", vec![0.8, 0.6]),
            node("c", vec![1.0, 0.1]),
        ];
        let edges = build_graph(&nodes, 0.0).unwrap();
        assert_eq!(edges.len(), 3);
        for pair in edges.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
        assert_eq!((edges[0].source_id.as_str(), edges[0].target_id.as_str()), ("a", "c"));
    }

    #[test]
    fn test_ties_keep_enumeration_order() {
        let nodes = vec![
            node("a", vec![1.0, 0.0]),
            node("b", vec![1.0, 0.0]),
            node("c", vec![1.0, 0.0]),
        ];
        let edges = build_graph(&nodes, 0.5).unwrap();
        let pairs: Vec<(&str, &str)> = edges
            .iter()
            .map(|e| (e.source_id.as_str(), e.target_id.as_str()))
            .collect();
        assert_eq!(pairs, vec![("a", "b"), ("a", "c"), ("b", "c")]);
    }

    #[test]
    fn test_similarity_rounded_to_four_decimals() {
        let nodes = vec![node("a", vec![1.0, 0.0]), node("b", vec![0.9, 0.3])];
        let edges = build_graph(&nodes, 0.0).unwrap();
        let raw = 0.9 / (0.9f64 * 0.9 + 0.3 * 0.3).sqrt();
        assert_eq!(edges[0].similarity, (raw * 10_000.0).round() / 10_000.0);
    }

    #[test]
    fn test_threshold_compares_raw_value() {
        // Raw similarity sits just under the threshold but rounds up to it.
        let angle: f64 = 0.69996f64.acos();
        let b = vec![angle.cos() as f32, angle.sin() as f32];
        let nodes = vec![node("a", vec![1.0, 0.0]), node("b", b)];
        let raw = cosine_similarity(&nodes[0].embedding, &nodes[1].embedding).unwrap();
        assert!(raw < 0.7);
        assert_eq!(round4(raw), 0.7);

        assert!(build_graph(&nodes, 0.7).unwrap().is_empty());
        let edges = build_graph(&nodes, raw).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].similarity, 0.7);
    }

    #[test]
    fn test_no_self_loops_or_duplicates() {
        let nodes: Vec<MemoryNode> = (0..8)
            .map(|i| node(&format!("n{}", i), vec![1.0, i as f32 * 0.1]))
            .collect();
        let edges = build_graph(&nodes, -1.0).unwrap();
        assert_eq!(edges.len(), max_comparisons(8));

        let mut seen = HashSet::new();
        for e in &edges {
            assert_ne!(e.source_id, e.target_id);
            let key = if e.source_id < e.target_id {
                (e.source_id.clone(), e.target_id.clone())
            } else {
                (e.target_id.clone(), e.source_id.clone())
            };
            assert!(seen.insert(key), "duplicate pair");
        }
    }

    #[test]
    fn test_dimension_mismatch_propagates() {
        let nodes = vec![node("a", vec![1.0, 0.0, 0.0]), node("b", vec![1.0; 5])];
        let err = build_graph(&nodes, 0.7).unwrap_err();
        assert!(matches!(err, MemoryBridgeError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_max_comparisons() {
        assert_eq!(max_comparisons(0), 0);
        assert_eq!(max_comparisons(1), 0);
        assert_eq!(max_comparisons(2), 1);
        assert_eq!(max_comparisons(30), 435);
    }
}
