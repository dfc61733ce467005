//! Property-based tests for similarity, graph building and retrieval.
//!
//! These check the invariants the rest of the system relies on:
//!
//! - Cosine similarity is symmetric, bounded, and 1 for a vector with itself
//! - Zero vectors score 0 against anything
//! - Raising the threshold only ever removes edges
//! - Graphs never contain self-loops or repeated pairs
//! - Retrieval is deterministic and never returns more than k hits

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use memorybridge_core::types::MemoryNode;

    use crate::graph::build_graph;
    use crate::retrieval::retrieve_top_k;
    use crate::similarity::cosine_similarity;

    const DIM: usize = 8;

    fn vector() -> impl Strategy<Value = Vec<f32>> {
        prop::collection::vec(-10.0f32..10.0f32, DIM)
    }

    fn non_zero_vector() -> impl Strategy<Value = Vec<f32>> {
        vector().prop_filter("needs a non-zero component", |v| {
            v.iter().any(|x| x.abs() > 1e-3)
        })
    }

    fn nodes(max: usize) -> impl Strategy<Value = Vec<MemoryNode>> {
        prop::collection::vec(vector(), 0..max).prop_map(|vectors| {
            vectors
                .into_iter()
                .enumerate()
                .map(|(i, v)| MemoryNode::new(format!("n{}", i), format!("caption {}", i), v, ""))
                .collect()
        })
    }

    fn threshold() -> impl Strategy<Value = f64> {
        prop_oneof![Just(-1.0), Just(0.0), Just(0.7), Just(1.0), -1.0f64..1.0f64]
    }

    // =========================================================================
    // Similarity
    // =========================================================================

    proptest! {
        #[test]
        fn similarity_is_symmetric(a in vector(), b in vector()) {
            let ab = cosine_similarity(&a, &b).unwrap();
            let ba = cosine_similarity(&b, &a).unwrap();
            prop_assert!((ab - ba).abs() < 1e-12, "{} != {}", ab, ba);
        }

        #[test]
        fn similarity_is_bounded(a in vector(), b in vector()) {
            let s = cosine_similarity(&a, &b).unwrap();
            prop_assert!((-1.0 - 1e-9..=1.0 + 1e-9).contains(&s), "out of range: {}", s);
        }

        #[test]
        fn self_similarity_is_one(a in non_zero_vector()) {
            let s = cosine_similarity(&a, &a).unwrap();
            prop_assert!((s - 1.0).abs() < 1e-6, "self similarity {}", s);
        }

        #[test]
        fn zero_vector_scores_zero(a in vector()) {
            let zero = vec![0.0f32; DIM];
            prop_assert_eq!(cosine_similarity(&zero, &a).unwrap(), 0.0);
            prop_assert_eq!(cosine_similarity(&a, &zero).unwrap(), 0.0);
        }
    }

    // =========================================================================
    // Graph
    // =========================================================================

    proptest! {
        #[test]
        fn graph_has_no_self_loops_or_duplicates(ns in nodes(12), t in threshold()) {
            let edges = build_graph(&ns, t).unwrap();
            prop_assert!(edges.len() <= ns.len() * ns.len().saturating_sub(1) / 2);

            let mut seen = HashSet::new();
            for e in &edges {
                prop_assert_ne!(&e.source_id, &e.target_id);
                let key = if e.source_id < e.target_id {
                    (e.source_id.clone(), e.target_id.clone())
                } else {
                    (e.target_id.clone(), e.source_id.clone())
                };
                prop_assert!(seen.insert(key), "duplicate pair");
            }
        }

        #[test]
        fn graph_edges_sorted_descending(ns in nodes(12), t in threshold()) {
            let edges = build_graph(&ns, t).unwrap();
            for w in edges.windows(2) {
                prop_assert!(w[0].similarity >= w[1].similarity);
            }
        }

        #[test]
        fn raising_threshold_only_removes_edges(ns in nodes(12), lo in threshold(), delta in 0.0f64..1.0) {
            let hi = lo + delta;
            let pairs = |t: f64| -> HashSet<(String, String)> {
                build_graph(&ns, t)
                    .unwrap()
                    .into_iter()
                    .map(|e| (e.source_id, e.target_id))
                    .collect()
            };
            let loose = pairs(lo);
            let strict = pairs(hi);
            prop_assert!(strict.is_subset(&loose));
        }

        #[test]
        fn graph_is_deterministic(ns in nodes(12), t in threshold()) {
            prop_assert_eq!(build_graph(&ns, t).unwrap(), build_graph(&ns, t).unwrap());
        }
    }

    // =========================================================================
    // Retrieval
    // =========================================================================

    proptest! {
        #[test]
        fn top_k_is_bounded(ns in nodes(12), q in vector(), k in 0usize..20) {
            let hits = retrieve_top_k(&q, &ns, k).unwrap();
            prop_assert_eq!(hits.len(), k.min(ns.len()));
            for w in hits.windows(2) {
                let order = w[0].score.total_cmp(&w[1].score);
                prop_assert!(order.is_gt() || (order.is_eq() && w[0].node.id < w[1].node.id));
            }
        }

        #[test]
        fn top_k_is_deterministic(ns in nodes(12), q in vector(), k in 0usize..20) {
            let first = retrieve_top_k(&q, &ns, k).unwrap();
            let second = retrieve_top_k(&q, &ns, k).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
