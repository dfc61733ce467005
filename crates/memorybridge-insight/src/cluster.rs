//! Memory clustering via union-find over the similarity graph.

use std::collections::HashMap;

use tracing::{debug, info};

use memorybridge_core::types::{ClusterMap, MemoryNode, SimilarityEdge};
use memorybridge_vector::graph::build_graph;

use crate::error::InsightError;

/// Disjoint sets over node positions.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            // Path halving.
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Attach the root of `b` under the root of `a`.
    fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            self.parent[root_b] = root_a;
        }
    }
}

/// Partition `nodes` into connected components of `edges`.
///
/// Each component is labelled `cluster_{era}_{ordinal}`, taking the era of the
/// component's union-find root and counting ordinals per era in the order
/// components are first reached while walking `nodes`. A node without edges
/// is its own cluster. Edges naming an id outside `nodes` are ignored, and
/// when an id repeats only its first node takes part.
pub fn find_clusters(nodes: &[MemoryNode], edges: &[SimilarityEdge]) -> ClusterMap {
    let mut position: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
    let mut members: Vec<&MemoryNode> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if position.contains_key(node.id.as_str()) {
            debug!(id = %node.id, "Duplicate node id ignored");
            continue;
        }
        position.insert(node.id.as_str(), members.len());
        members.push(node);
    }

    let mut sets = UnionFind::new(members.len());
    let mut skipped = 0usize;
    for edge in edges {
        match (
            position.get(edge.source_id.as_str()),
            position.get(edge.target_id.as_str()),
        ) {
            (Some(&a), Some(&b)) => sets.union(a, b),
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!(skipped, "Edges with unknown endpoints skipped");
    }

    // Groups in first-seen order so ordinals are stable for a given input.
    let mut group_of_root: HashMap<usize, usize> = HashMap::new();
    let mut groups: Vec<(usize, Vec<String>)> = Vec::new();
    for (i, node) in members.iter().enumerate() {
        let root = sets.find(i);
        let slot = *group_of_root.entry(root).or_insert_with(|| {
            groups.push((root, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(node.id.clone());
    }

    let mut era_counter: HashMap<&str, usize> = HashMap::new();
    let mut clusters = ClusterMap::new();
    for (root, ids) in groups {
        let era = members[root].era.as_str();
        let ordinal = era_counter.entry(era).or_insert(0);
        clusters.insert(format!("cluster_{}_{}", era, ordinal), ids);
        *ordinal += 1;
    }

    info!(
        clusters = clusters.len(),
        nodes = members.len(),
        "Community detection complete"
    );
    clusters
}

/// Builds the similarity graph and clusters it in one step.
pub struct MemoryClusterer {
    /// Minimum cosine similarity for two captions to be connected.
    pub threshold: f64,
}

impl MemoryClusterer {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Build edges over `nodes` and return them with the resulting clusters.
    pub fn cluster(
        &self,
        nodes: &[MemoryNode],
    ) -> Result<(Vec<SimilarityEdge>, ClusterMap), InsightError> {
        let edges = build_graph(nodes, self.threshold)?;
        let clusters = find_clusters(nodes, &edges);
        Ok((edges, clusters))
    }
}

impl Default for MemoryClusterer {
    fn default() -> Self {
        Self::new(0.7)
    }
}
