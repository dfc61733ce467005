//! Top-k retrieval over memory nodes and the caption digest built from it.

use std::cmp::Ordering;

use tracing::debug;

use memorybridge_core::error::Result;
use memorybridge_core::types::{MemoryNode, RetrievalHit};

use crate::similarity::cosine_similarity;

/// Default caption cut-off in [`format_hits`].
pub const DIGEST_CAPTION_MAX_CHARS: usize = 200;

const DIGEST_HEADER: &str = "Relevant memories (most similar first):";
const DIGEST_EMPTY: &str = "No matching memories found.";

/// Rank `nodes` against `query` and return the best `k`.
///
/// Ordering is score descending, then node id ascending, so equal scores
/// always come back in the same order. An empty node list gives an empty
/// result; a dimension mismatch with any node is an error.
pub fn retrieve_top_k(query: &[f32], nodes: &[MemoryNode], k: usize) -> Result<Vec<RetrievalHit>> {
    if nodes.is_empty() {
        debug!("retrieve_top_k called with empty node list");
        return Ok(Vec::new());
    }

    let mut scored = nodes
        .iter()
        .map(|node| {
            Ok(RetrievalHit {
                node: node.clone(),
                score: cosine_similarity(query, &node.embedding)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    scored.sort_by(rank_order);
    scored.truncate(k);

    debug!(
        candidates = nodes.len(),
        returned = scored.len(),
        best = scored.first().map(|h| h.score).unwrap_or(0.0),
        "Ranked retrieval candidates"
    );
    Ok(scored)
}

fn rank_order(a: &RetrievalHit, b: &RetrievalHit) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.node.id.cmp(&b.node.id))
}

/// Render hits as a numbered caption digest for the voice agent.
///
/// ```text
/// Relevant memories (most similar first):
/// 1. [score=0.9213] "Birthday party at the old house on Elm Street."
/// ```
pub fn format_hits(hits: &[RetrievalHit]) -> String {
    format_hits_with_limit(hits, DIGEST_CAPTION_MAX_CHARS)
}

/// Same as [`format_hits`] with a custom caption limit.
///
/// Captions are trimmed; anything longer than `max_chars` characters is cut
/// so that the text plus `...` is exactly `max_chars` long.
pub fn format_hits_with_limit(hits: &[RetrievalHit], max_chars: usize) -> String {
    if hits.is_empty() {
        return DIGEST_EMPTY.to_string();
    }

    let mut lines = Vec::with_capacity(hits.len() + 1);
    lines.push(DIGEST_HEADER.to_string());
    for (idx, hit) in hits.iter().enumerate() {
        let caption = truncate_caption(hit.node.text.trim(), max_chars);
        lines.push(format!("{}. [score={:.4}] \"{}\"", idx + 1, hit.score, caption));
    }
    lines.join("\n")
}

fn truncate_caption(caption: &str, max_chars: usize) -> String {
    if caption.chars().count() <= max_chars {
        return caption.to_string();
    }
    let kept: String = caption.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}
