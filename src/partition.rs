//! # Partition — Splitting the Keyspace Across Nodes
//!
//! Each cooperating node computes its own half-open slice of `[0, total)` from
//! its index and the node count; no coordination service is involved.
//!
//! Every node gets `total / nodes` offsets. The remainder either goes to the
//! last node, or with fair distribution is dropped entirely, so the trailing
//! `total % nodes` offsets are never searched by anyone.

use serde::Serialize;

/// Half-open offset interval `[offset, limit)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Range {
    pub offset: u64,
    pub limit: u64,
}

impl Range {
    pub fn new(offset: u64, limit: u64) -> Self {
        Range { offset, limit }
    }

    /// The whole keyspace `[0, total)`.
    pub fn full(total: u64) -> Self {
        Range { offset: 0, limit: total }
    }

    /// Number of offsets in the range (0 when empty or inverted).
    pub fn len(&self) -> u64 {
        self.limit.saturating_sub(self.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empty or inverted ranges cannot be searched.
    pub fn is_degenerate(&self) -> bool {
        self.limit == 0 || self.offset >= self.limit
    }

    /// This range, or the full keyspace if it is degenerate.
    pub fn or_full(self, total: u64) -> Self {
        if self.is_degenerate() {
            Range::full(total)
        } else {
            self
        }
    }
}

/// Compute node `node_index`'s share of `[0, total)` among `node_count` nodes.
///
/// `node_count` must be non-zero; the config layer rejects zero.
pub fn partition(total: u64, node_index: u64, node_count: u64, fair_distribution: bool) -> Range {
    let per_node = total / node_count;
    let offset = per_node * node_index;
    let mut limit = offset + per_node;
    if node_index + 1 == node_count && !fair_distribution {
        limit = total;
    }
    Range { offset, limit }
}
