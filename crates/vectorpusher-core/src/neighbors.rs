//! Cosine top-k neighbor retrieval over an embedding table.
//!
//! Similarities are `Wn . normalize(query)`. Non-finite similarities (a
//! corrupted row) are replaced with `-1.0` so they sort last and can never
//! poison the selection. Every row whose normalized form matches the
//! normalized query within the self-match tolerance is treated as the
//! query's own row and dropped, duplicates included.
//!
//! Ordering is deterministic: similarity descending, equal similarities by
//! ascending row index.

use std::cmp::Ordering;

use tracing::warn;

use crate::config::BlendConfig;
use crate::vector::{dot, max_abs_diff, normalize_with_epsilon, EmbeddingTable, EPSILON};

/// Candidate neighbors with their raw cosine similarities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeighborCandidates {
    /// Row ids into the embedding table, most similar first.
    pub indices: Vec<usize>,
    /// Raw similarity of each row, parallel to `indices`.
    pub similarities: Vec<f32>,
}

impl NeighborCandidates {
    /// Number of neighbors.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether no neighbor was found.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Neighbor rows with a probability weighting over them.
///
/// Invariant: indices are distinct, weights are non-negative and sum to one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeighborSet {
    /// Row ids into the embedding table.
    pub indices: Vec<usize>,
    /// Weight of each row, parallel to `indices`.
    pub weights: Vec<f32>,
}

impl NeighborSet {
    /// Pair indices with weights.
    pub fn new(indices: Vec<usize>, weights: Vec<f32>) -> Self {
        debug_assert_eq!(indices.len(), weights.len());
        Self { indices, weights }
    }

    /// Number of neighbors.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Top-k cosine neighbor search with self-exclusion.
#[derive(Debug, Clone, Copy)]
pub struct NeighborFinder {
    self_match_tolerance: f32,
    epsilon: f32,
}

impl Default for NeighborFinder {
    fn default() -> Self {
        Self {
            self_match_tolerance: 1e-6,
            epsilon: EPSILON,
        }
    }
}

impl NeighborFinder {
    /// Create a finder with an explicit self-match tolerance.
    pub fn new(self_match_tolerance: f32, epsilon: f32) -> Self {
        Self {
            self_match_tolerance,
            epsilon,
        }
    }

    /// Create from the blend configuration.
    pub fn from_config(config: &BlendConfig) -> Self {
        Self::new(config.self_match_tolerance, config.epsilon)
    }

    /// Cosine similarity of every table row to `query`.
    ///
    /// Non-finite values are replaced with `-1.0`.
    pub fn similarities(&self, query: &[f32], table: &EmbeddingTable) -> Vec<f32> {
        let qn = normalize_with_epsilon(query, self.epsilon);
        self.similarities_normalized(&qn, table)
    }

    fn similarities_normalized(&self, qn: &[f32], table: &EmbeddingTable) -> Vec<f32> {
        let mut neutralized = 0usize;
        let sims: Vec<f32> = table
            .normalized_rows()
            .map(|row| {
                let s = dot(row, qn);
                if s.is_finite() {
                    s
                } else {
                    neutralized += 1;
                    -1.0
                }
            })
            .collect();
        if neutralized > 0 {
            warn!(neutralized, "Replaced non-finite similarities with -1.0");
        }
        sims
    }

    /// Find the `k` rows most similar to `query`, excluding every row that
    /// matches it.
    ///
    /// Returns fewer than `k` neighbors when the table is too small.
    pub fn find(&self, query: &[f32], table: &EmbeddingTable, k: usize) -> NeighborCandidates {
        if k == 0 || table.is_empty() {
            return NeighborCandidates::default();
        }
        let qn = normalize_with_epsilon(query, self.epsilon);
        let sims = self.similarities_normalized(&qn, table);

        let n = sims.len();
        let cmp = |a: &usize, b: &usize| -> Ordering {
            sims[*b]
                .partial_cmp(&sims[*a])
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.cmp(b))
        };
        let is_self = |i: usize| {
            table
                .normalized_row(i)
                .is_some_and(|row| max_abs_diff(row, &qn) <= self.self_match_tolerance)
        };

        // Every row matching the query is dropped, so widen the window until
        // k candidates survive or the table is exhausted.
        let mut take = (k + 1).min(n);
        let indices: Vec<usize> = loop {
            let mut order: Vec<usize> = (0..n).collect();
            if take < n {
                order.select_nth_unstable_by(take - 1, cmp);
                order.truncate(take);
            }
            order.sort_unstable_by(cmp);
            let window = order.len();
            order.retain(|&i| !is_self(i));
            if order.len() >= k || take == n {
                order.truncate(k);
                break order;
            }
            take = (take + window - order.len()).min(n);
        };
        let similarities = indices.iter().map(|&i| sims[i]).collect();

        NeighborCandidates {
            indices,
            similarities,
        }
    }
}
