//! Single-level greedy moving: Louvain's first phase, without aggregation.
//!
//! Every node starts in its own community. In seeded random order, each node
//! moves to the neighboring community with the best resolution-scaled
//! modularity gain
//!
//! ```text
//! w(i → C) − γ · k_i · Σtot(C) / 2m
//! ```
//!
//! staying put unless another community is strictly better, until a sweep
//! makes no move. This is exactly the local-moving step [`super::Louvain`]
//! runs on its first level; stopping there (no community graph, no further
//! levels) is the whole difference. With `γ = 0` the score reduces to the
//! weighted neighbor vote of classic label propagation, which is where the
//! name comes from. It is cheaper than full Louvain and tends to leave more,
//! smaller communities, since merges between already-formed groups never
//! happen.
//!
//! # References
//!
//! - Raghavan, Albert & Kumara (2007). "Near linear time algorithm to detect
//!   community structures in large-scale networks." Phys. Rev. E.

use super::graph::SimilarityGraph;
use super::louvain::{check_resolution, split_disconnected, Level};
use super::partition::Partition;
use super::traits::Partitioner;
use crate::error::Result;
use rand::prelude::*;

/// Single-level greedy moving (Louvain level 0).
#[derive(Debug, Clone)]
pub struct LabelPropagation {
    max_iterations: usize,
}

impl LabelPropagation {
    /// Create a label-propagation partitioner with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of sweeps over all nodes.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

impl Default for LabelPropagation {
    fn default() -> Self {
        Self {
            max_iterations: 100,
        }
    }
}

impl Partitioner for LabelPropagation {
    fn partition(&self, graph: &SimilarityGraph, resolution: f64, seed: u64) -> Result<Partition> {
        check_resolution(resolution)?;
        if graph.total_weight() <= 0.0 {
            return Ok(Partition::singletons(graph.n_nodes()));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let (labels, _) =
            Level::from_graph(graph).local_moving(resolution, self.max_iterations.max(1), &mut rng);
        Ok(Partition::from_labels(&split_disconnected(graph, &labels)))
    }
}
