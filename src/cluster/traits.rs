use super::graph::SimilarityGraph;
use super::partition::Partition;
use crate::error::Result;

/// Common interface for community detection over a [`SimilarityGraph`].
///
/// Implementations must:
/// - return an exhaustive, disjoint partition of `0..graph.n_nodes()`;
/// - leave nodes without edges as singleton groups;
/// - produce more, smaller communities as `resolution` grows;
/// - return the identical partition for the same graph, `resolution`, and `seed`.
pub trait Partitioner: Send + Sync {
    /// Partition `graph` into communities.
    fn partition(&self, graph: &SimilarityGraph, resolution: f64, seed: u64) -> Result<Partition>;
}

impl<P: Partitioner + ?Sized> Partitioner for Box<P> {
    fn partition(&self, graph: &SimilarityGraph, resolution: f64, seed: u64) -> Result<Partition> {
        (**self).partition(graph, resolution, seed)
    }
}
