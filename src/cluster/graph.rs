//! Mutual-kNN similarity graphs over projected vectors.
//!
//! # Construction
//!
//! ```text
//! vectors → exact cosine kNN → mutual pairs → weights → SimilarityGraph
//! ```
//!
//! 1. **kNN**: each point's `k` nearest neighbors by cosine distance
//!    (`k = min(k, M - 1)`, self excluded, ties to the lower index).
//! 2. **Mutuality**: `i — j` is a candidate only when `j ∈ kNN(i)` and
//!    `i ∈ kNN(j)`. Asymmetric links are pruned, so boundary points tend to end
//!    up isolated. Downstream they become singleton communities and are dropped
//!    as noise rather than force-merged into a neighbor.
//! 3. **Weights**:
//!    - SNN: Jaccard overlap of the two neighborhoods, each point counted in
//!      its own neighborhood (`N(i) = kNN(i) ∪ {i}`):
//!      `|N(i) ∩ N(j)| / |N(i) ∪ N(j)|`. A clique of `k + 1` points therefore
//!      gets weight 1. Edges below the threshold are dropped even though the
//!      pair is mutual.
//!    - Otherwise: cosine similarity, clamped to `[0, 1]`.
//!
//! The result is a `petgraph` [`UnGraph`] wrapped in [`SimilarityGraph`]. It is
//! rebuilt from scratch on every call; nothing is cached.
//!
//! # References
//!
//! - Jarvis & Patrick (1973). "Clustering Using a Similarity Measure Based on
//!   Shared Near Neighbors." IEEE Transactions on Computers.

use super::util;
use crate::config::ClusteringConfig;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

/// An undirected edge, reported with `source < target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// Lower endpoint.
    pub source: usize,
    /// Higher endpoint.
    pub target: usize,
    /// Weight in `[0, 1]`.
    pub weight: f32,
}

/// Weighted undirected graph over nodes `0..n_nodes`.
///
/// Node `i` is `NodeIndex::new(i)` in the underlying [`UnGraph`]. Every pair is
/// connected at most once and there are no self loops, so
/// `weight(i, j) == weight(j, i)` always holds.
#[derive(Debug, Clone)]
pub struct SimilarityGraph {
    inner: UnGraph<(), f32>,
}

impl SimilarityGraph {
    /// A graph with `n_nodes` nodes and no edges.
    pub fn empty(n_nodes: usize) -> Self {
        let mut inner = UnGraph::with_capacity(n_nodes, 0);
        for _ in 0..n_nodes {
            inner.add_node(());
        }
        Self { inner }
    }

    /// Build from `(i, j, weight)` triples. Self loops and repeated pairs are ignored.
    ///
    /// Mostly useful for feeding hand-built graphs to a [`super::Partitioner`].
    pub fn from_edges(n_nodes: usize, triples: impl IntoIterator<Item = (usize, usize, f32)>) -> Self {
        let mut graph = Self::empty(n_nodes);
        for (i, j, w) in triples {
            if i == j || i >= n_nodes || j >= n_nodes || graph.weight(i, j).is_some() {
                continue;
            }
            graph.add_edge(i, j, w);
        }
        graph
    }

    fn add_edge(&mut self, i: usize, j: usize, weight: f32) {
        self.inner
            .add_edge(NodeIndex::new(i), NodeIndex::new(j), weight);
    }

    /// The underlying `petgraph` graph.
    pub fn as_petgraph(&self) -> &UnGraph<(), f32> {
        &self.inner
    }

    /// Number of nodes.
    pub fn n_nodes(&self) -> usize {
        self.inner.node_count()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// All edges, each listed once, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.inner.edge_references().map(|e| {
            let (a, b) = (e.source().index(), e.target().index());
            Edge {
                source: a.min(b),
                target: a.max(b),
                weight: *e.weight(),
            }
        })
    }

    /// `(neighbor, weight)` pairs incident to `node`.
    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        let a = NodeIndex::new(node);
        self.inner.edges(a).map(move |e| {
            let other = if e.source() == a { e.target() } else { e.source() };
            (other.index(), *e.weight())
        })
    }

    /// Weight of the edge between `i` and `j`, if present.
    pub fn weight(&self, i: usize, j: usize) -> Option<f32> {
        let n = self.n_nodes();
        if i >= n || j >= n {
            return None;
        }
        self.inner
            .find_edge(NodeIndex::new(i), NodeIndex::new(j))
            .map(|e| self.inner[e])
    }

    /// Sum of incident edge weights.
    pub fn strength(&self, node: usize) -> f64 {
        self.neighbors(node).map(|(_, w)| f64::from(w)).sum()
    }

    /// Sum of all edge weights (each edge counted once).
    pub fn total_weight(&self) -> f64 {
        self.inner.edge_weights().map(|&w| f64::from(w)).sum()
    }
}

/// Builds a [`SimilarityGraph`] from projected vectors.
#[derive(Debug, Clone)]
pub struct NeighborGraphBuilder {
    k: usize,
    use_snn: bool,
    snn_threshold: f32,
}

impl NeighborGraphBuilder {
    /// Create a builder with `k` neighbors per point and SNN weighting at threshold 0.4.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            use_snn: true,
            snn_threshold: 0.4,
        }
    }

    /// Take `k_neighbors`, `use_snn`, and `snn_threshold` from `config`.
    pub fn from_config(config: &ClusteringConfig) -> Self {
        Self {
            k: config.k_neighbors,
            use_snn: config.use_snn,
            snn_threshold: config.snn_threshold,
        }
    }

    /// Toggle shared-nearest-neighbor weighting.
    pub fn with_snn(mut self, use_snn: bool) -> Self {
        self.use_snn = use_snn;
        self
    }

    /// Minimum Jaccard overlap for an edge to survive when SNN weighting is on.
    pub fn with_snn_threshold(mut self, snn_threshold: f32) -> Self {
        self.snn_threshold = snn_threshold;
        self
    }

    /// Build the mutual-kNN graph over `vectors`.
    pub fn build(&self, vectors: &[Vec<f32>]) -> SimilarityGraph {
        let m = vectors.len();
        let k = self.k.min(m.saturating_sub(1));
        if m <= 1 || k == 0 {
            return SimilarityGraph::empty(m);
        }

        let knn = util::knn_cosine(vectors, k);

        // Dense membership matrix: `is_neighbor[i * m + j]` iff `j ∈ kNN(i)`.
        let mut is_neighbor = vec![false; m * m];
        for (i, row) in knn.iter().enumerate() {
            for &j in row {
                is_neighbor[i * m + j] = true;
            }
        }

        let mut graph = SimilarityGraph::empty(m);
        for (i, row) in knn.iter().enumerate() {
            for &j in row {
                // Unordered pair visited once, from its lower endpoint.
                if j <= i || !is_neighbor[j * m + i] {
                    continue;
                }

                let weight = if self.use_snn {
                    // `i` and `j` are each in both neighborhoods.
                    let shared = 2 + knn[i]
                        .iter()
                        .filter(|&&x| is_neighbor[j * m + x])
                        .count();
                    let union = (knn[i].len() + 1) + (knn[j].len() + 1) - shared;
                    let w = shared as f32 / union as f32;
                    if w < self.snn_threshold {
                        continue;
                    }
                    w
                } else {
                    util::cosine_similarity(&vectors[i], &vectors[j]).clamp(0.0, 1.0)
                };

                graph.add_edge(i, j, weight);
            }
        }
        graph
    }
}
