//! Louvain community detection with a resolution parameter.
//!
//! # Objective (Reichardt & Bornholdt, 2006)
//!
//! ```text
//! Q = Σ_ij [ A_ij − γ · k_i k_j / 2m ] · δ(c_i, c_j)
//! ```
//!
//! `γ = 1` is classic modularity. Larger `γ` penalizes big communities harder
//! and yields more, smaller groups.
//!
//! # Algorithm (Blondel et al., 2008)
//!
//! 1. **Local moving**: visit nodes in a seeded random order; move each to the
//!    neighboring community with the largest strictly positive gain
//!    `w(i → C) − γ · k_i · Σtot(C) / 2m`. Repeat until a full pass makes no move.
//! 2. **Aggregation**: collapse each community into a node (internal weight
//!    becomes a self loop) and go back to step 1.
//! 3. Stop when a level makes no move.
//!
//! Louvain can leave a community internally disconnected after later levels
//! move its bridge nodes away. As a final refinement every community is split
//! into its connected components, so returned groups are always connected
//! (the guarantee Leiden is known for, without Leiden's full refinement phase).
//!
//! # References
//!
//! - Blondel, Guillaume, Lambiotte & Lefebvre (2008). "Fast unfolding of
//!   communities in large networks." J. Stat. Mech.
//! - Reichardt & Bornholdt (2006). "Statistical mechanics of community
//!   detection." Phys. Rev. E.
//! - Traag, Waltman & van Eck (2019). "From Louvain to Leiden: guaranteeing
//!   well-connected communities." Scientific Reports.

use super::graph::SimilarityGraph;
use super::partition::Partition;
use super::traits::Partitioner;
use super::util::UnionFind;
use petgraph::visit::EdgeRef;
use crate::error::{Error, Result};
use rand::prelude::*;
use std::collections::BTreeMap;

/// Gains must beat the current assignment by more than this to trigger a move.
const MIN_GAIN: f64 = 1e-12;

/// Multi-level Louvain partitioner.
#[derive(Debug, Clone)]
pub struct Louvain {
    max_levels: usize,
    max_passes: usize,
}

impl Louvain {
    /// Create a Louvain partitioner with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of aggregation levels.
    pub fn with_max_levels(mut self, max_levels: usize) -> Self {
        self.max_levels = max_levels;
        self
    }

    /// Cap the number of local-moving passes per level.
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }
}

impl Default for Louvain {
    fn default() -> Self {
        Self {
            max_levels: 32,
            max_passes: 64,
        }
    }
}

impl Partitioner for Louvain {
    fn partition(&self, graph: &SimilarityGraph, resolution: f64, seed: u64) -> Result<Partition> {
        check_resolution(resolution)?;

        let n = graph.n_nodes();
        if graph.total_weight() <= 0.0 {
            return Ok(Partition::singletons(n));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut level = Level::from_graph(graph);
        // Original node -> node of the current level.
        let mut membership: Vec<usize> = (0..n).collect();

        for depth in 0..self.max_levels.max(1) {
            let (labels, moved) = level.local_moving(resolution, self.max_passes.max(1), &mut rng);
            if !moved {
                break;
            }

            let (dense, count) = renumber(&labels);
            for m in &mut membership {
                *m = dense[*m];
            }
            tracing::trace!(depth, nodes = level.len(), communities = count, "louvain level");

            if count == level.len() {
                break;
            }
            level = level.aggregate(&dense, count);
        }

        Ok(Partition::from_labels(&split_disconnected(graph, &membership)))
    }
}

pub(crate) fn check_resolution(resolution: f64) -> Result<()> {
    if !resolution.is_finite() {
        return Err(Error::InvalidParameter {
            name: "resolution",
            message: "must be finite",
        });
    }
    Ok(())
}

/// One level of the Louvain hierarchy, in f64.
pub(crate) struct Level {
    /// Neighbor lists without self loops.
    adj: Vec<Vec<(usize, f64)>>,
    /// `A_ii` (already counting internal edges in both directions).
    self_loops: Vec<f64>,
    /// `k_i = Σ_j A_ij`, self loop included.
    strength: Vec<f64>,
    two_m: f64,
}

impl Level {
    pub(crate) fn from_graph(graph: &SimilarityGraph) -> Self {
        let g = graph.as_petgraph();
        let adj: Vec<Vec<(usize, f64)>> = g
            .node_indices()
            .map(|a| {
                g.edges(a)
                    .map(|e| {
                        let other = if e.source() == a { e.target() } else { e.source() };
                        (other.index(), f64::from(*e.weight()))
                    })
                    .collect()
            })
            .collect();
        let n = adj.len();
        let strength: Vec<f64> = adj
            .iter()
            .map(|row| row.iter().map(|&(_, w)| w).sum())
            .collect();
        let two_m = strength.iter().sum();
        Self {
            adj,
            self_loops: vec![0.0; n],
            strength,
            two_m,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.adj.len()
    }

    /// Greedy local moving. Returns per-node community labels and whether any node moved.
    pub(crate) fn local_moving(
        &self,
        resolution: f64,
        max_passes: usize,
        rng: &mut StdRng,
    ) -> (Vec<usize>, bool) {
        let n = self.len();
        let mut community: Vec<usize> = (0..n).collect();
        let mut tot = self.strength.clone();
        let mut order: Vec<usize> = (0..n).collect();

        let mut link = vec![0.0f64; n];
        let mut listed = vec![false; n];
        let mut touched: Vec<usize> = Vec::new();
        let mut moved_any = false;

        if self.two_m <= 0.0 {
            return (community, false);
        }

        for _ in 0..max_passes {
            order.shuffle(rng);
            let mut moved = false;

            for &i in &order {
                let current = community[i];
                let ki = self.strength[i];

                for &(j, w) in &self.adj[i] {
                    let c = community[j];
                    if !listed[c] {
                        listed[c] = true;
                        touched.push(c);
                    }
                    link[c] += w;
                }

                tot[current] -= ki;
                let penalty = resolution * ki / self.two_m;

                let mut best = current;
                let mut best_gain = link[current] - penalty * tot[current];
                for &c in &touched {
                    let gain = link[c] - penalty * tot[c];
                    if gain > best_gain + MIN_GAIN {
                        best = c;
                        best_gain = gain;
                    }
                }

                tot[best] += ki;
                if best != current {
                    community[i] = best;
                    moved = true;
                }

                for &c in &touched {
                    link[c] = 0.0;
                    listed[c] = false;
                }
                touched.clear();
            }

            if !moved {
                break;
            }
            moved_any = true;
        }

        (community, moved_any)
    }

    /// Collapse communities (`labels`, dense in `0..count`) into single nodes.
    pub(crate) fn aggregate(&self, labels: &[usize], count: usize) -> Level {
        let mut self_loops = vec![0.0f64; count];
        let mut links: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); count];

        for (i, row) in self.adj.iter().enumerate() {
            let ci = labels[i];
            self_loops[ci] += self.self_loops[i];
            for &(j, w) in row {
                let cj = labels[j];
                if ci == cj {
                    self_loops[ci] += w;
                } else {
                    *links[ci].entry(cj).or_insert(0.0) += w;
                }
            }
        }

        let adj: Vec<Vec<(usize, f64)>> = links
            .into_iter()
            .map(|m| m.into_iter().collect())
            .collect();
        let strength: Vec<f64> = adj
            .iter()
            .zip(self_loops.iter())
            .map(|(row, &s)| s + row.iter().map(|&(_, w)| w).sum::<f64>())
            .collect();

        Level {
            adj,
            self_loops,
            strength,
            two_m: self.two_m,
        }
    }
}

/// Map arbitrary labels to `0..count` in order of first appearance.
pub(crate) fn renumber(labels: &[usize]) -> (Vec<usize>, usize) {
    let mut map: BTreeMap<usize, usize> = BTreeMap::new();
    let dense = labels
        .iter()
        .map(|&l| {
            let next = map.len();
            *map.entry(l).or_insert(next)
        })
        .collect();
    (dense, map.len())
}

/// Split every community into the connected components of its induced subgraph.
pub(crate) fn split_disconnected(graph: &SimilarityGraph, labels: &[usize]) -> Vec<usize> {
    let mut uf = UnionFind::new(graph.n_nodes());
    for e in graph.edges() {
        if labels[e.source] == labels[e.target] {
            uf.union(e.source, e.target);
        }
    }
    (0..graph.n_nodes()).map(|i| uf.find(i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two 5-cliques joined by a single weak bridge.
    fn barbell() -> SimilarityGraph {
        let mut triples = Vec::new();
        for base in [0, 5] {
            for i in 0..5 {
                for j in (i + 1)..5 {
                    triples.push((base + i, base + j, 1.0));
                }
            }
        }
        triples.push((4, 5, 0.1));
        SimilarityGraph::from_edges(10, triples)
    }

    #[test]
    fn splits_barbell_into_cliques() {
        let p = Louvain::new().partition(&barbell(), 1.0, 42).unwrap();
        assert_eq!(p.groups(), &[vec![0, 1, 2, 3, 4], vec![5, 6, 7, 8, 9]]);
    }

    #[test]
    fn edgeless_graph_yields_singletons() {
        let g = SimilarityGraph::empty(4);
        let p = Louvain::new().partition(&g, 1.0, 0).unwrap();
        assert_eq!(p.len(), 4);
        assert!(p.groups().iter().all(|g| g.len() == 1));
    }

    #[test]
    fn isolated_nodes_stay_alone() {
        let mut triples: Vec<(usize, usize, f32)> = Vec::new();
        for i in 0..4 {
            for j in (i + 1)..4 {
                triples.push((i, j, 1.0));
            }
        }
        let g = SimilarityGraph::from_edges(6, triples);
        let p = Louvain::new().partition(&g, 1.0, 3).unwrap();
        assert_eq!(p.groups(), &[vec![0, 1, 2, 3], vec![4], vec![5]]);
    }

    #[test]
    fn partition_is_exhaustive_and_disjoint() {
        let g = barbell();
        let p = Louvain::new().partition(&g, 1.0, 7).unwrap();
        let mut seen: Vec<usize> = p.groups().iter().flatten().copied().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn higher_resolution_gives_more_communities() {
        let g = barbell();
        let coarse = Louvain::new().partition(&g, 0.001, 1).unwrap();
        let fine = Louvain::new().partition(&g, 1.0, 1).unwrap();
        let finest = Louvain::new().partition(&g, 50.0, 1).unwrap();
        assert_eq!(coarse.len(), 1);
        assert!(coarse.len() <= fine.len());
        assert!(fine.len() <= finest.len());
        assert_eq!(finest.len(), 10);
    }

    #[test]
    fn same_seed_same_partition() {
        let g = barbell();
        let a = Louvain::new().partition(&g, 1.0, 9).unwrap();
        let b = Louvain::new().partition(&g, 1.0, 9).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_non_finite_resolution() {
        assert!(Louvain::new()
            .partition(&barbell(), f64::NAN, 0)
            .is_err());
    }

    #[test]
    fn aggregation_preserves_total_strength() {
        let g = barbell();
        let level = Level::from_graph(&g);
        let labels = [0, 0, 0, 0, 0, 1, 1, 1, 1, 1];
        let agg = level.aggregate(&labels, 2);
        let before: f64 = level.strength.iter().sum();
        let after: f64 = agg.strength.iter().sum();
        assert!((before - after).abs() < 1e-9);
        assert!((agg.self_loops[0] - 20.0).abs() < 1e-9);
        assert_eq!(agg.adj[0].len(), 1);
    }

    #[test]
    fn split_disconnected_separates_components() {
        let g = SimilarityGraph::from_edges(4, [(0, 1, 1.0), (2, 3, 1.0)]);
        let labels = split_disconnected(&g, &[0, 0, 0, 0]);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
    }
}
