//! Building blocks of query-time result clustering.
//!
//! ## Pipeline
//!
//! ```text
//! embeddings ─► FittedProjector ─► NeighborGraphBuilder ─► Partitioner ─► ClusterRanker
//!     (D)          (K, unit)         (mutual kNN / SNN)      (Louvain)      (bounded list)
//! ```
//!
//! ### Projection
//!
//! A normalized PCA basis is fit once over a large population
//! ([`GlobalProjector::fit`]) and reused for every query. Working in the
//! reduced space makes per-query neighbor search cheaper and less noisy.
//! [`QualityGate`] measures whether the reduction kept local neighborhoods.
//!
//! ### Graph
//!
//! Candidates become nodes; an edge survives only between *mutual* k-nearest
//! neighbors, weighted either by cosine similarity or by shared-nearest-neighbor
//! overlap (Jaccard over each point plus its neighbors). Points with no mutual
//! neighbor are isolated.
//!
//! ### Communities
//!
//! Any [`Partitioner`] can be plugged in. [`Louvain`] optimizes
//! resolution-scaled modularity; [`LabelPropagation`] is a cheaper single-level
//! alternative. Both are seeded and deterministic.
//!
//! ### Ranking
//!
//! [`ClusterRanker`] drops small communities, scores the rest against the
//! query, orders them by size then query similarity, and truncates.
//!
//! ## Usage
//!
//! ```rust
//! use subtheme::cluster::{
//!     ClusterRanker, GlobalProjector, Louvain, NeighborGraphBuilder, Partitioner,
//! };
//!
//! let corpus: Vec<Vec<f32>> = (0..40)
//!     .map(|i| {
//!         let t = i as f32 * 0.1;
//!         if i % 2 == 0 { vec![1.0, t, 0.0] } else { vec![0.0, t, 1.0] }
//!     })
//!     .collect();
//!
//! let projector = GlobalProjector::new(3).with_seed(42).fit(&corpus).unwrap();
//! let vectors = projector.project(&corpus).unwrap();
//! let query = projector.project_one(&[1.0, 0.5, 0.0]).unwrap();
//!
//! let graph = NeighborGraphBuilder::new(5).with_snn(false).build(&vectors);
//! let partition = Louvain::new().partition(&graph, 1.0, 42).unwrap();
//! let clusters = ClusterRanker::new(3, 8).rank(&partition, &vectors, &query);
//!
//! assert!(clusters.len() <= 8);
//! assert!(clusters.iter().all(|c| c.size >= 3));
//! ```

mod graph;
mod label_propagation;
mod louvain;
mod partition;
mod projector;
mod quality;
mod ranker;
mod traits;
mod util;

pub use graph::{Edge, NeighborGraphBuilder, SimilarityGraph};
pub use label_propagation::LabelPropagation;
pub use louvain::Louvain;
pub use partition::Partition;
pub use projector::{FitReport, FittedProjector, GlobalProjector};
pub use quality::{QualityGate, QualityReport, DEFAULT_RECALL_K, DEFAULT_RECALL_THRESHOLD};
pub use ranker::{Cluster, ClusterRanker, REPRESENTATIVES};
pub use traits::Partitioner;
