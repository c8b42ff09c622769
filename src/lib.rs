//! Query-time clustering of semantic search results.
//!
//! `subtheme` groups a handful to a few hundred search hits into coherent
//! sub-themes, so a caller can say "this query matched N distinct kinds of
//! items" instead of returning a flat ranked list. It works on embeddings that
//! were already computed elsewhere.
//!
//! The engine ([`ResultClusterer`]) composes the pieces in [`cluster`]:
//! - a global PCA projector, fit once and shared as an immutable snapshot
//! - a mutual-kNN / shared-nearest-neighbor similarity graph per query
//! - pluggable, seeded community detection (Louvain by default)
//! - a ranking policy producing a bounded, ordered cluster list
//! - a neighbor-recall quality gate for validating a fit
//!
//! ```rust
//! use subtheme::{ClusterOutcome, ClusteringConfig, ResultClusterer};
//!
//! let corpus: Vec<Vec<f32>> = (0..64)
//!     .map(|i| {
//!         let t = i as f32;
//!         vec![t.sin(), t.cos(), (0.3 * t).sin(), (0.7 * t).cos()]
//!     })
//!     .collect();
//!
//! let engine = ResultClusterer::new(ClusteringConfig::default().with_pca_components(4));
//! engine.fit_global_pca(&corpus).unwrap();
//!
//! // Too few candidates is a normal, non-error outcome.
//! let outcome = engine.cluster_search_results(&corpus[0], &corpus[..5]).unwrap();
//! assert!(matches!(outcome, ClusterOutcome::InsufficientData { .. }));
//! assert!(outcome.clusters().is_empty());
//! ```

#![forbid(unsafe_code)]

pub mod cluster;
pub mod config;
pub mod engine;
pub mod error;

pub use cluster::{
    Cluster, ClusterRanker, FitReport, FittedProjector, GlobalProjector, LabelPropagation,
    Louvain, NeighborGraphBuilder, Partition, Partitioner, QualityGate, QualityReport,
    SimilarityGraph,
};
pub use config::ClusteringConfig;
pub use engine::{ClusterOutcome, Embedded, ResultClusterer, INSUFFICIENT_DATA_MESSAGE};
pub use error::{Error, Result};
