//! The composed query-time engine.
//!
//! ```text
//!                  ┌───────────── fit_global_pca ─────────────┐
//!                  ▼                                          │
//! query ──► FittedProjector ──► NeighborGraphBuilder ──► Partitioner ──► ClusterRanker ──► ClusterOutcome
//! results ─┘  (Arc snapshot)
//! ```
//!
//! The fitted projector is an immutable snapshot behind an `Arc`. A refit
//! builds a new snapshot and swaps the pointer under a short write lock; calls
//! already in flight keep the snapshot they cloned, so they never observe a
//! half-updated basis. Configuration is copied at the start of each call for
//! the same reason.

use crate::cluster::{
    Cluster, ClusterRanker, FitReport, FittedProjector, GlobalProjector, Louvain,
    NeighborGraphBuilder, Partitioner, QualityGate, QualityReport,
};
use crate::config::ClusteringConfig;
use crate::error::{Error, Result};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

/// Message attached to [`ClusterOutcome::InsufficientData`].
pub const INSUFFICIENT_DATA_MESSAGE: &str = "Not enough results for clustering";

/// Anything that carries an embedding vector (e.g. a search hit).
pub trait Embedded {
    /// The raw, unprojected embedding.
    fn embedding(&self) -> &[f32];
}

impl Embedded for Vec<f32> {
    fn embedding(&self) -> &[f32] {
        self
    }
}

impl Embedded for [f32] {
    fn embedding(&self) -> &[f32] {
        self
    }
}

impl<T: Embedded + ?Sized> Embedded for &T {
    fn embedding(&self) -> &[f32] {
        (**self).embedding()
    }
}

/// Result of [`ResultClusterer::cluster_search_results`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClusterOutcome {
    /// The candidates were clustered (the list may still be empty if every
    /// community was below the minimum size).
    Clustered {
        /// Ranked clusters, at most `max_clusters`.
        clusters: Vec<Cluster>,
        /// The projected query.
        query_embedding: Vec<f32>,
        /// `clusters.len()`.
        n_clusters: usize,
        /// Number of candidates considered.
        total_points: usize,
    },
    /// Fewer candidates than `min_cluster_size`; nothing was clustered.
    InsufficientData {
        /// The projected query.
        query_embedding: Vec<f32>,
        /// Human-readable explanation.
        message: String,
    },
}

impl ClusterOutcome {
    /// Returned clusters; empty for [`ClusterOutcome::InsufficientData`].
    pub fn clusters(&self) -> &[Cluster] {
        match self {
            ClusterOutcome::Clustered { clusters, .. } => clusters,
            ClusterOutcome::InsufficientData { .. } => &[],
        }
    }

    /// The projected query vector.
    pub fn query_embedding(&self) -> &[f32] {
        match self {
            ClusterOutcome::Clustered {
                query_embedding, ..
            }
            | ClusterOutcome::InsufficientData {
                query_embedding, ..
            } => query_embedding,
        }
    }

    /// Informational message, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            ClusterOutcome::Clustered { .. } => None,
            ClusterOutcome::InsufficientData { message, .. } => Some(message),
        }
    }
}

/// Query-time result clustering over a shared, swappable projector snapshot.
///
/// `ResultClusterer` is `Send + Sync`; share it behind an `Arc` and call it from
/// any number of threads, including while another thread refits.
#[derive(Debug)]
pub struct ResultClusterer<P = Louvain> {
    config: RwLock<ClusteringConfig>,
    projector: RwLock<Option<Arc<FittedProjector>>>,
    partitioner: P,
}

impl ResultClusterer<Louvain> {
    /// Create an unfitted engine using [`Louvain`] community detection.
    pub fn new(config: ClusteringConfig) -> Self {
        Self::with_partitioner(config, Louvain::default())
    }
}

impl Default for ResultClusterer<Louvain> {
    fn default() -> Self {
        Self::new(ClusteringConfig::default())
    }
}

impl<P: Partitioner> ResultClusterer<P> {
    /// Create an unfitted engine with a custom community-detection backend.
    pub fn with_partitioner(config: ClusteringConfig, partitioner: P) -> Self {
        Self {
            config: RwLock::new(config),
            projector: RwLock::new(None),
            partitioner,
        }
    }

    /// A copy of the current configuration.
    pub fn config(&self) -> ClusteringConfig {
        self.config.read().clone()
    }

    /// Replace the configuration. Takes effect for calls that start afterwards.
    pub fn set_config(&self, config: ClusteringConfig) {
        *self.config.write() = config;
    }

    /// Edit the configuration in place.
    pub fn update_config(&self, f: impl FnOnce(&mut ClusteringConfig)) {
        f(&mut *self.config.write());
    }

    /// The current projector snapshot, if fitted.
    pub fn projector(&self) -> Option<Arc<FittedProjector>> {
        self.projector.read().clone()
    }

    /// True once a projector has been fitted or installed.
    pub fn is_fitted(&self) -> bool {
        self.projector.read().is_some()
    }

    /// Swap in an externally fitted projector.
    pub fn install_projector(&self, projector: Arc<FittedProjector>) {
        tracing::info!(
            input_dim = projector.input_dim(),
            n_components = projector.n_components(),
            "installing projector snapshot"
        );
        *self.projector.write() = Some(projector);
    }

    /// Fit a new global projector on `embeddings` and make it current.
    ///
    /// Uses `pca_components`, `power_iterations`, and `seed` from the configuration.
    /// On error the previous snapshot (if any) stays in place.
    pub fn fit_global_pca(&self, embeddings: &[Vec<f32>]) -> Result<FitReport> {
        let config = self.config();
        let fitted = GlobalProjector::new(config.pca_components)
            .with_power_iterations(config.power_iterations)
            .with_seed(config.seed)
            .fit(embeddings)?;
        let report = fitted.report();

        tracing::info!(
            samples = embeddings.len(),
            n_components = report.n_components,
            total_variance = report.total_variance,
            "fitted global projector"
        );
        *self.projector.write() = Some(Arc::new(fitted));
        Ok(report)
    }

    /// Group `results` into ranked sub-themes relative to `query`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFitted`] before any fit.
    /// - [`Error::DimensionMismatch`] if the query or a result embedding does not
    ///   match the fitted input dimension.
    pub fn cluster_search_results<T: Embedded>(
        &self,
        query: &[f32],
        results: &[T],
    ) -> Result<ClusterOutcome> {
        let projector = self.projector().ok_or(Error::NotFitted)?;
        let config = self.config();

        let query_embedding = projector.project_one(query)?;
        if results.len() < config.min_cluster_size {
            tracing::debug!(
                candidates = results.len(),
                min_cluster_size = config.min_cluster_size,
                "too few candidates to cluster"
            );
            return Ok(ClusterOutcome::InsufficientData {
                query_embedding,
                message: INSUFFICIENT_DATA_MESSAGE.to_string(),
            });
        }

        let vectors = results
            .iter()
            .map(|r| projector.project_one(r.embedding()))
            .collect::<Result<Vec<_>>>()?;

        let graph = NeighborGraphBuilder::from_config(&config).build(&vectors);
        let partition = self
            .partitioner
            .partition(&graph, config.resolution, config.seed)?;
        let clusters = ClusterRanker::from_config(&config).rank(&partition, &vectors, &query_embedding);

        tracing::debug!(
            candidates = vectors.len(),
            edges = graph.edge_count(),
            communities = partition.len(),
            clusters = clusters.len(),
            "clustered search results"
        );

        Ok(ClusterOutcome::Clustered {
            n_clusters: clusters.len(),
            total_points: vectors.len(),
            clusters,
            query_embedding,
        })
    }

    /// Measure how well the current projector preserves neighborhoods on `embeddings`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFitted`] before any fit, plus the errors of [`QualityGate::check`].
    pub fn quality_check(&self, embeddings: &[Vec<f32>]) -> Result<QualityReport> {
        let projector = self.projector().ok_or(Error::NotFitted)?;
        QualityGate::default().check(&projector, embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Vec<f32>> {
        (0..32)
            .map(|i| {
                let t = i as f32;
                vec![t.sin(), t.cos(), (t * 0.5).sin(), 1.0]
            })
            .collect()
    }

    #[test]
    fn unfitted_engine_reports_not_fitted() {
        let engine = ResultClusterer::default();
        assert!(!engine.is_fitted());
        let results = vec![vec![1.0f32; 4]; 10];
        assert_eq!(
            engine.cluster_search_results(&[1.0; 4], &results),
            Err(Error::NotFitted)
        );
        assert_eq!(engine.quality_check(&corpus()), Err(Error::NotFitted));
    }

    #[test]
    fn fit_installs_snapshot() {
        let engine = ResultClusterer::new(ClusteringConfig::default().with_pca_components(3));
        let report = engine.fit_global_pca(&corpus()).unwrap();
        assert_eq!(report.n_components, 3);
        assert!(engine.is_fitted());
        assert_eq!(engine.projector().unwrap().input_dim(), 4);
    }

    #[test]
    fn failed_refit_keeps_previous_snapshot() {
        let engine = ResultClusterer::new(ClusteringConfig::default().with_pca_components(3));
        engine.fit_global_pca(&corpus()).unwrap();
        let before = engine.projector().unwrap();

        assert!(engine.fit_global_pca(&[]).is_err());
        assert!(Arc::ptr_eq(&before, &engine.projector().unwrap()));
    }

    #[test]
    fn config_updates_apply() {
        let engine = ResultClusterer::default();
        engine.update_config(|c| c.k_neighbors = 7);
        assert_eq!(engine.config().k_neighbors, 7);
        engine.set_config(ClusteringConfig::default());
        assert_eq!(engine.config().k_neighbors, 20);
    }

    #[test]
    fn accepts_borrowed_embeddings() {
        let engine = ResultClusterer::new(
            ClusteringConfig::default()
                .with_pca_components(3)
                .with_min_cluster_size(2)
                .with_k_neighbors(3),
        );
        engine.fit_global_pca(&corpus()).unwrap();
        let data = corpus();
        let borrowed: Vec<&[f32]> = data.iter().map(|v| v.as_slice()).collect();
        let outcome = engine.cluster_search_results(&data[0], &borrowed).unwrap();
        assert_eq!(outcome.query_embedding().len(), 3);
        assert!(outcome.message().is_none());
    }
}
