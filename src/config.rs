//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Tunables for the query-time clustering engine.
///
/// Every field has a default, so partial documents deserialize cleanly:
///
/// ```rust
/// use subtheme::ClusteringConfig;
///
/// let config = ClusteringConfig::default().with_k_neighbors(10).with_use_snn(false);
/// assert_eq!(config.k_neighbors, 10);
/// assert_eq!(config.min_cluster_size, 8);
/// ```
///
/// Values are not range-checked; degenerate settings (e.g. `k_neighbors = 0`)
/// produce degenerate but well-formed output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Output dimensionality of the global projector.
    pub pca_components: usize,
    /// Neighbors per point when building the similarity graph.
    pub k_neighbors: usize,
    /// Community-detection resolution; higher yields more, smaller communities.
    pub resolution: f64,
    /// Communities smaller than this are dropped as noise.
    pub min_cluster_size: usize,
    /// Maximum number of clusters returned per query.
    pub max_clusters: usize,
    /// Weight edges by shared-nearest-neighbor (Jaccard) overlap instead of cosine similarity.
    pub use_snn: bool,
    /// Minimum SNN weight for a mutual-kNN edge to be kept.
    pub snn_threshold: f32,
    /// Seed for community detection and projector initialization.
    pub seed: u64,
    /// Subspace-iteration rounds used when fitting the projector.
    pub power_iterations: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            pca_components: 128,
            k_neighbors: 20,
            resolution: 1.0,
            min_cluster_size: 8,
            max_clusters: 8,
            use_snn: true,
            snn_threshold: 0.4,
            seed: 42,
            power_iterations: 8,
        }
    }
}

impl ClusteringConfig {
    /// Set the projector's output dimensionality.
    pub fn with_pca_components(mut self, pca_components: usize) -> Self {
        self.pca_components = pca_components;
        self
    }

    /// Set neighbors per point.
    pub fn with_k_neighbors(mut self, k_neighbors: usize) -> Self {
        self.k_neighbors = k_neighbors;
        self
    }

    /// Set the community-detection resolution.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the minimum cluster size.
    pub fn with_min_cluster_size(mut self, min_cluster_size: usize) -> Self {
        self.min_cluster_size = min_cluster_size;
        self
    }

    /// Set the maximum number of returned clusters.
    pub fn with_max_clusters(mut self, max_clusters: usize) -> Self {
        self.max_clusters = max_clusters;
        self
    }

    /// Toggle SNN weighting.
    pub fn with_use_snn(mut self, use_snn: bool) -> Self {
        self.use_snn = use_snn;
        self
    }

    /// Set the SNN edge threshold.
    pub fn with_snn_threshold(mut self, snn_threshold: f32) -> Self {
        self.snn_threshold = snn_threshold;
        self
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of subspace-iteration rounds used by `fit`.
    pub fn with_power_iterations(mut self, power_iterations: usize) -> Self {
        self.power_iterations = power_iterations;
        self
    }
}
