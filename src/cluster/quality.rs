//! Neighborhood-preservation check for a fitted projector.
//!
//! Graph clustering in the reduced space is only meaningful if the reduction
//! keeps local neighborhoods intact. For every sample point we compare its
//! top-k cosine neighbors in the original (normalized) space with its top-k
//! neighbors in the projected space:
//!
//! ```text
//! recall@k(p) = |kNN_orig(p) ∩ kNN_proj(p)| / k
//! ```
//!
//! The mean over all points is reported and compared against a fixed bar.
//! Run this after every fit; it is never part of the query path.

use super::projector::FittedProjector;
use super::util;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default neighborhood size for the recall measurement.
pub const DEFAULT_RECALL_K: usize = 20;

/// Default minimum mean recall for a projector to pass.
pub const DEFAULT_RECALL_THRESHOLD: f32 = 0.95;

/// Outcome of [`QualityGate::check`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Total explained-variance ratio of the projector.
    pub pca_explained_variance: f32,
    /// Mean neighbor recall between original and projected spaces.
    pub knn_recall_at_20: f32,
    /// `knn_recall_at_20 >= threshold`.
    pub quality_passed: bool,
    /// Projector output dimension.
    pub n_components: usize,
    /// Number of sample vectors evaluated.
    pub total_samples: usize,
}

/// Measures neighbor recall through a [`FittedProjector`].
#[derive(Debug, Clone)]
pub struct QualityGate {
    recall_k: usize,
    threshold: f32,
}

impl Default for QualityGate {
    fn default() -> Self {
        Self {
            recall_k: DEFAULT_RECALL_K,
            threshold: DEFAULT_RECALL_THRESHOLD,
        }
    }
}

impl QualityGate {
    /// Create a gate with recall@20 and a 0.95 pass mark.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the neighborhood size.
    pub fn with_recall_k(mut self, recall_k: usize) -> Self {
        self.recall_k = recall_k;
        self
    }

    /// Set the pass mark.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Evaluate `projector` on `sample`.
    ///
    /// The effective neighborhood is `min(recall_k, sample.len() - 1)`; a point is
    /// never its own neighbor.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyInput`] if `sample` is empty.
    /// - [`Error::InvalidParameter`] if `sample` has a single vector or `recall_k` is zero.
    /// - [`Error::DimensionMismatch`] if a vector does not match the projector's input dimension.
    pub fn check(&self, projector: &FittedProjector, sample: &[Vec<f32>]) -> Result<QualityReport> {
        if sample.is_empty() {
            return Err(Error::EmptyInput);
        }
        if sample.len() < 2 {
            return Err(Error::InvalidParameter {
                name: "sample",
                message: "must contain at least two vectors",
            });
        }
        if self.recall_k == 0 {
            return Err(Error::InvalidParameter {
                name: "recall_k",
                message: "must be at least 1",
            });
        }

        let projected = projector.project(sample)?;
        let original: Vec<Vec<f32>> = sample.iter().map(|v| util::normalized(v)).collect();

        let k = self.recall_k.min(sample.len() - 1);
        let before = util::knn_cosine(&original, k);
        let after = util::knn_cosine(&projected, k);

        let total: f64 = before
            .iter()
            .zip(after.iter())
            .map(|(a, b)| {
                let hits = a.iter().filter(|x| b.contains(x)).count();
                hits as f64 / k as f64
            })
            .sum();
        let recall = (total / sample.len() as f64) as f32;
        let passed = recall >= self.threshold;

        tracing::debug!(
            recall,
            k,
            samples = sample.len(),
            passed,
            "projector quality check"
        );

        Ok(QualityReport {
            pca_explained_variance: projector.total_variance(),
            knn_recall_at_20: recall,
            quality_passed: passed,
            n_components: projector.n_components(),
            total_samples: sample.len(),
        })
    }
}
