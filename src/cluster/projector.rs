//! Global linear projector: normalized PCA fit once, applied per query.
//!
//! # Pipeline
//!
//! ```text
//! fit:     rows → L2 normalize → second-moment matrix → top-K eigenvectors
//! project: row  → L2 normalize → basis → L2 normalize
//! ```
//!
//! The basis is fit on the uncentered second moment `XᵀX / n` of the
//! normalized rows (truncated SVD of `X`), not on the covariance. Cosine
//! geometry is about directions from the origin; subtracting the corpus mean
//! would move that origin. With `K = D` the projection is an orthogonal
//! rotation, so every cosine, and therefore every neighbor set, is preserved.
//!
//! The eigenvectors are found with seeded randomized subspace iteration
//! (Halko, Martinsson & Tropp, 2011): a block of `K + 10` random directions is
//! repeatedly multiplied by the second-moment matrix and re-orthonormalized, then a
//! Rayleigh-Ritz step (cyclic Jacobi on the small projected matrix) rotates
//! the block onto eigenvectors. When `K` equals the input dimension the block
//! spans the whole space and the decomposition is exact.
//!
//! Fitting produces a [`FittedProjector`], an immutable snapshot. Refitting
//! means building a new snapshot; nothing here is mutated after construction,
//! so a snapshot can be shared across threads behind an `Arc`.

use super::util;
use crate::error::{Error, Result};
use rand::prelude::*;
use serde::Serialize;

/// Extra random directions carried through subspace iteration.
const OVERSAMPLE: usize = 10;

/// Maximum cyclic Jacobi sweeps in the Rayleigh-Ritz step.
const MAX_JACOBI_SWEEPS: usize = 64;

/// Fits a [`FittedProjector`] over an embedding population.
#[derive(Debug, Clone)]
pub struct GlobalProjector {
    n_components: usize,
    power_iterations: usize,
    seed: Option<u64>,
}

impl GlobalProjector {
    /// Create a projector that reduces to `n_components` dimensions.
    pub fn new(n_components: usize) -> Self {
        Self {
            n_components,
            power_iterations: 8,
            seed: None,
        }
    }

    /// Set the number of subspace-iteration rounds.
    pub fn with_power_iterations(mut self, power_iterations: usize) -> Self {
        self.power_iterations = power_iterations;
        self
    }

    /// Set the RNG seed used for the initial random block.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fit the projection on `corpus`.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyInput`] if `corpus` is empty.
    /// - [`Error::DimensionMismatch`] if rows have different lengths.
    /// - [`Error::InvalidParameter`] if the dimension is zero or `n_components` is
    ///   zero or larger than `min(n_samples, dimension)`.
    pub fn fit(&self, corpus: &[Vec<f32>]) -> Result<FittedProjector> {
        if corpus.is_empty() {
            return Err(Error::EmptyInput);
        }

        let n = corpus.len();
        let d = corpus[0].len();
        if d == 0 {
            return Err(Error::InvalidParameter {
                name: "dimension",
                message: "must be at least 1",
            });
        }
        for row in corpus.iter().skip(1) {
            if row.len() != d {
                return Err(Error::DimensionMismatch {
                    expected: d,
                    found: row.len(),
                });
            }
        }
        if self.n_components == 0 {
            return Err(Error::InvalidParameter {
                name: "n_components",
                message: "must be at least 1",
            });
        }
        if self.n_components > n.min(d) {
            return Err(Error::InvalidParameter {
                name: "n_components",
                message: "must not exceed min(n_samples, dimension)",
            });
        }

        let rows: Vec<Vec<f32>> = corpus.iter().map(|v| util::normalized(v)).collect();

        let mut mean = vec![0.0f64; d];
        for row in &rows {
            for (m, &x) in mean.iter_mut().zip(row.iter()) {
                *m += f64::from(x);
            }
        }
        for m in &mut mean {
            *m /= n as f64;
        }

        let cov = second_moment(&rows, d);
        let trace: f64 = (0..d).map(|i| cov[i * d + i]).sum();

        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };
        let (eigenvalues, eigenvectors) = top_eigenpairs(
            &cov,
            d,
            self.n_components,
            self.power_iterations,
            rng.as_mut(),
        );

        let explained_variance_ratio: Vec<f32> = eigenvalues
            .iter()
            .map(|&lambda| {
                if trace > 0.0 {
                    (lambda.max(0.0) / trace) as f32
                } else {
                    0.0
                }
            })
            .collect();
        let total_variance = explained_variance_ratio.iter().sum();

        Ok(FittedProjector {
            input_dim: d,
            mean: mean.iter().map(|&m| m as f32).collect(),
            components: eigenvectors
                .iter()
                .map(|v| v.iter().map(|&x| x as f32).collect())
                .collect(),
            explained_variance_ratio,
            total_variance,
        })
    }
}

/// An immutable, fitted projection from `D` to `K` normalized dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedProjector {
    input_dim: usize,
    mean: Vec<f32>,
    /// `K` rows of length `D`, ordered by decreasing explained variance.
    components: Vec<Vec<f32>>,
    explained_variance_ratio: Vec<f32>,
    total_variance: f32,
}

impl FittedProjector {
    /// Dimension `D` the projector was fit on.
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Output dimension `K`.
    pub fn n_components(&self) -> usize {
        self.components.len()
    }

    /// Mean of the normalized fit corpus.
    ///
    /// Recorded for diagnostics (e.g. drift checks between fits); projection
    /// does not subtract it.
    pub fn mean(&self) -> &[f32] {
        &self.mean
    }

    /// Principal axes, one row per component.
    pub fn components(&self) -> &[Vec<f32>] {
        &self.components
    }

    /// Fraction of total variance captured by each component.
    pub fn explained_variance_ratio(&self) -> &[f32] {
        &self.explained_variance_ratio
    }

    /// Sum of [`Self::explained_variance_ratio`].
    pub fn total_variance(&self) -> f32 {
        self.total_variance
    }

    /// Diagnostic summary of the fit.
    pub fn report(&self) -> FitReport {
        FitReport {
            status: "success",
            n_components: self.n_components(),
            explained_variance_ratio: self.explained_variance_ratio.clone(),
            total_variance: self.total_variance,
        }
    }

    /// Project a single vector.
    ///
    /// The output has unit norm, or is exactly zero when `vector` is the zero
    /// vector (or orthogonal to every component).
    pub fn project_one(&self, vector: &[f32]) -> Result<Vec<f32>> {
        if vector.len() != self.input_dim {
            return Err(Error::DimensionMismatch {
                expected: self.input_dim,
                found: vector.len(),
            });
        }

        let k = self.components.len();
        let x = util::normalized(vector);
        if x.iter().all(|&v| v == 0.0) {
            return Ok(vec![0.0; k]);
        }

        let mut out: Vec<f32> = self
            .components
            .iter()
            .map(|axis| util::dot(axis, &x))
            .collect();
        util::normalize_in_place(&mut out);
        Ok(out)
    }

    /// Project every row of `vectors`.
    pub fn project(&self, vectors: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        vectors.iter().map(|v| self.project_one(v)).collect()
    }
}

/// Summary returned by a fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitReport {
    /// Always `"success"`; failures are reported as `Err`.
    pub status: &'static str,
    /// Output dimension `K`.
    pub n_components: usize,
    /// Per-component explained-variance ratio.
    pub explained_variance_ratio: Vec<f32>,
    /// Sum of the ratios.
    pub total_variance: f32,
}

/// Uncentered second moment `XᵀX / n` of `rows`, dense row-major `d x d`.
fn second_moment(rows: &[Vec<f32>], d: usize) -> Vec<f64> {
    let mut m = vec![0.0f64; d * d];
    for row in rows {
        for a in 0..d {
            let xa = f64::from(row[a]);
            if xa == 0.0 {
                continue;
            }
            let dst = &mut m[a * d..(a + 1) * d];
            for (b, &xb) in row.iter().enumerate().skip(a) {
                dst[b] += xa * f64::from(xb);
            }
        }
    }

    let n = rows.len().max(1) as f64;
    for a in 0..d {
        for b in a..d {
            let v = m[a * d + b] / n;
            m[a * d + b] = v;
            m[b * d + a] = v;
        }
    }
    m
}

/// Top-`k` eigenpairs of the symmetric positive semi-definite `d x d` matrix `cov`, largest first.
fn top_eigenpairs(
    cov: &[f64],
    d: usize,
    k: usize,
    iterations: usize,
    rng: &mut dyn RngCore,
) -> (Vec<f64>, Vec<Vec<f64>>) {
    let p = (k + OVERSAMPLE).min(d);

    let mut block: Vec<Vec<f64>> = (0..p).map(|_| random_direction(d, rng)).collect();
    orthonormalize(&mut block, rng);
    for _ in 0..iterations {
        block = block.iter().map(|q| mat_vec(cov, d, q)).collect();
        orthonormalize(&mut block, rng);
    }

    // Rayleigh-Ritz: T = Qᵀ C Q.
    let cq: Vec<Vec<f64>> = block.iter().map(|q| mat_vec(cov, d, q)).collect();
    let mut t = vec![0.0f64; p * p];
    for a in 0..p {
        for b in a..p {
            let v = dot64(&block[a], &cq[b]);
            t[a * p + b] = v;
            t[b * p + a] = v;
        }
    }
    let (values, vectors) = jacobi_eigen(t, p);

    let mut order: Vec<usize> = (0..p).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]).then(a.cmp(&b)));

    let mut eigenvalues = Vec::with_capacity(k);
    let mut eigenvectors = Vec::with_capacity(k);
    for &c in order.iter().take(k) {
        let mut v = vec![0.0f64; d];
        for (a, q) in block.iter().enumerate() {
            let w = vectors[a * p + c];
            for (dst, &x) in v.iter_mut().zip(q.iter()) {
                *dst += w * x;
            }
        }
        scale_to_unit(&mut v);
        orient(&mut v);
        eigenvalues.push(values[c]);
        eigenvectors.push(v);
    }
    (eigenvalues, eigenvectors)
}

/// Modified Gram-Schmidt, two passes. Columns that collapse (linearly dependent,
/// or exactly zero because they fell in the null space) are replaced with fresh
/// random directions so the block stays full rank.
fn orthonormalize(block: &mut [Vec<f64>], rng: &mut dyn RngCore) {
    for i in 0..block.len() {
        let mut attempts = 0;
        loop {
            let before = norm64(&block[i]);
            let (done, rest) = block.split_at_mut(i);
            let col = &mut rest[0];
            for _ in 0..2 {
                for prev in done.iter() {
                    let proj = dot64(col, prev);
                    for (x, &y) in col.iter_mut().zip(prev.iter()) {
                        *x -= proj * y;
                    }
                }
            }

            let after = norm64(col);
            if after > 1e-8 * before && after > 0.0 {
                for x in col.iter_mut() {
                    *x /= after;
                }
                break;
            }

            attempts += 1;
            if attempts > 8 {
                col.iter_mut().for_each(|x| *x = 0.0);
                break;
            }
            *col = random_direction(col.len(), rng);
        }
    }
}

/// Eigen-decomposition of a symmetric `n x n` matrix by cyclic Jacobi rotations.
///
/// Returns `(eigenvalues, eigenvectors)` where `eigenvectors[a * n + c]` is
/// component `a` of eigenvector `c`.
fn jacobi_eigen(mut a: Vec<f64>, n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut v = vec![0.0f64; n * n];
    for i in 0..n {
        v[i * n + i] = 1.0;
    }

    for _ in 0..MAX_JACOBI_SWEEPS {
        let mut off = 0.0f64;
        let mut total = 0.0f64;
        for i in 0..n {
            for j in 0..n {
                let x = a[i * n + j] * a[i * n + j];
                total += x;
                if i != j {
                    off += x;
                }
            }
        }
        if off <= 1e-24 * total || off == 0.0 {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[p * n + q];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[q * n + q] - a[p * n + p]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[k * n + p];
                    let akq = a[k * n + q];
                    a[k * n + p] = c * akp - s * akq;
                    a[k * n + q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[p * n + k];
                    let aqk = a[q * n + k];
                    a[p * n + k] = c * apk - s * aqk;
                    a[q * n + k] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let vkp = v[k * n + p];
                    let vkq = v[k * n + q];
                    v[k * n + p] = c * vkp - s * vkq;
                    v[k * n + q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let values = (0..n).map(|i| a[i * n + i]).collect();
    (values, v)
}

fn random_direction(d: usize, rng: &mut dyn RngCore) -> Vec<f64> {
    // Uniform in [-1, 1].
    (0..d).map(|_| rng.random::<f64>() * 2.0 - 1.0).collect()
}

fn mat_vec(m: &[f64], d: usize, x: &[f64]) -> Vec<f64> {
    (0..d).map(|r| dot64(&m[r * d..(r + 1) * d], x)).collect()
}

#[inline]
fn dot64(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[inline]
fn norm64(v: &[f64]) -> f64 {
    dot64(v, v).sqrt()
}

fn scale_to_unit(v: &mut [f64]) {
    let n = norm64(v);
    if n > 0.0 {
        for x in v.iter_mut() {
            *x /= n;
        }
    }
}

/// Flip sign so the largest-magnitude coordinate is positive.
fn orient(v: &mut [f64]) {
    let pivot = v
        .iter()
        .copied()
        .fold(0.0f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
    if pivot < 0.0 {
        for x in v.iter_mut() {
            *x = -*x;
        }
    }
}
