//! Turning a raw partition into the bounded, ordered cluster list a caller renders.
//!
//! Policy, in order:
//!
//! 1. Drop groups smaller than `min_cluster_size`. They are noise and are never
//!    merged into a neighbor.
//! 2. Score survivors: centroid (plain mean, not re-normalized), cosine
//!    similarity of centroid to the query, first three members as
//!    representatives.
//! 3. Sort by size, largest first; break ties by query similarity, then by id.
//!    A large, loosely related group therefore outranks a small, highly
//!    relevant one: coverage first, relevance second.
//! 4. Keep at most `max_clusters`.
//!
//! Representatives are taken in partition order (ascending candidate index),
//! not by distance to the centroid. Candidates usually arrive in retrieval
//! order, so these are the best-ranked hits of the group.

use super::partition::Partition;
use super::util;
use crate::config::ClusteringConfig;
use serde::{Deserialize, Serialize};

/// Number of representative members reported per cluster.
pub const REPRESENTATIVES: usize = 3;

/// A ranked sub-theme of the candidate set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Community id from the partition (not renumbered after filtering).
    pub id: usize,
    /// Number of members.
    pub size: usize,
    /// Member candidate indices, ascending.
    pub indices: Vec<usize>,
    /// Mean of the members' projected vectors.
    pub centroid: Vec<f32>,
    /// Cosine similarity between the centroid and the projected query.
    pub query_similarity: f32,
    /// Up to three member indices, in partition order.
    pub representative_items: Vec<usize>,
}

/// Filters, scores, orders, and truncates communities.
#[derive(Debug, Clone)]
pub struct ClusterRanker {
    min_cluster_size: usize,
    max_clusters: usize,
}

impl ClusterRanker {
    /// Create a ranker.
    pub fn new(min_cluster_size: usize, max_clusters: usize) -> Self {
        Self {
            min_cluster_size,
            max_clusters,
        }
    }

    /// Take `min_cluster_size` and `max_clusters` from `config`.
    pub fn from_config(config: &ClusteringConfig) -> Self {
        Self::new(config.min_cluster_size, config.max_clusters)
    }

    /// Rank `partition` over the projected candidate `vectors` against `query`.
    pub fn rank(&self, partition: &Partition, vectors: &[Vec<f32>], query: &[f32]) -> Vec<Cluster> {
        let mut clusters: Vec<Cluster> = partition
            .groups()
            .iter()
            .enumerate()
            .filter(|(_, members)| members.len() >= self.min_cluster_size && !members.is_empty())
            .map(|(id, members)| {
                let centroid = centroid(vectors, members);
                Cluster {
                    id,
                    size: members.len(),
                    indices: members.clone(),
                    query_similarity: util::cosine_similarity(&centroid, query),
                    centroid,
                    representative_items: members.iter().take(REPRESENTATIVES).copied().collect(),
                }
            })
            .collect();

        clusters.sort_by(|a, b| {
            b.size
                .cmp(&a.size)
                .then(b.query_similarity.total_cmp(&a.query_similarity))
                .then(a.id.cmp(&b.id))
        });
        clusters.truncate(self.max_clusters);
        clusters
    }
}

fn centroid(vectors: &[Vec<f32>], members: &[usize]) -> Vec<f32> {
    let dim = vectors[members[0]].len();
    let mut sum = vec![0.0f32; dim];
    for &m in members {
        for (s, &x) in sum.iter_mut().zip(vectors[m].iter()) {
            *s += x;
        }
    }
    let n = members.len() as f32;
    sum.iter_mut().for_each(|s| *s /= n);
    sum
}
