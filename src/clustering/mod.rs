//! Batch clustering of fixed datasets.
//!
//! This module partitions a caller-owned dataset into k groups by iterative
//! centroid refinement (Lloyd's algorithm):
//! - Centroid initialization from a seeded random sample or caller-supplied vectors
//! - Parallel nearest-centroid assignment with deterministic results
//! - Explicit, deterministic handling of clusters that lose all members

pub mod kmeans;

pub use kmeans::{KMeans, KMeansResult};

use serde::{Deserialize, Serialize};

/// What to do when a centroid update finds a cluster with no assigned vectors.
///
/// Computing the mean of an empty cluster is undefined, so the clusterer
/// resolves it internally according to this policy. Both variants are
/// deterministic for a given seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EmptyClusterPolicy {
    /// Keep the previous centroid unchanged for the empty cluster.
    #[default]
    KeepPrevious,
    /// Re-seed the empty cluster's centroid from a randomly drawn dataset vector.
    Resample,
}

/// Configuration for a k-means run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeansConfig {
    /// Maximum number of assign/update iterations. Must be at least 1.
    pub max_iterations: usize,
    /// Componentwise centroid-movement tolerance for the convergence check.
    pub tolerance: f32,
    /// Seed for centroid initialization (and `Resample` draws). `None` uses
    /// OS entropy, making the run non-deterministic.
    pub seed: Option<u64>,
    /// How to handle clusters that lose all members during an update.
    pub empty_cluster_policy: EmptyClusterPolicy,
    /// Run the assignment step on the rayon pool for large datasets.
    pub parallel: bool,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-6,
            seed: None,
            empty_cluster_policy: EmptyClusterPolicy::KeepPrevious,
            parallel: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_round_trip() {
        let config = KMeansConfig {
            max_iterations: 25,
            tolerance: 1e-4,
            seed: Some(42),
            empty_cluster_policy: EmptyClusterPolicy::Resample,
            parallel: false,
        };

        let json = serde_json::to_string(&config).unwrap();
        let restored: KMeansConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.max_iterations, 25);
        assert_eq!(restored.seed, Some(42));
        assert_eq!(
            restored.empty_cluster_policy,
            EmptyClusterPolicy::Resample
        );
    }
}
