//! K-means batch clusterer (Lloyd's algorithm).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::clustering::{EmptyClusterPolicy, KMeansConfig};
use crate::error::{Result, VicinityError};
use crate::vector::Vector;

/// Above this many vectors the assignment step uses the rayon pool.
const PARALLEL_ASSIGN_THRESHOLD: usize = 1000;

/// Batch clusterer that partitions a fixed dataset into k groups.
///
/// Each run assigns every dataset vector to its nearest centroid by Euclidean
/// distance, recomputes each centroid as the mean of its members, and repeats
/// until the centroids stop moving or the iteration budget runs out. The
/// dataset is read but never mutated; labels in the result are index-aligned
/// with the input.
pub struct KMeans {
    k: usize,
    config: KMeansConfig,
}

/// Outcome of a k-means run.
///
/// Exhausting the iteration budget is not an error: `converged` is false and
/// the last computed centroids and labels are returned as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    /// Final centroids, exactly k of them.
    pub centroids: Vec<Vector>,
    /// Group label per dataset vector, each in `[0, k)`.
    pub labels: Vec<usize>,
    /// Number of assign/update iterations performed.
    pub iterations: usize,
    /// Whether the final update moved every centroid component within tolerance.
    pub converged: bool,
    /// Sum of squared distances from each vector to its assigned centroid.
    pub inertia: f32,
}

impl KMeans {
    /// Create a new clusterer for k groups.
    pub fn new(k: usize, config: KMeansConfig) -> Self {
        Self { k, config }
    }

    /// Get the target group count.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Get the configuration.
    pub fn config(&self) -> &KMeansConfig {
        &self.config
    }

    /// Cluster the dataset, initializing centroids from a random sample.
    ///
    /// k distinct dataset vectors are drawn without replacement using the
    /// configured seed; the same dataset, k, and seed always produce
    /// identical centroids and labels.
    pub fn fit(&self, dataset: &[Vector]) -> Result<KMeansResult> {
        self.run(dataset, None)
    }

    /// Cluster the dataset starting from caller-supplied centroids.
    ///
    /// `initial` must contain exactly k vectors of the dataset's dimension.
    pub fn fit_with_centroids(
        &self,
        dataset: &[Vector],
        initial: Vec<Vector>,
    ) -> Result<KMeansResult> {
        self.run(dataset, Some(initial))
    }

    fn run(&self, dataset: &[Vector], initial: Option<Vec<Vector>>) -> Result<KMeansResult> {
        self.validate(dataset, initial.as_deref())?;

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut centroids = match initial {
            Some(vectors) => vectors,
            None => self.sample_initial_centroids(dataset, &mut rng),
        };

        let mut labels = Vec::new();
        let mut iterations = 0;
        let mut converged = false;

        for _ in 0..self.config.max_iterations {
            iterations += 1;

            // Assign each vector to the nearest centroid
            labels = self.assign(dataset, &centroids);

            // Update centroids to the mean of their assigned vectors
            let new_centroids = self.update_centroids(dataset, &labels, &centroids, &mut rng);

            // Check for convergence
            let done = self.has_converged(&centroids, &new_centroids);
            centroids = new_centroids;

            if done {
                converged = true;
                break;
            }
        }

        let inertia = compute_inertia(dataset, &labels, &centroids);

        if converged {
            log::debug!("k-means converged after {iterations} iterations (inertia {inertia})");
        } else {
            log::debug!(
                "k-means stopped at the iteration budget of {} (inertia {inertia})",
                self.config.max_iterations
            );
        }

        Ok(KMeansResult {
            centroids,
            labels,
            iterations,
            converged,
            inertia,
        })
    }

    /// Validate inputs before any iteration begins.
    fn validate(&self, dataset: &[Vector], initial: Option<&[Vector]>) -> Result<()> {
        if self.config.max_iterations == 0 {
            return Err(VicinityError::invalid_argument(
                "max_iterations must be at least 1",
            ));
        }

        if self.k < 1 || self.k > dataset.len() {
            return Err(VicinityError::InvalidClusterCount(format!(
                "k must be in [1, {}] for a dataset of {} vectors, got {}",
                dataset.len(),
                dataset.len(),
                self.k
            )));
        }

        let dimension = dataset[0].dimension();
        for (i, vector) in dataset.iter().enumerate() {
            if vector.dimension() != dimension {
                return Err(VicinityError::DimensionMismatch(format!(
                    "dataset vector {} has dimension {}, expected {}",
                    i,
                    vector.dimension(),
                    dimension
                )));
            }

            if !vector.is_valid() {
                return Err(VicinityError::InvalidOperation(format!(
                    "dataset vector {i} contains invalid values (NaN or infinity)"
                )));
            }
        }

        if let Some(initial) = initial {
            if initial.len() != self.k {
                return Err(VicinityError::invalid_argument(format!(
                    "expected {} initial centroids, got {}",
                    self.k,
                    initial.len()
                )));
            }

            for centroid in initial {
                centroid.validate_dimension(dimension)?;
            }
        }

        Ok(())
    }

    /// Draw k distinct dataset vectors without replacement.
    fn sample_initial_centroids(&self, dataset: &[Vector], rng: &mut StdRng) -> Vec<Vector> {
        rand::seq::index::sample(rng, dataset.len(), self.k)
            .iter()
            .map(|i| Vector::new(dataset[i].data.clone()))
            .collect()
    }

    /// Label every dataset vector with the index of its nearest centroid.
    fn assign(&self, dataset: &[Vector], centroids: &[Vector]) -> Vec<usize> {
        if self.config.parallel && dataset.len() > PARALLEL_ASSIGN_THRESHOLD {
            dataset
                .par_iter()
                .map(|vector| nearest_centroid(vector, centroids))
                .collect()
        } else {
            dataset
                .iter()
                .map(|vector| nearest_centroid(vector, centroids))
                .collect()
        }
    }

    /// Recompute each centroid as the mean of its assigned vectors.
    ///
    /// Sums are accumulated sequentially in dataset order so the reduction is
    /// deterministic regardless of how the assignment step was scheduled.
    fn update_centroids(
        &self,
        dataset: &[Vector],
        labels: &[usize],
        previous: &[Vector],
        rng: &mut StdRng,
    ) -> Vec<Vector> {
        let dimension = dataset[0].dimension();
        let mut cluster_sums = vec![vec![0.0f32; dimension]; self.k];
        let mut cluster_counts = vec![0usize; self.k];

        for (vector, &label) in dataset.iter().zip(labels.iter()) {
            cluster_counts[label] += 1;
            for (j, &value) in vector.data.iter().enumerate() {
                cluster_sums[label][j] += value;
            }
        }

        let mut centroids = Vec::with_capacity(self.k);
        for (i, (sum, count)) in cluster_sums.iter().zip(cluster_counts.iter()).enumerate() {
            if *count == 0 {
                // The mean of an empty cluster is undefined; resolve it per policy.
                match self.config.empty_cluster_policy {
                    EmptyClusterPolicy::KeepPrevious => centroids.push(previous[i].clone()),
                    EmptyClusterPolicy::Resample => {
                        let idx = rng.random_range(0..dataset.len());
                        log::trace!("cluster {i} is empty, resampling dataset vector {idx}");
                        centroids.push(Vector::new(dataset[idx].data.clone()));
                    }
                }
                continue;
            }

            let centroid_data: Vec<f32> = sum.iter().map(|&s| s / *count as f32).collect();
            centroids.push(Vector::new(centroid_data));
        }

        centroids
    }

    /// Whether every centroid component moved at most `tolerance`.
    fn has_converged(&self, old_centroids: &[Vector], new_centroids: &[Vector]) -> bool {
        old_centroids
            .iter()
            .zip(new_centroids.iter())
            .all(|(old, new)| {
                old.data
                    .iter()
                    .zip(new.data.iter())
                    .all(|(a, b)| (a - b).abs() <= self.config.tolerance)
            })
    }
}

/// Index of the nearest centroid by Euclidean distance, ties to the lowest index.
fn nearest_centroid(vector: &Vector, centroids: &[Vector]) -> usize {
    let mut best_cluster = 0;
    let mut best_distance = f32::INFINITY;

    for (i, centroid) in centroids.iter().enumerate() {
        let distance = squared_distance(&vector.data, &centroid.data);
        if distance < best_distance {
            best_distance = distance;
            best_cluster = i;
        }
    }

    best_cluster
}

/// Squared Euclidean distance; monotone in the true distance, so argmin agrees.
fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Sum of squared distances from each vector to its assigned centroid.
fn compute_inertia(dataset: &[Vector], labels: &[usize], centroids: &[Vector]) -> f32 {
    dataset
        .iter()
        .zip(labels.iter())
        .map(|(vector, &label)| squared_distance(&vector.data, &centroids[label].data))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_seed(seed: u64) -> KMeansConfig {
        KMeansConfig {
            seed: Some(seed),
            ..KMeansConfig::default()
        }
    }

    #[test]
    fn test_k_outside_dataset_bounds_is_rejected() {
        let dataset = vec![Vector::new(vec![0.0, 1.0]), Vector::new(vec![1.0, 0.0])];

        let result = KMeans::new(3, config_with_seed(1)).fit(&dataset);
        assert!(matches!(
            result,
            Err(VicinityError::InvalidClusterCount(_))
        ));

        let result = KMeans::new(0, config_with_seed(1)).fit(&dataset);
        assert!(matches!(
            result,
            Err(VicinityError::InvalidClusterCount(_))
        ));
    }

    #[test]
    fn test_mixed_dimensions_are_rejected() {
        let dataset = vec![Vector::new(vec![0.0, 1.0]), Vector::new(vec![1.0])];
        let result = KMeans::new(1, config_with_seed(1)).fit(&dataset);
        assert!(matches!(result, Err(VicinityError::DimensionMismatch(_))));
    }

    #[test]
    fn test_wrong_initial_centroid_count_is_rejected() {
        let dataset = vec![Vector::new(vec![0.0]), Vector::new(vec![1.0])];
        let result = KMeans::new(2, config_with_seed(1))
            .fit_with_centroids(&dataset, vec![Vector::new(vec![0.0])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_nearest_centroid_ties_go_to_lowest_index() {
        // Equidistant from both centroids.
        let vector = Vector::new(vec![0.5, 0.0]);
        let centroids = vec![Vector::new(vec![0.0, 0.0]), Vector::new(vec![1.0, 0.0])];
        assert_eq!(nearest_centroid(&vector, &centroids), 0);
    }

    #[test]
    fn test_single_cluster_centroid_is_dataset_mean() {
        let dataset = vec![
            Vector::new(vec![0.0, 0.0]),
            Vector::new(vec![2.0, 4.0]),
            Vector::new(vec![4.0, 8.0]),
        ];

        let result = KMeans::new(1, config_with_seed(7)).fit(&dataset).unwrap();
        assert_eq!(result.centroids.len(), 1);
        assert_eq!(result.labels, vec![0, 0, 0]);
        assert!((result.centroids[0].data[0] - 2.0).abs() < 1e-6);
        assert!((result.centroids[0].data[1] - 4.0).abs() < 1e-6);
        assert!(result.converged);
    }
}
