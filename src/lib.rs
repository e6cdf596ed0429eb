//! # Vicinity
//!
//! A vector-grouping library for nearest-neighbor-style retrieval of image
//! feature vectors.
//!
//! ## Features
//!
//! - Pure Rust implementation
//! - Batch partitioning of a fixed dataset with k-means (Lloyd's algorithm)
//! - Incremental, insertion-time grouping by cosine similarity
//! - Deterministic, seedable clustering runs
//! - Parallel assignment and similarity scans via rayon
//!
//! ## Example
//!
//! ```
//! use vicinity::clustering::{KMeans, KMeansConfig};
//! use vicinity::vector::Vector;
//!
//! let dataset = vec![
//!     Vector::new(vec![0.0, 0.0]),
//!     Vector::new(vec![0.0, 1.0]),
//!     Vector::new(vec![10.0, 10.0]),
//!     Vector::new(vec![10.0, 11.0]),
//! ];
//!
//! let config = KMeansConfig {
//!     seed: Some(42),
//!     ..KMeansConfig::default()
//! };
//! let result = KMeans::new(2, config).fit(&dataset).unwrap();
//! assert_eq!(result.centroids.len(), 2);
//! assert_eq!(result.labels.len(), 4);
//! ```

pub mod clustering;
pub mod error;
pub mod grouping;
pub mod similarity;
pub mod vector;

pub mod prelude {
    //! Convenience re-exports of the most commonly used types.

    pub use crate::clustering::{EmptyClusterPolicy, KMeans, KMeansConfig, KMeansResult};
    pub use crate::error::{Result, VicinityError};
    pub use crate::grouping::{
        Group, GroupAssignment, GroupKey, GrouperConfig, IncrementalGrouper, SharedGrouper,
    };
    pub use crate::similarity::{cosine_similarity, euclidean_distance};
    pub use crate::vector::Vector;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
