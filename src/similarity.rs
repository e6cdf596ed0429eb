//! Similarity and distance calculations between vectors.
//!
//! Cosine similarity measures directional closeness independent of magnitude
//! and drives the incremental grouper; Euclidean distance drives the k-means
//! assignment step. Both require equal dimensions. Cosine similarity is
//! undefined for a zero-magnitude vector and is reported as
//! [`VicinityError::UndefinedSimilarity`] rather than a sentinel value.

use rayon::prelude::*;

use crate::error::{Result, VicinityError};

/// Below this many candidates a batch scan stays sequential.
const PARALLEL_SCAN_THRESHOLD: usize = 100;

/// Calculate the cosine similarity between two vectors, in `[-1, 1]`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(VicinityError::DimensionMismatch(format!(
            "cannot compare vectors of dimension {} and {}",
            a.len(),
            b.len()
        )));
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(VicinityError::UndefinedSimilarity(
            "cosine similarity is undefined for a zero-magnitude vector".to_string(),
        ));
    }

    // Rounding can push the ratio a hair outside [-1, 1].
    Ok((dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

/// Calculate the Euclidean (L2) distance between two vectors.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(VicinityError::DimensionMismatch(format!(
            "cannot compare vectors of dimension {} and {}",
            a.len(),
            b.len()
        )));
    }

    Ok(a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        .sqrt())
}

/// Calculate cosine similarities between a query and multiple candidates.
///
/// The output is index-aligned with `vectors`. Large scans run on the rayon
/// pool when `parallel` is set; the result is identical either way.
pub fn batch_cosine_similarity(
    query: &[f32],
    vectors: &[&[f32]],
    parallel: bool,
) -> Result<Vec<f32>> {
    if vectors.is_empty() {
        return Ok(Vec::new());
    }

    if !parallel || vectors.len() < PARALLEL_SCAN_THRESHOLD {
        return vectors
            .iter()
            .map(|v| cosine_similarity(query, v))
            .collect::<Result<Vec<_>>>();
    }

    vectors
        .par_iter()
        .map(|v| cosine_similarity(query, v))
        .collect::<Result<Vec<_>>>()
}
