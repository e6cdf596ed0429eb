//! Core vector data structure.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VicinityError};

/// Metadata key used to store the identifier of the source the vector was
/// derived from (for image features, typically the image file name). The
/// core never interprets this value; it exists so an external identifier
/// mapper can tag vectors without a side table.
pub const SOURCE_ID_METADATA_KEY: &str = "source_id";

/// A dense feature vector of fixed dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    /// The vector components as floating point values.
    pub data: Vec<f32>,
    /// Optional metadata associated with this vector.
    pub metadata: HashMap<String, String>,
}

impl Vector {
    /// Create a new vector with the given components.
    pub fn new(data: Vec<f32>) -> Self {
        Self {
            data,
            metadata: HashMap::new(),
        }
    }

    /// Create a new vector with metadata.
    pub fn with_metadata(data: Vec<f32>, metadata: HashMap<String, String>) -> Self {
        Self { data, metadata }
    }

    /// Get the dimensionality of this vector.
    pub fn dimension(&self) -> usize {
        self.data.len()
    }

    /// Calculate the L2 norm (magnitude) of this vector.
    pub fn norm(&self) -> f32 {
        self.data.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Normalize this vector to unit length. Zero vectors are left unchanged.
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for value in &mut self.data {
                *value /= norm;
            }
        }
    }

    /// Get a normalized copy of this vector.
    pub fn normalized(&self) -> Self {
        let mut normalized = self.clone();
        normalized.normalize();
        normalized
    }

    /// Whether every component of this vector is zero.
    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|x| *x == 0.0)
    }

    /// Check that this vector contains no NaN or infinite values.
    pub fn is_valid(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }

    /// Validate that this vector has the expected dimension.
    pub fn validate_dimension(&self, expected_dim: usize) -> Result<()> {
        if self.data.len() != expected_dim {
            return Err(VicinityError::DimensionMismatch(format!(
                "expected dimension {}, got {}",
                expected_dim,
                self.data.len()
            )));
        }
        Ok(())
    }

    /// Add metadata to this vector.
    pub fn add_metadata(&mut self, key: String, value: String) {
        self.metadata.insert(key, value);
    }

    /// Get metadata by key.
    pub fn get_metadata(&self, key: &str) -> Option<&String> {
        self.metadata.get(key)
    }

    /// Tag this vector with the identifier of its source.
    pub fn set_source_id<T: Into<String>>(&mut self, id: T) {
        self.metadata
            .insert(SOURCE_ID_METADATA_KEY.to_string(), id.into());
    }

    /// Convenience accessor for the stored source identifier.
    pub fn source_id(&self) -> Option<&str> {
        self.metadata
            .get(SOURCE_ID_METADATA_KEY)
            .map(|s| s.as_str())
    }
}
