//! Error types for the Vicinity library.
//!
//! All fallible operations in this crate return [`Result`], whose error type
//! is the [`VicinityError`] enum. Precondition violations (mismatched
//! dimensions, an invalid cluster count, a zero vector handed to a cosine
//! comparison) are detected up front, before any iteration begins.
//!
//! # Examples
//!
//! ```
//! use vicinity::error::{Result, VicinityError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(VicinityError::invalid_argument("Invalid input"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use anyhow;
use thiserror::Error;

/// The main error type for Vicinity operations.
#[derive(Error, Debug)]
pub enum VicinityError {
    /// Two vectors of differing length were compared or clustered together.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// The requested cluster count is outside `[1, n]` for a dataset of n vectors.
    #[error("Invalid cluster count: {0}")]
    InvalidClusterCount(String),

    /// Cosine similarity was requested for a zero-magnitude vector.
    #[error("Undefined similarity: {0}")]
    UndefinedSimilarity(String),

    /// A cluster lost all of its members during a centroid update.
    ///
    /// The built-in [`EmptyClusterPolicy`](crate::clustering::EmptyClusterPolicy)
    /// variants resolve this internally; the variant exists for callers that
    /// plug in their own update handling.
    #[error("Empty cluster during update: {0}")]
    EmptyClusterDuringUpdate(String),

    /// Invalid operation (non-finite input values, misuse of an API, etc.)
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with VicinityError.
pub type Result<T> = std::result::Result<T, VicinityError>;

impl VicinityError {
    /// Create a new dimension mismatch error.
    pub fn dimension_mismatch<S: Into<String>>(msg: S) -> Self {
        VicinityError::DimensionMismatch(msg.into())
    }

    /// Create a new invalid cluster count error.
    pub fn invalid_cluster_count<S: Into<String>>(msg: S) -> Self {
        VicinityError::InvalidClusterCount(msg.into())
    }

    /// Create a new undefined similarity error.
    pub fn undefined_similarity<S: Into<String>>(msg: S) -> Self {
        VicinityError::UndefinedSimilarity(msg.into())
    }

    /// Create a new empty cluster error.
    pub fn empty_cluster<S: Into<String>>(msg: S) -> Self {
        VicinityError::EmptyClusterDuringUpdate(msg.into())
    }

    /// Create a new invalid operation error.
    pub fn invalid_operation<S: Into<String>>(msg: S) -> Self {
        VicinityError::InvalidOperation(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        VicinityError::Other(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        VicinityError::Other(format!("Invalid argument: {}", msg.into()))
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        VicinityError::Other(format!("Internal error: {}", msg.into()))
    }
}
