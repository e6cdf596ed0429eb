//! Incremental, insertion-time grouping of streamed vectors.
//!
//! Vectors arrive one batch at a time; each one joins the group of its most
//! similar already-stored vector, or starts a new group. Groups live in an
//! arena and are identified by opaque [`GroupKey`] handles assigned at
//! creation, never by a computed similarity score.

pub mod grouper;

pub use grouper::{Group, IncrementalGrouper, SharedGrouper};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Configuration for an [`IncrementalGrouper`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrouperConfig {
    /// Minimum cosine similarity for a vector to join an existing group.
    ///
    /// `None` always joins the best-matching group once one exists. With a
    /// threshold set, a best match below it starts a new group instead.
    pub similarity_threshold: Option<f32>,
    /// Run large similarity scans on the rayon pool.
    pub parallel: bool,
}

impl Default for GrouperConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: None,
            parallel: true,
        }
    }
}

/// Opaque, stable identifier for a group.
///
/// Keys are assigned sequentially when groups are created and stay valid for
/// the lifetime of the grouper.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GroupKey(u64);

impl GroupKey {
    pub(crate) fn new(raw: u64) -> Self {
        GroupKey(raw)
    }

    /// Get the raw key value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group-{}", self.0)
    }
}

/// Per-vector outcome of an [`IncrementalGrouper::insert`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupAssignment {
    /// The group the vector joined.
    pub key: GroupKey,
    /// Whether the group was created for this vector.
    pub created: bool,
    /// Best similarity found during the scan, `None` for the very first vector.
    pub best_similarity: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_key_display() {
        assert_eq!(GroupKey::new(3).to_string(), "group-3");
        assert_eq!(GroupKey::new(3).as_u64(), 3);
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = GrouperConfig {
            similarity_threshold: Some(0.85),
            parallel: false,
        };

        let json = serde_json::to_string(&config).unwrap();
        let restored: GrouperConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.similarity_threshold, Some(0.85));
        assert!(!restored.parallel);
    }
}
