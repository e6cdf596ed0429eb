//! Incremental grouper and its concurrency wrapper.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Result, VicinityError};
use crate::grouping::{GroupAssignment, GroupKey, GrouperConfig};
use crate::similarity::batch_cosine_similarity;
use crate::vector::Vector;

/// A growable collection of vectors considered similar enough to share an identity.
#[derive(Debug, Clone)]
pub struct Group {
    key: GroupKey,
    members: Vec<Vector>,
}

impl Group {
    fn new(key: GroupKey) -> Self {
        Self {
            key,
            members: Vec::new(),
        }
    }

    /// Get this group's key.
    pub fn key(&self) -> GroupKey {
        self.key
    }

    /// Get the member vectors, in the order they joined.
    pub fn members(&self) -> &[Vector] {
        &self.members
    }

    /// Number of member vectors.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the group has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Streaming grouper that assigns each inserted vector to the group of its
/// best cosine match, or starts a new group.
///
/// Every insertion scans all previously stored vectors, so an insert costs
/// O(stored vectors) comparisons of O(d) each. Vectors never move between
/// groups after insertion and individual vectors cannot be removed.
///
/// The grouper itself is single-threaded; `insert` takes `&mut self`, which
/// makes the scan-and-append sequence atomic for a single owner. Use
/// [`SharedGrouper`] to share one instance across threads.
pub struct IncrementalGrouper {
    config: GrouperConfig,
    dimension: Option<usize>,
    groups: Vec<Group>,
    // Global insertion order as (group index, member index) pairs; similarity
    // ties resolve to the first-seen stored vector.
    order: Vec<(usize, usize)>,
}

impl IncrementalGrouper {
    /// Create a new, empty grouper.
    pub fn new(config: GrouperConfig) -> Self {
        Self {
            config,
            dimension: None,
            groups: Vec::new(),
            order: Vec::new(),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &GrouperConfig {
        &self.config
    }

    /// Vector dimension locked in by the first insertion, if any.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// All groups, in creation order.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Look up a group by key.
    pub fn group(&self, key: GroupKey) -> Option<&Group> {
        self.groups.get(key.as_u64() as usize)
    }

    /// Number of groups.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Total number of stored vectors across all groups.
    pub fn vector_count(&self) -> usize {
        self.order.len()
    }

    /// Whether no vectors have been inserted yet.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Insert a batch of vectors, one at a time in input order.
    ///
    /// Each vector joins the group of the stored vector most similar to it,
    /// or starts a new group when none exists (or when the best similarity
    /// falls below the configured threshold). Later vectors in the batch can
    /// join groups created earlier in the same call.
    ///
    /// The whole batch is validated before anything is stored, so a failed
    /// call leaves the grouper unchanged.
    pub fn insert(&mut self, vectors: Vec<Vector>) -> Result<Vec<GroupAssignment>> {
        self.validate_batch(&vectors)?;

        if self.dimension.is_none() {
            self.dimension = vectors.first().map(|v| v.dimension());
        }

        let mut assignments = Vec::with_capacity(vectors.len());
        for vector in vectors {
            let assignment = self.place(vector)?;
            log::trace!(
                "vector joined {} (created: {}, best similarity: {:?})",
                assignment.key,
                assignment.created,
                assignment.best_similarity
            );
            assignments.push(assignment);
        }

        Ok(assignments)
    }

    /// Return every stored vector whose cosine similarity to `query` is at
    /// least `threshold`, in insertion order.
    ///
    /// This is a linear scan over all stored vectors; group structure does
    /// not prune the search.
    pub fn similar_to(&self, query: &Vector, threshold: f32) -> Result<Vec<Vector>> {
        if self.order.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(dimension) = self.dimension {
            query.validate_dimension(dimension)?;
        }

        let refs = self.stored_refs();
        let similarities = batch_cosine_similarity(&query.data, &refs, self.config.parallel)?;

        Ok(self
            .order
            .iter()
            .zip(similarities.iter())
            .filter(|&(_, &sim)| sim >= threshold)
            .map(|(&(group_idx, member_idx), _)| {
                self.groups[group_idx].members[member_idx].clone()
            })
            .collect())
    }

    /// Place one vector into a group and record the assignment.
    fn place(&mut self, vector: Vector) -> Result<GroupAssignment> {
        let best = self.best_match(&vector)?;

        match best {
            None => Ok(self.create_group(vector, None)),
            Some((group_idx, similarity)) => {
                if let Some(threshold) = self.config.similarity_threshold {
                    if similarity < threshold {
                        return Ok(self.create_group(vector, Some(similarity)));
                    }
                }
                Ok(self.join_group(group_idx, vector, similarity))
            }
        }
    }

    /// Scan all stored vectors for the best cosine match.
    ///
    /// Returns the owning group's index and the similarity, or `None` when
    /// nothing is stored yet. Ties go to the earliest-inserted vector.
    fn best_match(&self, vector: &Vector) -> Result<Option<(usize, f32)>> {
        if self.order.is_empty() {
            return Ok(None);
        }

        let refs = self.stored_refs();
        let similarities = batch_cosine_similarity(&vector.data, &refs, self.config.parallel)?;

        let mut best_idx = 0;
        let mut best_similarity = f32::NEG_INFINITY;
        for (i, &similarity) in similarities.iter().enumerate() {
            if similarity > best_similarity {
                best_similarity = similarity;
                best_idx = i;
            }
        }

        Ok(Some((self.order[best_idx].0, best_similarity)))
    }

    fn create_group(&mut self, vector: Vector, best_similarity: Option<f32>) -> GroupAssignment {
        let key = GroupKey::new(self.groups.len() as u64);
        let mut group = Group::new(key);
        group.members.push(vector);

        let group_idx = self.groups.len();
        self.groups.push(group);
        self.order.push((group_idx, 0));

        GroupAssignment {
            key,
            created: true,
            best_similarity,
        }
    }

    fn join_group(
        &mut self,
        group_idx: usize,
        vector: Vector,
        best_similarity: f32,
    ) -> GroupAssignment {
        let group = &mut self.groups[group_idx];
        group.members.push(vector);
        self.order.push((group_idx, group.members.len() - 1));

        GroupAssignment {
            key: group.key,
            created: false,
            best_similarity: Some(best_similarity),
        }
    }

    /// Validate a batch before storing anything.
    fn validate_batch(&self, vectors: &[Vector]) -> Result<()> {
        let mut dimension = self.dimension;

        for (i, vector) in vectors.iter().enumerate() {
            match dimension {
                None => dimension = Some(vector.dimension()),
                Some(expected) => {
                    if vector.dimension() != expected {
                        return Err(VicinityError::DimensionMismatch(format!(
                            "batch vector {} has dimension {}, expected {}",
                            i,
                            vector.dimension(),
                            expected
                        )));
                    }
                }
            }

            if !vector.is_valid() {
                return Err(VicinityError::InvalidOperation(format!(
                    "batch vector {i} contains invalid values (NaN or infinity)"
                )));
            }

            // A zero vector cannot participate in any cosine comparison, so
            // admitting it would poison every later scan.
            if vector.is_zero() {
                return Err(VicinityError::UndefinedSimilarity(format!(
                    "batch vector {i} has zero magnitude and cannot be grouped"
                )));
            }
        }

        Ok(())
    }

    /// Stored vector slices in global insertion order.
    fn stored_refs(&self) -> Vec<&[f32]> {
        self.order
            .iter()
            .map(|&(group_idx, member_idx)| {
                self.groups[group_idx].members[member_idx].data.as_slice()
            })
            .collect()
    }
}

/// Thread-safe handle around an [`IncrementalGrouper`].
///
/// Insertions take the write lock, keeping the scan-and-append sequence
/// atomic across concurrent writers; retrieval takes the read lock.
#[derive(Clone)]
pub struct SharedGrouper {
    inner: Arc<RwLock<IncrementalGrouper>>,
}

impl SharedGrouper {
    /// Create a new shared grouper.
    pub fn new(config: GrouperConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(IncrementalGrouper::new(config))),
        }
    }

    /// Insert a batch of vectors under the write lock.
    pub fn insert(&self, vectors: Vec<Vector>) -> Result<Vec<GroupAssignment>> {
        self.inner.write().insert(vectors)
    }

    /// Run a similarity scan under the read lock.
    pub fn similar_to(&self, query: &Vector, threshold: f32) -> Result<Vec<Vector>> {
        self.inner.read().similar_to(query, threshold)
    }

    /// Number of groups.
    pub fn group_count(&self) -> usize {
        self.inner.read().group_count()
    }

    /// Total number of stored vectors.
    pub fn vector_count(&self) -> usize {
        self.inner.read().vector_count()
    }

    /// Whether no vectors have been inserted yet.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
