//! Scenario tests for the incremental grouper.

use vicinity::error::{Result, VicinityError};
use vicinity::grouping::{GrouperConfig, IncrementalGrouper, SharedGrouper};
use vicinity::vector::Vector;

fn thresholded_config(threshold: f32) -> GrouperConfig {
    GrouperConfig {
        similarity_threshold: Some(threshold),
        ..GrouperConfig::default()
    }
}

#[test]
fn first_vector_creates_exactly_one_group() -> Result<()> {
    let mut grouper = IncrementalGrouper::new(GrouperConfig::default());
    let assignments = grouper.insert(vec![Vector::new(vec![1.0, 2.0])])?;

    assert_eq!(assignments.len(), 1);
    assert!(assignments[0].created);
    assert_eq!(grouper.group_count(), 1);

    let group = grouper.group(assignments[0].key).unwrap();
    assert_eq!(group.members().len(), 1);
    assert_eq!(group.members()[0].data, vec![1.0, 2.0]);
    Ok(())
}

#[test]
fn an_identical_vector_joins_the_existing_group() -> Result<()> {
    let mut grouper = IncrementalGrouper::new(GrouperConfig::default());
    let first = grouper.insert(vec![Vector::new(vec![1.0, 2.0])])?;
    let second = grouper.insert(vec![Vector::new(vec![1.0, 2.0])])?;

    assert!(!second[0].created);
    assert_eq!(second[0].key, first[0].key);
    assert!((second[0].best_similarity.unwrap() - 1.0).abs() < 1e-6);
    assert_eq!(grouper.group_count(), 1);
    assert_eq!(grouper.vector_count(), 2);
    Ok(())
}

#[test]
fn without_a_threshold_every_vector_joins_the_best_group() -> Result<()> {
    let mut grouper = IncrementalGrouper::new(GrouperConfig::default());
    grouper.insert(vec![Vector::new(vec![1.0, 0.0])])?;

    // Even an opposite-direction vector joins; no threshold means no new groups.
    let assignments = grouper.insert(vec![Vector::new(vec![-1.0, 0.0])])?;
    assert!(!assignments[0].created);
    assert!((assignments[0].best_similarity.unwrap() + 1.0).abs() < 1e-6);
    assert_eq!(grouper.group_count(), 1);
    Ok(())
}

#[test]
fn below_threshold_matches_start_a_new_group() -> Result<()> {
    let mut grouper = IncrementalGrouper::new(thresholded_config(0.8));

    let a = grouper.insert(vec![Vector::new(vec![1.0, 0.0])])?;
    let b = grouper.insert(vec![Vector::new(vec![0.0, 1.0])])?;
    let c = grouper.insert(vec![Vector::new(vec![0.95, 0.05])])?;

    assert!(b[0].created);
    assert_ne!(b[0].key, a[0].key);
    assert!(!c[0].created);
    assert_eq!(c[0].key, a[0].key);
    assert_eq!(grouper.group_count(), 2);
    Ok(())
}

#[test]
fn similarity_ties_go_to_the_first_seen_vector() -> Result<()> {
    let mut grouper = IncrementalGrouper::new(thresholded_config(0.5));
    let a = grouper.insert(vec![Vector::new(vec![1.0, 0.0])])?;
    let b = grouper.insert(vec![Vector::new(vec![0.0, 1.0])])?;
    assert_ne!(a[0].key, b[0].key);

    // Equally similar to both stored vectors; the earlier insertion wins.
    let c = grouper.insert(vec![Vector::new(vec![1.0, 1.0])])?;
    assert_eq!(c[0].key, a[0].key);
    Ok(())
}

#[test]
fn later_batch_vectors_can_join_groups_formed_in_the_same_call() -> Result<()> {
    let mut grouper = IncrementalGrouper::new(thresholded_config(0.9));
    let assignments = grouper.insert(vec![
        Vector::new(vec![1.0, 0.0]),
        Vector::new(vec![0.0, 1.0]),
        Vector::new(vec![0.0, 0.9]),
    ])?;

    assert!(assignments[0].created);
    assert!(assignments[1].created);
    assert!(!assignments[2].created);
    assert_eq!(assignments[2].key, assignments[1].key);
    assert_eq!(grouper.group_count(), 2);
    Ok(())
}

#[test]
fn similar_to_at_threshold_one_returns_only_matching_directions() -> Result<()> {
    let mut grouper = IncrementalGrouper::new(GrouperConfig::default());
    grouper.insert(vec![
        Vector::new(vec![1.0, 0.0]),
        Vector::new(vec![0.7, 0.7]),
        Vector::new(vec![0.0, 1.0]),
    ])?;

    let hits = grouper.similar_to(&Vector::new(vec![1.0, 0.0]), 1.0)?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].data, vec![1.0, 0.0]);
    Ok(())
}

#[test]
fn similar_to_scans_every_group_in_insertion_order() -> Result<()> {
    let mut grouper = IncrementalGrouper::new(thresholded_config(0.9));
    grouper.insert(vec![
        Vector::new(vec![1.0, 0.0]),
        Vector::new(vec![0.0, 1.0]),
        Vector::new(vec![0.9, 0.1]),
    ])?;
    assert_eq!(grouper.group_count(), 2);

    // A permissive threshold reaches vectors in both groups.
    let hits = grouper.similar_to(&Vector::new(vec![1.0, 0.5]), 0.4)?;
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].data, vec![1.0, 0.0]);
    assert_eq!(hits[1].data, vec![0.0, 1.0]);
    assert_eq!(hits[2].data, vec![0.9, 0.1]);
    Ok(())
}

#[test]
fn similar_to_on_an_empty_store_returns_nothing() -> Result<()> {
    let grouper = IncrementalGrouper::new(GrouperConfig::default());
    let hits = grouper.similar_to(&Vector::new(vec![1.0, 0.0]), 0.0)?;
    assert!(hits.is_empty());
    Ok(())
}

#[test]
fn dimension_mismatches_are_rejected() -> Result<()> {
    let mut grouper = IncrementalGrouper::new(GrouperConfig::default());
    grouper.insert(vec![Vector::new(vec![1.0, 0.0])])?;

    let result = grouper.insert(vec![Vector::new(vec![1.0, 0.0, 0.0])]);
    assert!(matches!(result, Err(VicinityError::DimensionMismatch(_))));

    let result = grouper.similar_to(&Vector::new(vec![1.0]), 0.5);
    assert!(matches!(result, Err(VicinityError::DimensionMismatch(_))));
    Ok(())
}

#[test]
fn source_metadata_survives_grouping_and_retrieval() -> Result<()> {
    let mut vector = Vector::new(vec![0.6, 0.8]);
    vector.set_source_id("rhino_0042.jpg");

    let mut grouper = IncrementalGrouper::new(GrouperConfig::default());
    grouper.insert(vec![vector])?;

    let hits = grouper.similar_to(&Vector::new(vec![0.6, 0.8]), 0.99)?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].source_id(), Some("rhino_0042.jpg"));
    Ok(())
}

#[test]
fn shared_grouper_serializes_concurrent_insertions() -> Result<()> {
    let grouper = SharedGrouper::new(thresholded_config(0.9));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let grouper = grouper.clone();
            std::thread::spawn(move || {
                let angle = i as f32 * 0.001;
                grouper.insert(vec![Vector::new(vec![angle.cos(), angle.sin()])])
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap()?;
    }

    // Near-identical directions end up in a single group regardless of the
    // interleaving, and no insertion was lost.
    assert_eq!(grouper.vector_count(), 4);
    assert_eq!(grouper.group_count(), 1);
    Ok(())
}
