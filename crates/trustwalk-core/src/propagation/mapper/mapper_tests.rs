//! Tests for the votes mappers.

use super::*;
use crate::graph::TrustGraph;
use crate::storage::{InMemoryRatingStore, RatingEvent};

/// User 1 rates harshly, user 2 generously, user 3 always gives 4.
fn store() -> InMemoryRatingStore {
    InMemoryRatingStore::from_events([
        RatingEvent::new(10, 1, 2, 0),
        RatingEvent::new(11, 1, 2, 0),
        RatingEvent::new(12, 1, 5, 0),
        RatingEvent::new(10, 2, 3, 0),
        RatingEvent::new(11, 2, 4, 0),
        RatingEvent::new(12, 2, 5, 0),
        RatingEvent::new(13, 2, 1, 0),
        RatingEvent::new(10, 3, 4, 0),
        RatingEvent::new(13, 3, 4, 0),
    ])
    .unwrap()
}

/// User 2 trusts user 1.
fn graph() -> TrustGraph {
    let mut graph = TrustGraph::new();
    for id in 1..=3 {
        graph.add_vertex(id);
    }
    graph.add_edge(2, 1, 1.0).unwrap();
    graph
}

#[test]
fn test_identity_preserves_values() {
    let mapper = IdentityMapper;
    for vote in MIN_VOTE..=MAX_VOTE {
        assert_eq!(
            mapper.map_vote(1, 2, vote).expected_value(),
            Some(f64::from(vote))
        );
    }
    let mapped = mapper.map_value(1, 2, 3.4).expected_value().unwrap();
    assert!((mapped - 3.4).abs() < 1e-12);
}

#[test]
fn test_map_value_clamps_out_of_scale() {
    let mapper = IdentityMapper;
    assert_eq!(mapper.map_value(1, 2, 9.0).expected_value(), Some(5.0));
    assert_eq!(mapper.map_value(1, 2, -3.0).expected_value(), Some(1.0));
    assert!(!mapper.map_value(1, 2, f64::NAN).is_valid());
}

#[test]
fn test_min_rmse_learns_from_co_rated_items() {
    let store = store();
    let mapper = MinRmseMapper::build(&store, &graph(), CluelessStrategy::Distribute).unwrap();

    // Items rated 2 by user 1 were rated 3 and 4 by user 2; tie goes low.
    assert_eq!(mapper.map_vote(1, 2, 2).expected_value(), Some(3.0));
    assert_eq!(mapper.map_vote(1, 2, 5).expected_value(), Some(5.0));
    // User 1 never rated 1.
    assert!(!mapper.map_vote(1, 2, 1).is_valid());
    // No edge carries 2's votes to 1.
    assert!(!mapper.map_vote(2, 1, 3).is_valid());

    assert!((mapper.valuable_mapping_percentage() - 40.0).abs() < 1e-9);
}

#[test]
fn test_min_rmse_median_fallback() {
    let store = store();
    let mapper = MinRmseMapper::build(&store, &graph(), CluelessStrategy::MapToMedian).unwrap();
    assert_eq!(mapper.map_vote(1, 2, 1).expected_value(), Some(3.0));
    assert_eq!(mapper.map_vote(9, 2, 4).expected_value(), Some(3.0));
    assert_eq!(mapper.strategy(), CluelessStrategy::MapToMedian);
}

#[test]
fn test_min_rmse_empty_graph_has_no_valuable_mappings() {
    let store = store();
    let mapper =
        MinRmseMapper::build(&store, &TrustGraph::new(), CluelessStrategy::Distribute).unwrap();
    assert!(mapper.valuable_mapping_percentage().abs() < f64::EPSILON);
}

#[test]
fn test_scaled_range_maps_linearly() {
    let mapper = ScaledRangeMapper::from_store(&store());
    assert_eq!(mapper.range_of(1), Some((2, 5)));
    assert_eq!(mapper.range_of(2), Some((1, 5)));

    // 2..=5 onto 1..=5: 2 -> 1, 5 -> 5, 3 -> 1 + 4/3 = 2.33 -> 2.
    assert_eq!(mapper.map_vote(1, 2, 2).expected_value(), Some(1.0));
    assert_eq!(mapper.map_vote(1, 2, 5).expected_value(), Some(5.0));
    assert_eq!(mapper.map_vote(1, 2, 3).expected_value(), Some(2.0));
}

#[test]
fn test_scaled_range_degenerate_source_maps_to_midpoint() {
    let mapper = ScaledRangeMapper::from_store(&store());
    // User 3 only ever rated 4; user 2's range midpoint is 3.
    assert_eq!(mapper.map_vote(3, 2, 4).expected_value(), Some(3.0));
    assert!(!mapper.map_vote(42, 2, 4).is_valid());
}
