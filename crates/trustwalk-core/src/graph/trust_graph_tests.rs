//! Tests for TrustGraph.

use std::collections::HashMap;

use super::trust_graph::TrustGraph;
use super::types::User;
use crate::error::Error;
use crate::propagation::{AveragingConfig, AveragingEngine, NoProgress, PropagationEngine};
use crate::trust::TrustMetric;

fn build_test_graph() -> TrustGraph {
    let mut graph = TrustGraph::new();
    for id in 1..=3 {
        graph.add_vertex(id);
    }
    graph.add_edge(1, 2, 0.5).unwrap();
    graph.add_edge(1, 3, 2.0).unwrap();
    graph.add_edge(2, 3, 1.0).unwrap();
    graph
}

struct FixedTrust(f64);

impl TrustMetric for FixedTrust {
    fn trust(&self, from: u64, _to: u64) -> crate::Result<f64> {
        Ok(if from == 1 { self.0 } else { -1.0 })
    }
}

#[test]
fn test_add_vertex_is_idempotent() {
    let mut graph = TrustGraph::new();
    assert!(graph.add_vertex(7));
    assert!(!graph.add_vertex(7));
    assert_eq!(graph.vertex_count(), 1);
}

#[test]
fn test_vertex_ids_sorted() {
    let mut graph = TrustGraph::new();
    for id in [9, 3, 5] {
        graph.add_vertex(id);
    }
    assert_eq!(graph.vertex_ids(), vec![3, 5, 9]);
}

#[test]
fn test_self_loop_rejected() {
    let mut graph = build_test_graph();
    assert!(matches!(graph.add_edge(2, 2, 1.0), Err(Error::SelfLoop(2))));
}

#[test]
fn test_duplicate_edge_rejected() {
    let mut graph = build_test_graph();
    let result = graph.add_edge(1, 2, 3.0);
    assert!(matches!(result, Err(Error::EdgeExists { from: 1, to: 2 })));
    // Reverse direction is a different ordered pair.
    graph.add_edge(2, 1, 3.0).unwrap();
}

#[test]
fn test_non_positive_weight_rejected() {
    let mut graph = build_test_graph();
    assert!(graph.add_edge(3, 1, 0.0).is_err());
    assert!(graph.add_edge(3, 1, -2.0).is_err());
    assert!(graph.add_edge(3, 1, f64::NAN).is_err());
    assert!(!graph.has_edge(3, 1));
}

#[test]
fn test_edge_to_unknown_vertex_rejected() {
    let mut graph = build_test_graph();
    assert!(matches!(
        graph.add_edge(1, 42, 1.0),
        Err(Error::VertexNotFound(42))
    ));
}

#[test]
fn test_outgoing_keeps_insertion_order() {
    let graph = build_test_graph();
    let targets: Vec<u64> = graph.outgoing(1).map(|e| e.target()).collect();
    assert_eq!(targets, vec![2, 3]);
    let sources: Vec<u64> = graph.incoming(3).map(|e| e.source()).collect();
    assert_eq!(sources, vec![1, 2]);
}

#[test]
fn test_out_degree_in_degree() {
    let graph = build_test_graph();
    assert_eq!(graph.out_degree(1), 2);
    assert_eq!(graph.out_degree(3), 0);
    assert_eq!(graph.in_degree(3), 2);
    assert_eq!(graph.in_degree(1), 0);
    assert!(graph.is_sink(3));
    assert_eq!(graph.out_degree(99), 0);
}

#[test]
fn test_remove_edge_updates_adjacency() {
    let mut graph = build_test_graph();
    let removed = graph.remove_edge(1, 2).unwrap();
    assert!((removed.weight() - 0.5).abs() < f64::EPSILON);
    assert_eq!(graph.edge_count(), 2);
    assert_eq!(graph.out_degree(1), 1);
    assert_eq!(graph.in_degree(2), 0);
    assert!(graph.remove_edge(1, 2).is_none());
}

#[test]
fn test_power_weights() {
    let mut graph = build_test_graph();
    graph.power_weights(2.0).unwrap();
    assert!((graph.edge(1, 2).unwrap().weight() - 0.25).abs() < 1e-12);
    assert!((graph.edge(1, 3).unwrap().weight() - 4.0).abs() < 1e-12);
    assert!(graph.power_weights(f64::INFINITY).is_err());
}

#[test]
fn test_rescale_weights() {
    let mut graph = build_test_graph();
    graph.rescale_weights(10.0).unwrap();
    assert!((graph.edge(2, 3).unwrap().weight() - 10.0).abs() < 1e-12);
    assert!(graph.rescale_weights(0.0).is_err());
}

#[test]
fn test_infinite_weight_rejected() {
    let mut graph = build_test_graph();
    graph.add_vertex(4);
    assert!(matches!(
        graph.add_edge(1, 4, f64::INFINITY),
        Err(Error::NonPositiveWeight { from: 1, to: 4, .. })
    ));
    assert!(graph.set_edge_weight(1, 2, f64::INFINITY).is_err());
    assert!((graph.edge(1, 2).unwrap().weight() - 0.5).abs() < f64::EPSILON);
}

#[test]
fn test_power_overflow_leaves_weights_unchanged() {
    let mut graph = TrustGraph::new();
    for id in 1..=3 {
        graph.add_vertex(id);
    }
    graph.add_edge(1, 2, 11.0).unwrap();
    graph.add_edge(1, 3, 0.5).unwrap();

    assert!(matches!(
        graph.power_weights(300.0),
        Err(Error::InvalidConfig(_))
    ));
    assert!((graph.edge(1, 2).unwrap().weight() - 11.0).abs() < f64::EPSILON);
    assert!((graph.edge(1, 3).unwrap().weight() - 0.5).abs() < f64::EPSILON);
}

#[test]
fn test_rescale_overflow_keeps_recommendations_finite() {
    let mut graph = TrustGraph::new();
    for id in 1..=3 {
        graph.add_vertex(id);
    }
    graph.add_edge(1, 2, 10.0).unwrap();
    graph.add_edge(1, 3, 5.0).unwrap();

    assert!(matches!(
        graph.rescale_weights(1e308),
        Err(Error::InvalidConfig(_))
    ));
    assert!(graph.rescale_weights(f64::INFINITY).is_err());
    assert!((graph.edge(1, 2).unwrap().weight() - 10.0).abs() < f64::EPSILON);

    let votes = HashMap::from([(2, 4.0), (3, 2.0)]);
    AveragingEngine::new(AveragingConfig::default())
        .unwrap()
        .recommend(&mut graph, &votes, &[1], &mut NoProgress)
        .unwrap();
    let value = graph.vertex(1).unwrap().value();
    assert!(value.is_finite());
    assert!((value - 10.0 / 3.0).abs() < 1e-9, "got {value}");
}

#[test]
fn test_set_edge_weight_on_missing_edge() {
    let mut graph = build_test_graph();
    assert!(matches!(
        graph.set_edge_weight(3, 1, 1.0),
        Err(Error::EdgeNotFound { from: 3, to: 1 })
    ));
}

#[test]
fn test_reassign_weights_drops_non_positive() {
    let mut graph = build_test_graph();
    let removed = graph.reassign_weights(&FixedTrust(0.9)).unwrap();
    assert_eq!(removed, 1);
    assert!(!graph.has_edge(2, 3));
    assert!((graph.edge(1, 2).unwrap().weight() - 0.9).abs() < 1e-12);
    assert!((graph.edge(1, 3).unwrap().weight() - 0.9).abs() < 1e-12);
}

#[test]
fn test_reset_values() {
    let mut graph = build_test_graph();
    graph.vertex_mut(1).unwrap().set_vote(4.0);
    graph.vertex_mut(2).unwrap().record_vote(3.0);
    graph.reset_values();
    assert!(graph.vertices().all(|u| !u.is_voter() && u.value() == 0.0 && u.hits() == 0));
}

#[test]
fn test_user_identity_is_id_only() {
    let mut a = User::new(1);
    a.set_vote(5.0);
    let b = User::new(1);
    assert_eq!(a, b);
    assert!(User::new(1) < User::new(2));

    let mut set = std::collections::HashSet::new();
    set.insert(a);
    assert!(set.contains(&b));
}

#[test]
fn test_user_running_mean() {
    let mut user = User::new(3);
    user.record_vote(5.0);
    user.record_vote(2.0);
    user.record_vote(2.0);
    assert_eq!(user.hits(), 3);
    assert!((user.sigma() - 9.0).abs() < f64::EPSILON);
    assert!((user.value() - 3.0).abs() < f64::EPSILON);
    user.reset();
    assert_eq!(user.hits(), 0);
    assert!(!user.is_voter());
}
