//! End-to-end tests: rating history to graph, snapshot, propagation and
//! CSV output through the public API only.

use std::collections::HashMap;
use std::sync::Arc;

use trustwalk_core::builder::{EdgeStrategy, GraphBuilder};
use trustwalk_core::graph::persistence::{load_graph, load_values, save_graph, save_values};
use trustwalk_core::policy::PolicyChain;
use trustwalk_core::propagation::{
    AveragingConfig, AveragingEngine, NoProgress, PropagationEngine, RandomWalkConfig,
    RandomWalkEngine,
};
use trustwalk_core::report::RecommendationWriter;
use trustwalk_core::storage::{InMemoryRatingStore, RatingEvent, RatingStore};
use trustwalk_core::trust::CommonItemsTrust;
use trustwalk_core::{RecommendationSession, TrustGraph};

/// Users 1, 2 and 3 share items 1 and 2; only users 1 and 2 rated item 100.
fn shared_history() -> Arc<dyn RatingStore> {
    let events = [
        RatingEvent::new(1, 1, 3, 0),
        RatingEvent::new(1, 2, 3, 1),
        RatingEvent::new(1, 3, 3, 2),
        RatingEvent::new(2, 1, 4, 3),
        RatingEvent::new(2, 2, 2, 4),
        RatingEvent::new(2, 3, 5, 5),
        RatingEvent::new(100, 1, 4, 6),
        RatingEvent::new(100, 2, 2, 7),
    ];
    Arc::new(InMemoryRatingStore::from_events(events).unwrap())
}

fn build_graph(store: &Arc<dyn RatingStore>) -> TrustGraph {
    let metric = Arc::new(CommonItemsTrust::new(Arc::clone(store)));
    GraphBuilder::new(
        Arc::clone(store),
        metric,
        EdgeStrategy::BruteForce(PolicyChain::new()),
    )
    .with_queue_capacity(2)
    .build()
    .unwrap()
    .graph
}

fn sorted_edges(graph: &TrustGraph) -> Vec<(u64, u64, f64)> {
    let mut edges: Vec<_> = graph
        .edges()
        .map(|e| (e.source(), e.target(), e.weight()))
        .collect();
    edges.sort_by_key(|&(from, to, _)| (from, to));
    edges
}

#[test]
fn test_brute_force_graph_is_complete() {
    let store = shared_history();
    let graph = build_graph(&store);

    assert_eq!(graph.vertex_ids(), vec![1, 2, 3]);
    assert_eq!(graph.edge_count(), 6);
    assert_eq!(graph.largest_component(), vec![1, 2, 3]);
}

#[test]
fn test_snapshot_reload_propagates_identically() {
    let store = shared_history();
    let original = build_graph(&store);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.bin");

    save_graph(&path, &original).unwrap();
    let loaded = load_graph(&path).unwrap();
    assert_eq!(sorted_edges(&loaded), sorted_edges(&original));

    let votes = HashMap::from([(1, 4.0), (2, 2.0)]);
    let mut results = Vec::new();
    for mut graph in [original, loaded] {
        let mut engine = RandomWalkEngine::with_seed(
            RandomWalkConfig {
                budget: 500,
                ..RandomWalkConfig::default()
            },
            9,
        );
        engine
            .recommend(&mut graph, &votes, &[3], &mut NoProgress)
            .unwrap();
        let user = graph.vertex(3).unwrap();
        results.push((user.value(), user.hits()));
    }
    assert_eq!(results[0], results[1]);
    assert!(results[0].1 > 0);
}

#[test]
fn test_value_snapshot_restores_state() {
    let store = shared_history();
    let mut graph = build_graph(&store);
    let votes = HashMap::from([(1, 4.0), (2, 2.0)]);
    AveragingEngine::new(AveragingConfig::default())
        .unwrap()
        .recommend(&mut graph, &votes, &[3], &mut NoProgress)
        .unwrap();
    let expected = graph.vertex(3).unwrap().value();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("values.bin");
    save_values(&path, &graph).unwrap();

    graph.reset_values();
    assert_eq!(graph.vertex(3).unwrap().value(), 0.0);
    assert_eq!(load_values(&path, &mut graph).unwrap(), 3);
    assert_eq!(graph.vertex(3).unwrap().value(), expected);
    assert!(graph.vertex(1).unwrap().is_voter());
}

#[test]
fn test_session_answers_questions_from_history() {
    let store = shared_history();
    let graph = build_graph(&store);
    let engine = AveragingEngine::new(AveragingConfig::default()).unwrap();
    let mut session = RecommendationSession::new(
        Arc::clone(&store),
        graph,
        Box::new(engine),
        RecommendationWriter::new(Vec::new()),
    );

    let stats = session.run([(100, 3), (100, 99)]).unwrap();
    assert_eq!(stats.items, 1);
    assert_eq!(stats.unknown_users, 1);
    assert_eq!(stats.rows_written, 1);

    let output = String::from_utf8(session.finish().unwrap()).unwrap();
    let mut lines = output.lines();
    assert_eq!(lines.next(), Some("item_id,user_id,value"));
    let row: Vec<&str> = lines.next().unwrap().split(',').collect();
    assert_eq!(&row[..2], &["100", "3"]);
    let value: f64 = row[2].parse().unwrap();
    assert!((value - 3.0).abs() < 1e-9, "got {value}");
    assert_eq!(lines.next(), None);
}
