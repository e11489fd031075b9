//! Tests for strongly connected components.

use super::trust_graph::TrustGraph;

fn graph_with(vertices: &[u64], edges: &[(u64, u64)]) -> TrustGraph {
    let mut graph = TrustGraph::new();
    for &id in vertices {
        graph.add_vertex(id);
    }
    for &(from, to) in edges {
        graph.add_edge(from, to, 1.0).unwrap();
    }
    graph
}

#[test]
fn test_empty_graph_has_no_components() {
    let graph = TrustGraph::new();
    assert!(graph.strongly_connected_components().is_empty());
    assert!(graph.largest_component().is_empty());
}

#[test]
fn test_isolated_vertices_are_singletons() {
    let graph = graph_with(&[1, 2, 3], &[]);
    let mut components = graph.strongly_connected_components();
    components.sort();
    assert_eq!(components, vec![vec![1], vec![2], vec![3]]);
}

#[test]
fn test_cycle_and_tail() {
    // 1 -> 2 -> 3 -> 1 is a cycle, 3 -> 4 -> 5 is a tail.
    let graph = graph_with(&[1, 2, 3, 4, 5], &[(1, 2), (2, 3), (3, 1), (3, 4), (4, 5)]);
    let mut components = graph.strongly_connected_components();
    components.sort();
    assert_eq!(components, vec![vec![1, 2, 3], vec![4], vec![5]]);
    assert_eq!(graph.largest_component(), vec![1, 2, 3]);
}

#[test]
fn test_two_cycles_bridged_one_way() {
    let graph = graph_with(
        &[1, 2, 3, 4],
        &[(1, 2), (2, 1), (2, 3), (3, 4), (4, 3)],
    );
    let mut components = graph.strongly_connected_components();
    components.sort();
    assert_eq!(components, vec![vec![1, 2], vec![3, 4]]);
    // Equal sizes: smallest member id wins.
    assert_eq!(graph.largest_component(), vec![1, 2]);
}

#[test]
fn test_long_chain_does_not_recurse() {
    let ids: Vec<u64> = (0..50_000).collect();
    let edges: Vec<(u64, u64)> = ids.windows(2).map(|w| (w[0], w[1])).collect();
    let mut graph = graph_with(&ids, &edges);
    graph.add_edge(49_999, 0, 1.0).unwrap();
    assert_eq!(graph.largest_component().len(), 50_000);
}
