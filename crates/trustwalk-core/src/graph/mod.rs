//! Directed, weighted trust graph over users.
//!
//! Vertices are [`User`]s keyed by integer id; edges are [`Trust`] levels
//! from one user to another. The graph is built once per run by
//! [`crate::builder::GraphBuilder`] and then mutated in place by the
//! propagation engines, one item at a time.
//!
//! # Example
//!
//! ```rust
//! use trustwalk_core::graph::TrustGraph;
//!
//! let mut graph = TrustGraph::new();
//! graph.add_vertex(1);
//! graph.add_vertex(2);
//! graph.add_edge(1, 2, 0.8).unwrap();
//!
//! assert!(graph.add_edge(1, 1, 1.0).is_err());
//! assert!(graph.add_edge(2, 1, 0.0).is_err());
//! assert_eq!(graph.out_degree(1), 1);
//! assert!(graph.is_sink(2));
//! ```

mod components;
pub mod persistence;
mod trust_graph;
mod types;

#[cfg(test)]
mod components_tests;
#[cfg(test)]
mod trust_graph_tests;

pub use trust_graph::TrustGraph;
pub use types::{Trust, User};
