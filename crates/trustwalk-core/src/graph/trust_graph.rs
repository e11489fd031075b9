//! Directed trust graph over users.
//!
//! Adjacency is indexed in both directions: propagation engines read a
//! vertex's outgoing edges (whom it trusts) while mappers are built from
//! incoming edges. Outgoing lists keep insertion order so that seeded
//! random walks are reproducible.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::trust::TrustMetric;

use super::types::{Trust, User};

/// Directed graph of [`User`] vertices and weighted [`Trust`] edges.
///
/// Invariants enforced on every mutation:
/// - no self-loops,
/// - at most one edge per ordered `(from, to)` pair,
/// - every weight is finite and strictly positive.
#[derive(Debug, Default, Clone)]
pub struct TrustGraph {
    /// Vertices ordered by id.
    vertices: BTreeMap<u64, User>,
    /// Edges indexed by `(source, target)`.
    edges: FxHashMap<(u64, u64), Trust>,
    /// Outgoing adjacency: source -> targets in insertion order.
    outgoing: FxHashMap<u64, Vec<u64>>,
    /// Incoming adjacency: target -> sources in insertion order.
    incoming: FxHashMap<u64, Vec<u64>>,
}

impl TrustGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a graph with pre-allocated edge capacity.
    #[must_use]
    pub fn with_capacity(expected_edges: usize, expected_vertices: usize) -> Self {
        Self {
            vertices: BTreeMap::new(),
            edges: FxHashMap::with_capacity_and_hasher(expected_edges, Default::default()),
            outgoing: FxHashMap::with_capacity_and_hasher(expected_vertices, Default::default()),
            incoming: FxHashMap::with_capacity_and_hasher(expected_vertices, Default::default()),
        }
    }

    // ── Vertices ───────────────────────────────────────────────────────

    /// Adds a vertex for `user_id`. Returns false if it already existed.
    pub fn add_vertex(&mut self, user_id: u64) -> bool {
        if self.vertices.contains_key(&user_id) {
            return false;
        }
        self.vertices.insert(user_id, User::new(user_id));
        true
    }

    /// Returns true if the vertex exists.
    #[must_use]
    pub fn contains_vertex(&self, user_id: u64) -> bool {
        self.vertices.contains_key(&user_id)
    }

    /// Gets a vertex by id.
    #[must_use]
    pub fn vertex(&self, user_id: u64) -> Option<&User> {
        self.vertices.get(&user_id)
    }

    /// Gets a mutable vertex by id.
    #[must_use]
    pub fn vertex_mut(&mut self, user_id: u64) -> Option<&mut User> {
        self.vertices.get_mut(&user_id)
    }

    /// Returns the number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Returns all vertex ids in ascending order.
    #[must_use]
    pub fn vertex_ids(&self) -> Vec<u64> {
        self.vertices.keys().copied().collect()
    }

    /// Iterates over vertices in ascending id order.
    pub fn vertices(&self) -> impl Iterator<Item = &User> {
        self.vertices.values()
    }

    /// Iterates mutably over vertices in ascending id order.
    pub fn vertices_mut(&mut self) -> impl Iterator<Item = &mut User> {
        self.vertices.values_mut()
    }

    /// Resets every vertex's propagation state.
    pub fn reset_values(&mut self) {
        for user in self.vertices.values_mut() {
            user.reset();
        }
    }

    // ── Edges ──────────────────────────────────────────────────────────

    /// Adds a directed trust edge.
    ///
    /// # Errors
    ///
    /// - `Error::SelfLoop` if `from == to`
    /// - `Error::VertexNotFound` if either endpoint is missing
    /// - `Error::EdgeExists` if the ordered pair is already connected
    /// - `Error::NonPositiveWeight` if `weight <= 0` or is not finite
    pub fn add_edge(&mut self, from: u64, to: u64, weight: f64) -> Result<()> {
        if from == to {
            return Err(Error::SelfLoop(from));
        }
        for id in [from, to] {
            if !self.vertices.contains_key(&id) {
                return Err(Error::VertexNotFound(id));
            }
        }
        if self.edges.contains_key(&(from, to)) {
            return Err(Error::EdgeExists { from, to });
        }
        check_weight(from, to, weight)?;

        self.edges.insert((from, to), Trust::new(from, to, weight));
        self.outgoing.entry(from).or_default().push(to);
        self.incoming.entry(to).or_default().push(from);
        Ok(())
    }

    /// Removes an edge, returning it if it existed.
    pub fn remove_edge(&mut self, from: u64, to: u64) -> Option<Trust> {
        let edge = self.edges.remove(&(from, to))?;
        if let Some(targets) = self.outgoing.get_mut(&from) {
            targets.retain(|&t| t != to);
        }
        if let Some(sources) = self.incoming.get_mut(&to) {
            sources.retain(|&s| s != from);
        }
        Some(edge)
    }

    /// Gets the edge `from -> to`.
    #[must_use]
    pub fn edge(&self, from: u64, to: u64) -> Option<&Trust> {
        self.edges.get(&(from, to))
    }

    /// Returns true if `from -> to` exists.
    #[must_use]
    pub fn has_edge(&self, from: u64, to: u64) -> bool {
        self.edges.contains_key(&(from, to))
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Iterates over all edges in unspecified order.
    pub fn edges(&self) -> impl Iterator<Item = &Trust> {
        self.edges.values()
    }

    /// Outgoing edges of `user_id`, in insertion order.
    pub fn outgoing(&self, user_id: u64) -> impl Iterator<Item = &Trust> + '_ {
        self.outgoing
            .get(&user_id)
            .into_iter()
            .flatten()
            .filter_map(move |&to| self.edges.get(&(user_id, to)))
    }

    /// Incoming edges of `user_id`, in insertion order.
    pub fn incoming(&self, user_id: u64) -> impl Iterator<Item = &Trust> + '_ {
        self.incoming
            .get(&user_id)
            .into_iter()
            .flatten()
            .filter_map(move |&from| self.edges.get(&(from, user_id)))
    }

    /// Returns the out-degree of a vertex (0 if unknown).
    #[must_use]
    pub fn out_degree(&self, user_id: u64) -> usize {
        self.outgoing.get(&user_id).map_or(0, Vec::len)
    }

    /// Returns the in-degree of a vertex (0 if unknown).
    #[must_use]
    pub fn in_degree(&self, user_id: u64) -> usize {
        self.incoming.get(&user_id).map_or(0, Vec::len)
    }

    /// Returns true if the vertex has no outgoing edges.
    #[must_use]
    pub fn is_sink(&self, user_id: u64) -> bool {
        self.out_degree(user_id) == 0
    }

    // ── Weight reassignment ────────────────────────────────────────────

    /// Overwrites the weight of an existing edge.
    ///
    /// # Errors
    ///
    /// Returns `Error::NonPositiveWeight` for a non-positive weight and
    /// `Error::EdgeNotFound` when the edge does not exist.
    pub fn set_edge_weight(&mut self, from: u64, to: u64, weight: f64) -> Result<()> {
        check_weight(from, to, weight)?;
        let edge = self
            .edges
            .get_mut(&(from, to))
            .ok_or(Error::EdgeNotFound { from, to })?;
        edge.set_weight(weight);
        Ok(())
    }

    /// Raises every weight to `power`.
    ///
    /// Weights that underflow are clamped to the smallest positive value.
    /// The graph is left unchanged if any result would not be finite.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if `power` is not finite or a powered
    /// weight overflows.
    pub fn power_weights(&mut self, power: f64) -> Result<()> {
        if !power.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "weight power must be finite, got {power}"
            )));
        }
        self.map_weights(|weight| weight.powf(power).max(f64::MIN_POSITIVE))
            .map_err(|edge| {
                Error::InvalidConfig(format!(
                    "weight power {power} overflows edge {} -> {}",
                    edge.source(),
                    edge.target()
                ))
            })
    }

    /// Multiplies every weight by `factor`.
    ///
    /// Weights that underflow are clamped to the smallest positive value.
    /// The graph is left unchanged if any result would not be finite.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` unless `factor` is finite and strictly
    /// positive, or if a rescaled weight overflows.
    pub fn rescale_weights(&mut self, factor: f64) -> Result<()> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "rescale factor must be finite and > 0, got {factor}"
            )));
        }
        self.map_weights(|weight| (weight * factor).max(f64::MIN_POSITIVE))
            .map_err(|edge| {
                Error::InvalidConfig(format!(
                    "rescale factor {factor} overflows edge {} -> {}",
                    edge.source(),
                    edge.target()
                ))
            })
    }

    /// Applies `f` to every weight, or to none if some result is not
    /// finite. Returns the first offending edge.
    fn map_weights<F: Fn(f64) -> f64>(&mut self, f: F) -> std::result::Result<(), Trust> {
        if let Some(edge) = self.edges.values().find(|e| !f(e.weight()).is_finite()) {
            return Err(*edge);
        }
        for edge in self.edges.values_mut() {
            edge.set_weight(f(edge.weight()));
        }
        Ok(())
    }

    /// Recomputes every weight with `metric`, removing edges whose new
    /// trust is not strictly positive. Returns the number of removed edges.
    pub fn reassign_weights(&mut self, metric: &dyn TrustMetric) -> Result<usize> {
        let mut keys: Vec<(u64, u64)> = self.edges.keys().copied().collect();
        keys.sort_unstable();

        let mut removed = 0;
        for (from, to) in keys {
            let trust = metric.trust(from, to)?;
            if trust > 0.0 {
                self.set_edge_weight(from, to, trust)?;
            } else {
                self.remove_edge(from, to);
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn check_weight(from: u64, to: u64, weight: f64) -> Result<()> {
    if !weight.is_finite() || weight <= 0.0 {
        return Err(Error::NonPositiveWeight { from, to, weight });
    }
    Ok(())
}
