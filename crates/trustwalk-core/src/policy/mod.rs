//! Edge admission policies.
//!
//! A policy decides whether the candidate edge `from -> to` may enter the
//! graph built so far. Policies compose by conjunction: a [`PolicyChain`]
//! evaluates its members in insertion order and stops at the first
//! rejection.
//!
//! ```rust
//! use std::sync::Arc;
//! use trustwalk_core::graph::TrustGraph;
//! use trustwalk_core::policy::{EdgePolicy, LimitedOutDegree, MinimumTrust};
//! use trustwalk_core::trust::RandomTrust;
//!
//! let metric = Arc::new(RandomTrust::with_seed(1));
//! let mut policy = MinimumTrust::new(metric, 0.0).and(LimitedOutDegree::new(5));
//!
//! let mut graph = TrustGraph::new();
//! graph.add_vertex(1);
//! graph.add_vertex(2);
//! assert!(policy.allowed(1, 2, &graph).unwrap());
//! ```
//!
//! Closures with the signature `FnMut(u64, u64, &TrustGraph) -> Result<bool>`
//! are policies too.

mod limited_out_degree;
mod minimum_common_items;
mod minimum_total_trust;
mod minimum_trust;
mod random_walk_based;


use crate::error::Result;
use crate::graph::TrustGraph;

pub use limited_out_degree::LimitedOutDegree;
pub use minimum_common_items::MinimumCommonItems;
pub use minimum_total_trust::MinimumTotalTrust;
pub use minimum_trust::MinimumTrust;
pub use random_walk_based::{BipartiteWalkConfig, RandomWalkBased};

/// Decides whether a candidate edge may be added.
pub trait EdgePolicy: Send {
    /// Returns true if `from -> to` may be added to `graph`.
    ///
    /// # Errors
    ///
    /// Propagates trust metric errors and policy misuse.
    fn allowed(&mut self, from: u64, to: u64, graph: &TrustGraph) -> Result<bool>;

    /// Conjoins this policy with `other`.
    fn and<P>(self, other: P) -> PolicyChain
    where
        Self: Sized + 'static,
        P: EdgePolicy + 'static,
    {
        PolicyChain::new().and(self).and(other)
    }
}

impl<F> EdgePolicy for F
where
    F: FnMut(u64, u64, &TrustGraph) -> Result<bool> + Send,
{
    fn allowed(&mut self, from: u64, to: u64, graph: &TrustGraph) -> Result<bool> {
        self(from, to, graph)
    }
}

/// Ordered conjunction of policies. An empty chain admits every edge.
#[derive(Default)]
pub struct PolicyChain {
    policies: Vec<Box<dyn EdgePolicy>>,
}

impl PolicyChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a policy evaluated after the existing ones.
    #[must_use]
    pub fn and<P: EdgePolicy + 'static>(mut self, policy: P) -> Self {
        self.policies.push(Box::new(policy));
        self
    }

    /// Returns the number of chained policies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Returns true if the chain admits everything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl EdgePolicy for PolicyChain {
    fn allowed(&mut self, from: u64, to: u64, graph: &TrustGraph) -> Result<bool> {
        for policy in &mut self.policies {
            if !policy.allowed(from, to, graph)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl std::fmt::Debug for PolicyChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyChain")
            .field("policies", &self.policies.len())
            .finish()
    }
}
