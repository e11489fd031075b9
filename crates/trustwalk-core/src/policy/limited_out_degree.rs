use crate::error::Result;
use crate::graph::TrustGraph;

use super::EdgePolicy;

/// Admits edges while the source's out-degree is below `max_degree`.
#[derive(Debug, Clone, Copy)]
pub struct LimitedOutDegree {
    max_degree: usize,
}

impl LimitedOutDegree {
    /// Creates the policy.
    #[must_use]
    pub fn new(max_degree: usize) -> Self {
        Self { max_degree }
    }
}

impl EdgePolicy for LimitedOutDegree {
    fn allowed(&mut self, from: u64, _to: u64, graph: &TrustGraph) -> Result<bool> {
        Ok(graph.out_degree(from) < self.max_degree)
    }
}
