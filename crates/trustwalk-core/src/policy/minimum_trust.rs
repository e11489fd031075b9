use crate::error::Result;
use crate::graph::TrustGraph;
use crate::trust::SharedTrustMetric;

use super::EdgePolicy;

/// Admits edges whose trust is at least `threshold`.
pub struct MinimumTrust {
    metric: SharedTrustMetric,
    threshold: f64,
}

impl MinimumTrust {
    /// Creates the policy.
    #[must_use]
    pub fn new(metric: SharedTrustMetric, threshold: f64) -> Self {
        Self { metric, threshold }
    }
}

impl EdgePolicy for MinimumTrust {
    fn allowed(&mut self, from: u64, to: u64, _graph: &TrustGraph) -> Result<bool> {
        Ok(self.metric.trust(from, to)? >= self.threshold)
    }
}
