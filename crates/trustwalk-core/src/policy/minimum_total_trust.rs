//! Greedy cut-off on accumulated trust.

use crate::error::{Error, Result};
use crate::graph::TrustGraph;
use crate::trust::SharedTrustMetric;

use super::EdgePolicy;

/// Admits edges until the trust accumulated by this instance reaches
/// `threshold`.
///
/// The running total is instance state. One instance covers the admission
/// sequence of exactly one source vertex: it is bound to that source at
/// construction and returns `Error::PolicyScope` if asked about another
/// one. Build a fresh instance per source.
///
/// An admitted edge adds its trust to the total before the threshold is
/// checked again, so the edge that crosses the threshold is still admitted
/// and the next one is rejected.
pub struct MinimumTotalTrust {
    source: u64,
    metric: SharedTrustMetric,
    threshold: f64,
    accumulated: f64,
}

impl MinimumTotalTrust {
    /// Creates a policy for `source` with an absolute threshold.
    #[must_use]
    pub fn for_source(source: u64, metric: SharedTrustMetric, threshold: f64) -> Self {
        Self {
            source,
            metric,
            threshold,
            accumulated: 0.0,
        }
    }

    /// Returns the trust accumulated so far.
    #[must_use]
    pub fn accumulated(&self) -> f64 {
        self.accumulated
    }

    /// Returns the cut-off.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl EdgePolicy for MinimumTotalTrust {
    fn allowed(&mut self, from: u64, to: u64, _graph: &TrustGraph) -> Result<bool> {
        if from != self.source {
            return Err(Error::PolicyScope {
                expected: self.source,
                actual: from,
            });
        }
        if self.accumulated >= self.threshold {
            return Ok(false);
        }
        self.accumulated += self.metric.trust(from, to)?;
        Ok(true)
    }
}
