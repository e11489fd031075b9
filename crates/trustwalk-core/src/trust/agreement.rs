//! Closeness-weighted agreement over co-rated items.

use std::sync::Arc;

use crate::error::Result;
use crate::storage::{co_rated, RatingStore};

use super::TrustMetric;

/// Closeness credited for a rating gap of 0, 1, 2, 3 and 4 or more.
const CLOSENESS: [f64; 5] = [5.0, 3.0, 0.0, -3.0, -5.0];

/// Agreement score: summed closeness of co-rated items, scaled by
/// `log2(n) / n` where `n` is the co-rated count.
///
/// Pairs with a single co-rated item score 0 because `log2(1) = 0`.
pub struct AgreementTrust {
    store: Arc<dyn RatingStore>,
}

impl AgreementTrust {
    /// Creates the metric.
    #[must_use]
    pub fn new(store: Arc<dyn RatingStore>) -> Self {
        Self { store }
    }
}

impl TrustMetric for AgreementTrust {
    fn trust(&self, from: u64, to: u64) -> Result<f64> {
        let pairs = co_rated(self.store.as_ref(), from, to)?;
        if pairs.is_empty() {
            return Ok(0.0);
        }
        let closeness: f64 = pairs
            .iter()
            .map(|p| {
                let gap = usize::from(p.first.abs_diff(p.second));
                CLOSENESS[gap.min(CLOSENESS.len() - 1)]
            })
            .sum();
        #[allow(clippy::cast_precision_loss)] // Reason: co-rated counts are far below 2^52
        let n = pairs.len() as f64;
        Ok(closeness * n.log2() / n)
    }
}
