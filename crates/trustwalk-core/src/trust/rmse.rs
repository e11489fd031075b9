//! Inverse RMSE over co-rated items.

use std::sync::Arc;

use crate::error::Result;
use crate::storage::{co_rated, RatingStore};

use super::TrustMetric;

/// Score given to pairs that agree on every co-rated item.
pub const MAX_RMSE_TRUST: f64 = 1_000.0;

/// Trust as `1 / rmse` of the pair's co-rated ratings, capped at
/// [`MAX_RMSE_TRUST`].
pub struct RmseTrust {
    store: Arc<dyn RatingStore>,
}

impl RmseTrust {
    /// Creates the metric.
    #[must_use]
    pub fn new(store: Arc<dyn RatingStore>) -> Self {
        Self { store }
    }
}

impl TrustMetric for RmseTrust {
    fn trust(&self, from: u64, to: u64) -> Result<f64> {
        let pairs = co_rated(self.store.as_ref(), from, to)?;
        if pairs.is_empty() {
            return Ok(0.0);
        }
        let squared: f64 = pairs
            .iter()
            .map(|p| {
                let diff = f64::from(p.first) - f64::from(p.second);
                diff * diff
            })
            .sum();
        #[allow(clippy::cast_precision_loss)] // Reason: co-rated counts are far below 2^52
        let rmse = (squared / pairs.len() as f64).sqrt();
        if rmse == 0.0 {
            return Ok(MAX_RMSE_TRUST);
        }
        Ok((1.0 / rmse).min(MAX_RMSE_TRUST))
    }
}
