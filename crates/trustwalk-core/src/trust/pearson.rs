//! Pearson correlation over co-rated items.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::storage::{co_rated, RatingStore};

use super::TrustMetric;

/// Pearson correlation of the pair's co-rated ratings.
///
/// The unconstrained form centers each user's ratings on their own mean
/// over the co-rated items. The constrained form centers both users on
/// the scale midpoint `scale / 2 + 1`, which requires an odd scale.
/// Degenerate pairs (no co-rated items, zero variance) score 0.
pub struct PearsonTrust {
    store: Arc<dyn RatingStore>,
    constrained_midpoint: Option<f64>,
}

impl PearsonTrust {
    /// Creates an unconstrained Pearson metric.
    #[must_use]
    pub fn new(store: Arc<dyn RatingStore>) -> Self {
        Self {
            store,
            constrained_midpoint: None,
        }
    }

    /// Creates a Pearson metric constrained to a `1..=scale` rating scale.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if `scale` is even or zero: an even
    /// scale has no midpoint rating.
    pub fn constrained(store: Arc<dyn RatingStore>, scale: u8) -> Result<Self> {
        if scale == 0 || scale % 2 == 0 {
            return Err(Error::InvalidConfig(format!(
                "constrained Pearson needs an odd rating scale, got {scale}"
            )));
        }
        Ok(Self {
            store,
            constrained_midpoint: Some(f64::from(scale / 2 + 1)),
        })
    }
}

impl TrustMetric for PearsonTrust {
    fn trust(&self, from: u64, to: u64) -> Result<f64> {
        let pairs = co_rated(self.store.as_ref(), from, to)?;
        if pairs.is_empty() {
            return Ok(0.0);
        }

        let (shift_first, shift_second) = match self.constrained_midpoint {
            Some(midpoint) => (midpoint, midpoint),
            None => {
                #[allow(clippy::cast_precision_loss)] // Reason: co-rated counts are far below 2^52
                let n = pairs.len() as f64;
                let mean_first = pairs.iter().map(|p| f64::from(p.first)).sum::<f64>() / n;
                let mean_second = pairs.iter().map(|p| f64::from(p.second)).sum::<f64>() / n;
                (mean_first, mean_second)
            }
        };

        let mut numerator = 0.0;
        let mut first_sq = 0.0;
        let mut second_sq = 0.0;
        for p in &pairs {
            let a = f64::from(p.first) - shift_first;
            let b = f64::from(p.second) - shift_second;
            numerator += a * b;
            first_sq += a * a;
            second_sq += b * b;
        }

        let denominator = (first_sq * second_sq).sqrt();
        if denominator == 0.0 {
            return Ok(0.0);
        }
        Ok(numerator / denominator)
    }
}
