//! Trust as the number of co-rated items.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::RatingStore;

use super::TrustMetric;

/// Which endpoint's rating count normalizes the co-rated count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Raw co-rated count.
    #[default]
    None,
    /// Divide by the number of items `from` rated.
    ByFrom,
    /// Divide by the number of items `to` rated.
    ByTo,
}

/// Counts co-rated items, optionally normalized and raised to a power.
pub struct CommonItemsTrust {
    store: Arc<dyn RatingStore>,
    normalization: Normalization,
    power: f64,
}

impl CommonItemsTrust {
    /// Creates a raw co-rated count metric.
    #[must_use]
    pub fn new(store: Arc<dyn RatingStore>) -> Self {
        Self {
            store,
            normalization: Normalization::None,
            power: 1.0,
        }
    }

    /// Sets the normalization (builder pattern).
    #[must_use]
    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    /// Raises the (normalized) score to `power` (builder pattern).
    #[must_use]
    pub fn with_power(mut self, power: f64) -> Self {
        self.power = power;
        self
    }
}

impl TrustMetric for CommonItemsTrust {
    #[allow(clippy::cast_precision_loss)] // Reason: rating counts are far below 2^52
    fn trust(&self, from: u64, to: u64) -> Result<f64> {
        let from_ratings = self.store.ratings_of_user(from);
        let to_ratings = self.store.ratings_of_user(to);
        let to_items: FxHashSet<u64> = to_ratings.iter().map(|r| r.item_id).collect();
        let common = from_ratings
            .iter()
            .filter(|r| to_items.contains(&r.item_id))
            .count();
        if common == 0 {
            return Ok(0.0);
        }

        let score = match self.normalization {
            Normalization::None => common as f64,
            Normalization::ByFrom => common as f64 / from_ratings.len() as f64,
            Normalization::ByTo => common as f64 / to_ratings.len() as f64,
        };
        Ok(score.powf(self.power))
    }
}
