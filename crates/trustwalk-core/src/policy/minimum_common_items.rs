use std::sync::Arc;

use crate::error::Result;
use crate::graph::TrustGraph;
use crate::storage::RatingStore;

use super::EdgePolicy;

/// Admits edges between users sharing at least `threshold` rated items.
///
/// Scans both histories with a nested loop and returns as soon as the
/// threshold is reached.
pub struct MinimumCommonItems {
    store: Arc<dyn RatingStore>,
    threshold: usize,
}

impl MinimumCommonItems {
    /// Creates the policy.
    #[must_use]
    pub fn new(store: Arc<dyn RatingStore>, threshold: usize) -> Self {
        Self { store, threshold }
    }
}

impl EdgePolicy for MinimumCommonItems {
    fn allowed(&mut self, from: u64, to: u64, _graph: &TrustGraph) -> Result<bool> {
        if self.threshold == 0 {
            return Ok(true);
        }
        let to_ratings = self.store.ratings_of_user(to);
        let mut common = 0;
        for rating in self.store.ratings_of_user(from) {
            if to_ratings.iter().any(|r| r.item_id == rating.item_id) {
                common += 1;
                if common >= self.threshold {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}
