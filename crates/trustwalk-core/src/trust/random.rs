//! Uniform random trust.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;

use super::TrustMetric;

/// Returns a fresh uniform sample in `[0, 1)` on every call.
///
/// Useful as a baseline: graphs built with it carry no rating signal.
pub struct RandomTrust {
    rng: Mutex<StdRng>,
}

impl RandomTrust {
    /// Creates a metric seeded from system entropy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Creates a reproducible metric.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomTrust {
    fn default() -> Self {
        Self::new()
    }
}

impl TrustMetric for RandomTrust {
    fn trust(&self, _from: u64, _to: u64) -> Result<f64> {
        Ok(self.rng.lock().gen::<f64>())
    }
}
