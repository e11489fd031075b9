//! Trust metrics: how much one user's ratings predict another's.
//!
//! A [`TrustMetric`] scores an ordered pair of users. Scores are not
//! required to be symmetric. Every metric except [`RandomTrust`] works on
//! co-rated items and returns a neutral `0.0` when the pair shares none.
//!
//! Metrics are shared between the builder, its edge policies and the
//! weight assignment step, so they are handed around as
//! [`SharedTrustMetric`]. Wrap an expensive metric in [`CachedTrustMetric`]
//! to avoid scoring the same pair twice in a row.

mod agreement;
mod cache;
mod common_items;
mod pearson;
mod random;
mod rmse;

#[cfg(test)]
mod metrics_tests;

use std::sync::Arc;

use crate::error::Result;

pub use agreement::AgreementTrust;
pub use cache::{CacheStats, CachedTrustMetric, FifoCache, DEFAULT_CAPACITY};
pub use common_items::{CommonItemsTrust, Normalization};
pub use pearson::PearsonTrust;
pub use random::RandomTrust;
pub use rmse::{RmseTrust, MAX_RMSE_TRUST};

/// Scores how much `from` trusts `to`.
pub trait TrustMetric: Send + Sync {
    /// Returns the trust level from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns `Error::CorruptedData` if the rating histories of the pair
    /// are inconsistent.
    fn trust(&self, from: u64, to: u64) -> Result<f64>;
}

/// Thread-safe shared handle to a metric.
pub type SharedTrustMetric = Arc<dyn TrustMetric>;

impl<T: TrustMetric + ?Sized> TrustMetric for Arc<T> {
    fn trust(&self, from: u64, to: u64) -> Result<f64> {
        (**self).trust(from, to)
    }
}
