//! Per-edge vote remapping.
//!
//! A [`VotesMapper`] translates a vote observed at a source vertex into the
//! vote it predicts at a neighboring destination vertex. Users rate on
//! different personal scales; a mapper lets "3 from a harsh rater" arrive
//! as "4" at a generous one.
//!
//! Calls are keyed `(source, dest)`: the vertex whose value is sent, then
//! the vertex receiving it.

mod identity;
mod min_rmse;
mod scaled_range;

#[cfg(test)]
mod mapper_tests;

use super::message::{VotesDistributionMessage, MAX_VOTE, MIN_VOTE};

pub use identity::IdentityMapper;
pub use min_rmse::{CluelessStrategy, MinRmseMapper};
pub use scaled_range::ScaledRangeMapper;

/// Maps votes across a trust edge.
pub trait VotesMapper: Send + Sync {
    /// Maps an integer `vote` seen at `source` to a distribution at `dest`.
    ///
    /// Votes outside `MIN_VOTE..=MAX_VOTE` map to a clueless message.
    fn map_vote(&self, source: u64, dest: u64, vote: u8) -> VotesDistributionMessage;

    /// Maps a real-valued `value`.
    ///
    /// The value is clamped to the scale and split between the two
    /// neighboring votes in proportion to its fractional part; each part is
    /// mapped with [`map_vote`](Self::map_vote) and the results blended.
    fn map_value(&self, source: u64, dest: u64, value: f64) -> VotesDistributionMessage {
        if !value.is_finite() {
            return VotesDistributionMessage::clueless();
        }
        let clamped = value.clamp(f64::from(MIN_VOTE), f64::from(MAX_VOTE));
        let floor = clamped.floor();
        let fraction = clamped - floor;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        // Reason: floor is within MIN_VOTE..=MAX_VOTE after the clamp
        let low_vote = floor as u8;

        let low = self.map_vote(source, dest, low_vote);
        if fraction <= 0.0 || low_vote >= MAX_VOTE {
            return low;
        }
        let high = self.map_vote(source, dest, low_vote + 1);
        VotesDistributionMessage::blend(&low, &high, fraction)
    }
}
