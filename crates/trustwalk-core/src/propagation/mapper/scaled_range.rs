//! Linear mapping between users' observed rating ranges.

use rustc_hash::FxHashMap;

use super::VotesMapper;
use crate::propagation::message::{VotesDistributionMessage, MAX_VOTE, MIN_VOTE};
use crate::storage::RatingStore;

/// Rescales a vote from the source's `[min, max]` rating range onto the
/// destination's.
///
/// A source that always gives the same rating maps to the middle of the
/// destination's range. Users without ratings get clueless messages.
#[derive(Debug, Clone, Default)]
pub struct ScaledRangeMapper {
    ranges: FxHashMap<u64, (u8, u8)>,
}

impl ScaledRangeMapper {
    /// Collects every user's rating range from `store`.
    #[must_use]
    pub fn from_store(store: &dyn RatingStore) -> Self {
        let mut ranges = FxHashMap::default();
        for user_id in store.user_ids() {
            let ratings = store.ratings_of_user(user_id);
            let min = ratings.iter().map(|r| r.rating).min();
            let max = ratings.iter().map(|r| r.rating).max();
            if let (Some(min), Some(max)) = (min, max) {
                ranges.insert(user_id, (min, max));
            }
        }
        Self { ranges }
    }

    /// Returns the observed `(min, max)` of a user.
    #[must_use]
    pub fn range_of(&self, user_id: u64) -> Option<(u8, u8)> {
        self.ranges.get(&user_id).copied()
    }
}

impl VotesMapper for ScaledRangeMapper {
    fn map_vote(&self, source: u64, dest: u64, vote: u8) -> VotesDistributionMessage {
        if !(MIN_VOTE..=MAX_VOTE).contains(&vote) {
            return VotesDistributionMessage::clueless();
        }
        let (Some((src_min, src_max)), Some((dst_min, dst_max))) =
            (self.range_of(source), self.range_of(dest))
        else {
            return VotesDistributionMessage::clueless();
        };

        let dst_low = f64::from(dst_min);
        let dst_span = f64::from(dst_max) - dst_low;
        let mapped = if src_max == src_min {
            dst_low + dst_span / 2.0
        } else {
            let src_span = f64::from(src_max) - f64::from(src_min);
            dst_low + (f64::from(vote) - f64::from(src_min)) * dst_span / src_span
        };

        let clamped = mapped.round().clamp(f64::from(MIN_VOTE), f64::from(MAX_VOTE));
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        // Reason: clamped to MIN_VOTE..=MAX_VOTE
        let vote = clamped as u8;
        VotesDistributionMessage::from_vote(vote)
    }
}
