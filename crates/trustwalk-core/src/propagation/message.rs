//! Propagation messages on the discrete rating scale.

use serde::{Deserialize, Serialize};

/// Lowest vote on the rating scale.
pub const MIN_VOTE: u8 = 1;
/// Highest vote on the rating scale.
pub const MAX_VOTE: u8 = 5;
/// Number of distinct votes.
pub const SCALE_SIZE: usize = (MAX_VOTE - MIN_VOTE + 1) as usize;
/// Sentinel vote meaning "no information".
pub const CLUELESS_VOTE: u8 = u8::MAX;

/// A vote distribution over `MIN_VOTE..=MAX_VOTE`, in percent.
///
/// A message whose distribution is all zero carries no information: it
/// is invalid and must be left out of any aggregate.
///
/// # Example
///
/// ```rust
/// use trustwalk_core::propagation::{VotesDistributionMessage, CLUELESS_VOTE};
///
/// let four = VotesDistributionMessage::from_vote(4);
/// assert!(four.is_valid());
/// assert_eq!(four.expected_value(), Some(4.0));
///
/// let clueless = VotesDistributionMessage::from_vote(CLUELESS_VOTE);
/// assert!(!clueless.is_valid());
/// assert_eq!(clueless.expected_value(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VotesDistributionMessage {
    distribution: [f64; SCALE_SIZE],
}

impl VotesDistributionMessage {
    /// A point mass on `vote`. Votes outside the scale, including
    /// [`CLUELESS_VOTE`], give an invalid message.
    #[must_use]
    pub fn from_vote(vote: u8) -> Self {
        let mut distribution = [0.0; SCALE_SIZE];
        if (MIN_VOTE..=MAX_VOTE).contains(&vote) {
            distribution[usize::from(vote - MIN_VOTE)] = 100.0;
        }
        Self { distribution }
    }

    /// The no-information message.
    #[must_use]
    pub fn clueless() -> Self {
        Self {
            distribution: [0.0; SCALE_SIZE],
        }
    }

    /// A general distribution. Negative or non-finite entries count as 0.
    #[must_use]
    pub fn from_distribution(distribution: [f64; SCALE_SIZE]) -> Self {
        Self {
            distribution: distribution.map(|p| if p.is_finite() && p > 0.0 { p } else { 0.0 }),
        }
    }

    /// Mixes `low` and `high` with `high_share` of the mass on `high`.
    ///
    /// If one side is invalid the other is returned unchanged.
    #[must_use]
    pub fn blend(low: &Self, high: &Self, high_share: f64) -> Self {
        match (low.is_valid(), high.is_valid()) {
            (false, false) => Self::clueless(),
            (true, false) => *low,
            (false, true) => *high,
            (true, true) => {
                let share = high_share.clamp(0.0, 1.0);
                let mut distribution = [0.0; SCALE_SIZE];
                for (i, slot) in distribution.iter_mut().enumerate() {
                    *slot = (1.0 - share) * low.distribution[i] + share * high.distribution[i];
                }
                Self { distribution }
            }
        }
    }

    /// Returns true if the message carries any information.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.distribution.iter().any(|&p| p > 0.0)
    }

    /// Mean vote under the distribution, `None` for an invalid message.
    #[must_use]
    pub fn expected_value(&self) -> Option<f64> {
        let mass: f64 = self.distribution.iter().sum();
        if mass <= 0.0 {
            return None;
        }
        let weighted: f64 = self
            .distribution
            .iter()
            .zip(MIN_VOTE..=MAX_VOTE)
            .map(|(p, vote)| p * f64::from(vote))
            .sum();
        Some(weighted / mass)
    }

    /// The raw percentages, lowest vote first.
    #[must_use]
    pub fn distribution(&self) -> &[f64; SCALE_SIZE] {
        &self.distribution
    }
}
