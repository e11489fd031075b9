//! Vertex and edge types of the trust graph.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A user vertex.
///
/// Identity is the integer id alone: equality, hashing and ordering never
/// look at the mutable propagation state.
///
/// # Example
///
/// ```rust
/// use trustwalk_core::graph::User;
///
/// let mut user = User::new(7);
/// user.record_vote(4.0);
/// user.record_vote(2.0);
///
/// assert_eq!(user.hits(), 2);
/// assert!((user.value() - 3.0).abs() < f64::EPSILON);
/// assert_eq!(user, User::new(7));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    id: u64,
    value: f64,
    is_voter: bool,
    sigma: f64,
    hits: u64,
}

impl User {
    /// Creates a non-voting user with value 0.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            value: 0.0,
            is_voter: false,
            sigma: 0.0,
            hits: 0,
        }
    }

    /// Returns the user id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the current value (known vote or running recommendation).
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Overwrites the current value.
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    /// Returns true if the user's vote is known for the current item.
    #[must_use]
    pub fn is_voter(&self) -> bool {
        self.is_voter
    }

    /// Marks the user as a voter holding `vote`.
    pub fn set_vote(&mut self, vote: f64) {
        self.is_voter = true;
        self.value = vote;
    }

    /// Returns the running vote sum.
    #[must_use]
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Returns how many votes reached this user.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Folds a propagated vote into the running mean.
    pub fn record_vote(&mut self, vote: f64) {
        self.sigma += vote;
        self.hits += 1;
        #[allow(clippy::cast_precision_loss)] // Reason: hit counts stay far below 2^52
        let hits = self.hits as f64;
        self.value = self.sigma / hits;
    }

    /// Clears voter flag, value and accumulators.
    pub fn reset(&mut self) {
        self.value = 0.0;
        self.is_voter = false;
        self.sigma = 0.0;
        self.hits = 0;
    }

    pub(crate) fn restore(&mut self, value: f64, is_voter: bool, sigma: f64, hits: u64) {
        self.value = value;
        self.is_voter = is_voter;
        self.sigma = sigma;
        self.hits = hits;
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for User {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for User {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

/// A directed trust edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trust {
    source: u64,
    target: u64,
    weight: f64,
}

impl Trust {
    pub(crate) fn new(source: u64, target: u64, weight: f64) -> Self {
        Self {
            source,
            target,
            weight,
        }
    }

    /// Returns the trusting user.
    #[must_use]
    pub fn source(&self) -> u64 {
        self.source
    }

    /// Returns the trusted user.
    #[must_use]
    pub fn target(&self) -> u64 {
        self.target
    }

    /// Returns the trust level.
    #[must_use]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub(crate) fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }
}
