//! Read-only access to rating histories.
//!
//! The graph builder, trust metrics and mappers never own rating data:
//! they borrow it through the [`RatingStore`] trait. [`InMemoryRatingStore`]
//! is the reference implementation used by tests and small datasets.
//!
//! Per-user histories are kept sorted by item id so that co-rated items
//! can be located by binary search.

use std::collections::HashMap;
use std::io;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single rating as read from the input dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RatingEvent {
    /// Rated item.
    pub item_id: u64,
    /// Rating user.
    pub user_id: u64,
    /// Rating on the discrete scale.
    pub rating: u8,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
}

impl RatingEvent {
    /// Creates a new rating event.
    #[must_use]
    pub fn new(item_id: u64, user_id: u64, rating: u8, timestamp: u64) -> Self {
        Self {
            item_id,
            user_id,
            rating,
            timestamp,
        }
    }
}

/// Owned stream of rating events handed to the builder's producer thread.
///
/// A read failure (`Err`) ends the stream.
pub type RatingStream = Box<dyn Iterator<Item = io::Result<RatingEvent>> + Send>;

/// Read interface over the rating-history storage.
pub trait RatingStore: Send + Sync {
    /// Returns every rating event in storage order.
    fn rating_event_stream(&self) -> RatingStream;

    /// Returns the ratings given by `user_id`, sorted by item id.
    fn ratings_of_user(&self, user_id: u64) -> &[RatingEvent];

    /// Returns the ratings received by `item_id`.
    fn ratings_of_item(&self, item_id: u64) -> &[RatingEvent];

    /// Returns all user ids, ascending.
    fn user_ids(&self) -> Vec<u64>;

    /// Returns all item ids, ascending.
    fn item_ids(&self) -> Vec<u64>;
}

/// Summary statistics over one user's ratings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingStats {
    /// Number of ratings.
    pub count: usize,
    /// Mean rating.
    pub mean: f64,
    /// Lowest rating given.
    pub min: u8,
    /// Highest rating given.
    pub max: u8,
}

#[derive(Debug, Default)]
struct UserHistory {
    ratings: Vec<RatingEvent>,
    rating_sum: u32,
    squared_sum: u32,
    min: u8,
    max: u8,
}

impl UserHistory {
    fn accumulate(&mut self, event: RatingEvent) -> Result<()> {
        let rating = u32::from(event.rating);
        let rating_sum = self.rating_sum.checked_add(rating).ok_or_else(|| {
            Error::ValueOverflow(format!("rating sum of user {}", event.user_id))
        })?;
        let squared_sum = self
            .squared_sum
            .checked_add(rating * rating)
            .ok_or_else(|| {
                Error::ValueOverflow(format!("squared rating sum of user {}", event.user_id))
            })?;
        self.rating_sum = rating_sum;
        self.squared_sum = squared_sum;
        if self.ratings.is_empty() {
            self.min = event.rating;
            self.max = event.rating;
        } else {
            self.min = self.min.min(event.rating);
            self.max = self.max.max(event.rating);
        }
        let pos = self
            .ratings
            .partition_point(|r| r.item_id <= event.item_id);
        self.ratings.insert(pos, event);
        Ok(())
    }
}

/// Rating store held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryRatingStore {
    events: Vec<RatingEvent>,
    by_user: HashMap<u64, UserHistory>,
    by_item: HashMap<u64, Vec<RatingEvent>>,
}

impl InMemoryRatingStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a sequence of events.
    ///
    /// # Errors
    ///
    /// Returns `Error::ValueOverflow` if a user's accumulators overflow.
    pub fn from_events<I>(events: I) -> Result<Self>
    where
        I: IntoIterator<Item = RatingEvent>,
    {
        let mut store = Self::new();
        for event in events {
            store.insert(event)?;
        }
        Ok(store)
    }

    /// Adds one event.
    ///
    /// # Errors
    ///
    /// Returns `Error::ValueOverflow` if the user's rating sum or squared
    /// rating sum would overflow. The store is left unchanged in that case.
    pub fn insert(&mut self, event: RatingEvent) -> Result<()> {
        match self.by_user.get_mut(&event.user_id) {
            Some(history) => history.accumulate(event)?,
            None => {
                let mut history = UserHistory::default();
                history.accumulate(event)?;
                self.by_user.insert(event.user_id, history);
            }
        }
        self.by_item.entry(event.item_id).or_default().push(event);
        self.events.push(event);
        Ok(())
    }

    /// Returns the number of stored events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if no event is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns rating statistics for a user, if the user rated anything.
    #[must_use]
    pub fn user_stats(&self, user_id: u64) -> Option<RatingStats> {
        let history = self.by_user.get(&user_id)?;
        let count = history.ratings.len();
        #[allow(clippy::cast_precision_loss)] // Reason: rating counts are far below 2^52
        let mean = f64::from(history.rating_sum) / count as f64;
        Some(RatingStats {
            count,
            mean,
            min: history.min,
            max: history.max,
        })
    }

    /// Returns the squared rating sum accumulated for a user.
    #[must_use]
    pub fn squared_rating_sum(&self, user_id: u64) -> Option<u32> {
        self.by_user.get(&user_id).map(|h| h.squared_sum)
    }
}

impl RatingStore for InMemoryRatingStore {
    fn rating_event_stream(&self) -> RatingStream {
        Box::new(self.events.clone().into_iter().map(Ok))
    }

    fn ratings_of_user(&self, user_id: u64) -> &[RatingEvent] {
        self.by_user
            .get(&user_id)
            .map(|h| h.ratings.as_slice())
            .unwrap_or_default()
    }

    fn ratings_of_item(&self, item_id: u64) -> &[RatingEvent] {
        self.by_item
            .get(&item_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn user_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.by_user.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn item_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.by_item.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// One item rated by both users of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoRating {
    /// Shared item.
    pub item_id: u64,
    /// Rating given by the first user.
    pub first: u8,
    /// Rating given by the second user.
    pub second: u8,
}

/// Pairs the items rated by both `first` and `second`.
///
/// The co-rated set is computed from each user's side independently and
/// the two sides must agree in size and in item order.
///
/// # Errors
///
/// Returns `Error::CorruptedData` when the two sides disagree, which can
/// only happen if the store returned inconsistent histories.
pub fn co_rated(store: &dyn RatingStore, first: u64, second: u64) -> Result<Vec<CoRating>> {
    let a = store.ratings_of_user(first);
    let b = store.ratings_of_user(second);
    let from_a = shared_side(a, b);
    let from_b = shared_side(b, a);

    if from_a.len() != from_b.len() {
        return Err(Error::CorruptedData(format!(
            "users {first} and {second} report {} and {} co-rated items",
            from_a.len(),
            from_b.len()
        )));
    }

    from_a
        .iter()
        .zip(&from_b)
        .map(|(ra, rb)| {
            if ra.item_id != rb.item_id {
                return Err(Error::CorruptedData(format!(
                    "item id mismatch {} != {} while pairing users {first} and {second}",
                    ra.item_id, rb.item_id
                )));
            }
            Ok(CoRating {
                item_id: ra.item_id,
                first: ra.rating,
                second: rb.rating,
            })
        })
        .collect()
}

/// Ratings of `own` whose item also appears in `other`, in item order.
fn shared_side<'a>(own: &'a [RatingEvent], other: &[RatingEvent]) -> Vec<&'a RatingEvent> {
    let mut shared: Vec<&RatingEvent> = own
        .iter()
        .filter(|r| {
            other
                .binary_search_by_key(&r.item_id, |o| o.item_id)
                .is_ok()
        })
        .collect();
    shared.sort_by_key(|r| r.item_id);
    shared
}

/// Rounds the mean of several ratings into a single vote.
///
/// Returns `None` for an empty slice.
#[must_use]
pub fn average_vote(ratings: &[RatingEvent]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: u64 = ratings.iter().map(|r| u64::from(r.rating)).sum();
    #[allow(clippy::cast_precision_loss)] // Reason: bounded by 255 * rating count
    let mean = sum as f64 / ratings.len() as f64;
    Some(mean.round())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> InMemoryRatingStore {
        InMemoryRatingStore::from_events([
            RatingEvent::new(10, 1, 5, 0),
            RatingEvent::new(11, 1, 3, 0),
            RatingEvent::new(12, 1, 1, 0),
            RatingEvent::new(12, 2, 2, 0),
            RatingEvent::new(10, 2, 4, 0),
            RatingEvent::new(13, 2, 4, 0),
        ])
        .unwrap()
    }

    #[test]
    fn test_user_history_sorted_by_item() {
        let store = sample_store();
        let items: Vec<u64> = store.ratings_of_user(2).iter().map(|r| r.item_id).collect();
        assert_eq!(items, vec![10, 12, 13]);
    }

    #[test]
    fn test_user_stats() {
        let store = sample_store();
        let stats = store.user_stats(1).unwrap();
        assert_eq!(stats.count, 3);
        assert!((stats.mean - 3.0).abs() < f64::EPSILON);
        assert_eq!((stats.min, stats.max), (1, 5));
        assert_eq!(store.squared_rating_sum(1), Some(25 + 9 + 1));
        assert!(store.user_stats(99).is_none());
    }

    #[test]
    fn test_co_rated_pairs_in_item_order() {
        let store = sample_store();
        let pairs = co_rated(&store, 1, 2).unwrap();
        assert_eq!(
            pairs,
            vec![
                CoRating { item_id: 10, first: 5, second: 4 },
                CoRating { item_id: 12, first: 1, second: 2 },
            ]
        );
    }

    #[test]
    fn test_co_rated_detects_duplicate_ratings() {
        // A user rating the same item twice makes the two sides disagree.
        let store = InMemoryRatingStore::from_events([
            RatingEvent::new(10, 1, 5, 0),
            RatingEvent::new(10, 1, 4, 1),
            RatingEvent::new(10, 2, 4, 0),
        ])
        .unwrap();
        let err = co_rated(&store, 1, 2).unwrap_err();
        assert!(matches!(err, Error::CorruptedData(_)));
    }

    #[test]
    fn test_unknown_user_has_empty_history() {
        let store = sample_store();
        assert!(store.ratings_of_user(42).is_empty());
        assert!(co_rated(&store, 1, 42).unwrap().is_empty());
    }

    #[test]
    fn test_overflow_is_fatal() {
        let mut store = InMemoryRatingStore::new();
        let mut result = Ok(());
        // 255^2 * 66_052 exceeds u32::MAX, the squared sum overflows first.
        for item in 0..70_000u64 {
            result = store.insert(RatingEvent::new(item, 1, 255, 0));
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(Error::ValueOverflow(_))));
    }

    #[test]
    fn test_average_vote_rounds() {
        let events = [
            RatingEvent::new(1, 1, 4, 0),
            RatingEvent::new(1, 2, 5, 0),
        ];
        assert_eq!(average_vote(&events), Some(5.0));
        assert_eq!(average_vote(&[]), None);
    }

    #[test]
    fn test_stream_replays_all_events() {
        let store = sample_store();
        let streamed: Vec<RatingEvent> = store
            .rating_event_stream()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(streamed.len(), store.len());
    }
}
