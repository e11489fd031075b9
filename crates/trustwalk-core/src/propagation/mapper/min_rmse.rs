//! Empirical mapper minimizing the per-vote RMSE over co-rated items.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::VotesMapper;
use crate::error::Result;
use crate::graph::TrustGraph;
use crate::propagation::message::{VotesDistributionMessage, MAX_VOTE, MIN_VOTE, SCALE_SIZE};
use crate::storage::{co_rated, RatingStore};

/// What to send when no co-rated item backs a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CluelessStrategy {
    /// Send a clueless message, which aggregation ignores.
    #[default]
    Distribute,
    /// Send the midpoint of the scale.
    MapToMedian,
}

/// Learned mapping per `(source, dest)` pair, indexed by source vote.
type VoteTable = [Option<u8>; SCALE_SIZE];

/// For each trust edge `dest -> source` and each source vote `v`, learns
/// the destination vote `r` minimizing the RMSE between `r` and what
/// `dest` actually rated on the items `source` rated `v`.
#[derive(Debug, Clone)]
pub struct MinRmseMapper {
    tables: FxHashMap<(u64, u64), VoteTable>,
    strategy: CluelessStrategy,
    learned: usize,
    total: usize,
}

impl MinRmseMapper {
    /// Learns mappings for every edge of `graph`.
    ///
    /// Values travel against edge direction: an edge `u -> v` means `u`
    /// trusts `v`, so `v`'s votes are mapped into `u`'s scale.
    ///
    /// # Errors
    ///
    /// Returns `Error::CorruptedData` if the store breaks a co-rating
    /// invariant.
    pub fn build(
        store: &dyn RatingStore,
        graph: &TrustGraph,
        strategy: CluelessStrategy,
    ) -> Result<Self> {
        let mut edges: Vec<(u64, u64)> = graph
            .edges()
            .map(|e| (e.target(), e.source()))
            .collect();
        edges.sort_unstable();

        let mut tables = FxHashMap::with_capacity_and_hasher(edges.len(), Default::default());
        let mut learned = 0;
        for (source, dest) in edges {
            let pairs = co_rated(store, source, dest)?;
            let mut table: VoteTable = [None; SCALE_SIZE];
            for (slot, vote) in table.iter_mut().zip(MIN_VOTE..=MAX_VOTE) {
                let observed: Vec<u8> = pairs
                    .iter()
                    .filter(|p| p.first == vote)
                    .map(|p| p.second)
                    .collect();
                *slot = best_vote(&observed);
                if slot.is_some() {
                    learned += 1;
                }
            }
            tables.insert((source, dest), table);
        }

        let total = tables.len() * SCALE_SIZE;
        tracing::info!(
            edges = tables.len(),
            learned,
            total,
            "Min-RMSE votes mapper built"
        );
        Ok(Self {
            tables,
            strategy,
            learned,
            total,
        })
    }

    /// Percentage of `(edge, vote)` mappings backed by data.
    #[must_use]
    pub fn valuable_mapping_percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)] // Reason: mapping counts stay far below 2^52
        let share = self.learned as f64 / self.total as f64;
        share * 100.0
    }

    /// The configured fallback.
    #[must_use]
    pub fn strategy(&self) -> CluelessStrategy {
        self.strategy
    }

    fn fallback(&self) -> VotesDistributionMessage {
        match self.strategy {
            CluelessStrategy::Distribute => VotesDistributionMessage::clueless(),
            CluelessStrategy::MapToMedian => {
                VotesDistributionMessage::from_vote(MIN_VOTE + (MAX_VOTE - MIN_VOTE) / 2)
            }
        }
    }
}

impl VotesMapper for MinRmseMapper {
    fn map_vote(&self, source: u64, dest: u64, vote: u8) -> VotesDistributionMessage {
        if !(MIN_VOTE..=MAX_VOTE).contains(&vote) {
            return VotesDistributionMessage::clueless();
        }
        self.tables
            .get(&(source, dest))
            .and_then(|table| table[usize::from(vote - MIN_VOTE)])
            .map_or_else(|| self.fallback(), VotesDistributionMessage::from_vote)
    }
}

/// Vote on the scale with the smallest squared error against `observed`.
/// Ties go to the lower vote.
fn best_vote(observed: &[u8]) -> Option<u8> {
    if observed.is_empty() {
        return None;
    }
    (MIN_VOTE..=MAX_VOTE).min_by_key(|&candidate| {
        observed
            .iter()
            .map(|&r| {
                let diff = i64::from(r) - i64::from(candidate);
                diff * diff
            })
            .sum::<i64>()
    })
}
