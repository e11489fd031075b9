//! Admission by co-occurrence on short bipartite random walks.
//!
//! Walks alternate user -> random item rated by that user -> random user
//! who rated that item. Every user-to-user hop is counted; a user's
//! admitted neighbors are the `max_edges` users reached most often from it.

use rand::seq::SliceRandom;
use rand::Rng;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::TrustGraph;
use crate::storage::RatingStore;

use super::EdgePolicy;

/// Parameters of the bipartite walk precomputation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BipartiteWalkConfig {
    /// Rounds over the whole item catalogue.
    pub walks_per_item: usize,
    /// User-to-user hops per walk.
    pub walk_length: usize,
    /// Neighbors admitted per user.
    pub max_edges: usize,
}

impl Default for BipartiteWalkConfig {
    fn default() -> Self {
        Self {
            walks_per_item: 5,
            walk_length: 50,
            max_edges: 10,
        }
    }
}

/// Admits only each user's most frequently co-visited neighbors.
#[derive(Debug, Default)]
pub struct RandomWalkBased {
    admitted: FxHashMap<u64, FxHashSet<u64>>,
}

impl RandomWalkBased {
    /// Runs the walks over `store` and keeps the top neighbors per user.
    pub fn precompute<R: Rng>(
        store: &dyn RatingStore,
        config: BipartiteWalkConfig,
        rng: &mut R,
    ) -> Self {
        let counts = count_hops(store, config, rng);
        let admitted = counts
            .into_iter()
            .map(|(user, neighbors)| (user, top_neighbors(neighbors, config.max_edges)))
            .collect();
        Self { admitted }
    }

    /// Returns the admitted neighbors of `user_id`, ascending.
    #[must_use]
    pub fn neighbors_of(&self, user_id: u64) -> Vec<u64> {
        let mut neighbors: Vec<u64> = self
            .admitted
            .get(&user_id)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        neighbors.sort_unstable();
        neighbors
    }
}

impl EdgePolicy for RandomWalkBased {
    fn allowed(&mut self, from: u64, to: u64, _graph: &TrustGraph) -> Result<bool> {
        Ok(self
            .admitted
            .get(&from)
            .is_some_and(|neighbors| neighbors.contains(&to)))
    }
}

fn count_hops<R: Rng>(
    store: &dyn RatingStore,
    config: BipartiteWalkConfig,
    rng: &mut R,
) -> FxHashMap<u64, FxHashMap<u64, u32>> {
    let mut counts: FxHashMap<u64, FxHashMap<u64, u32>> = FxHashMap::default();
    let items = store.item_ids();

    for _ in 0..config.walks_per_item {
        for &item in &items {
            let Some(start) = store.ratings_of_item(item).choose(rng) else {
                continue;
            };
            let mut current = start.user_id;
            for _ in 0..config.walk_length {
                let Some(via) = store.ratings_of_user(current).choose(rng) else {
                    break;
                };
                let Some(next) = store.ratings_of_item(via.item_id).choose(rng) else {
                    break;
                };
                if next.user_id != current {
                    *counts
                        .entry(current)
                        .or_default()
                        .entry(next.user_id)
                        .or_insert(0) += 1;
                }
                current = next.user_id;
            }
        }
    }
    counts
}

/// Keeps the `k` most frequent neighbors, ties broken by lower id.
fn top_neighbors(neighbors: FxHashMap<u64, u32>, k: usize) -> FxHashSet<u64> {
    let mut ranked: Vec<(u64, u32)> = neighbors.into_iter().collect();
    ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.into_iter().take(k).map(|(user, _)| user).collect()
}
