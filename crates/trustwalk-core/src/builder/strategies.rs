//! Edge generation over a complete vertex set.

use std::cmp::Ordering;

use rand::Rng;

use crate::error::Result;
use crate::graph::TrustGraph;
use crate::policy::{EdgePolicy, MinimumTotalTrust, MinimumTrust};
use crate::storage::RatingStore;
use crate::trust::{SharedTrustMetric, TrustMetric};

use super::BuildStats;

/// Offers every ordered pair to `policy`. O(V²) evaluations.
pub(super) fn brute_force(
    graph: &mut TrustGraph,
    metric: &dyn TrustMetric,
    policy: &mut dyn EdgePolicy,
    stats: &mut BuildStats,
) -> Result<()> {
    let ids = graph.vertex_ids();
    for &from in &ids {
        for &to in &ids {
            if from == to {
                continue;
            }
            stats.policy_evaluations += 1;
            if !policy.allowed(from, to, graph)? {
                stats.policy_rejections += 1;
                continue;
            }
            let trust = metric.trust(from, to)?;
            if trust > 0.0 {
                graph.add_edge(from, to, trust)?;
            } else {
                stats.non_positive_trust += 1;
            }
        }
    }
    Ok(())
}

/// Greedy per-source admission over candidates sorted by trust.
pub(super) fn best_of_breed(
    graph: &mut TrustGraph,
    metric: &SharedTrustMetric,
    percent_of_total_trust: f64,
    min_trust: f64,
    stats: &mut BuildStats,
) -> Result<()> {
    let ids = graph.vertex_ids();
    for &from in &ids {
        let mut ranked = Vec::with_capacity(ids.len().saturating_sub(1));
        let mut total = 0.0;
        for &to in &ids {
            if to != from {
                let trust = metric.trust(from, to)?;
                total += trust;
                ranked.push((to, trust));
            }
        }
        ranked.sort_by(|a, b| descending_trust(*a, *b));

        let threshold = total * percent_of_total_trust / 100.0;
        let mut policy = MinimumTotalTrust::for_source(from, metric.clone(), threshold)
            .and(MinimumTrust::new(metric.clone(), min_trust));

        for (to, trust) in ranked {
            stats.policy_evaluations += 1;
            if !policy.allowed(from, to, graph)? {
                stats.policy_rejections += 1;
                break;
            }
            if trust <= 0.0 {
                stats.non_positive_trust += 1;
                break;
            }
            graph.add_edge(from, to, trust)?;
        }
    }
    Ok(())
}

fn descending_trust(a: (u64, f64), b: (u64, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}

#[derive(Debug, Clone, Copy)]
pub(super) struct ScaleFreeParams {
    pub scaling_factor: u64,
    pub bidirectional: bool,
    pub max_rounds: usize,
}

/// Preferential attachment by rating volume.
///
/// Vertices are placed in descending volume order. Each new vertex samples
/// the already placed ones: the first candidate of a round is always tried,
/// every later one with probability proportional to
/// `volume(existing) * volume(new)`. Rounds repeat until an edge with
/// positive trust is added or `max_rounds` is reached.
pub(super) fn scale_free<R: Rng>(
    graph: &mut TrustGraph,
    store: &dyn RatingStore,
    metric: &dyn TrustMetric,
    params: ScaleFreeParams,
    rng: &mut R,
    stats: &mut BuildStats,
) -> Result<()> {
    let mut order: Vec<(u64, u64)> = graph
        .vertex_ids()
        .into_iter()
        .map(|id| (id, store.ratings_of_user(id).len() as u64))
        .collect();
    order.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    if order.len() < 2 {
        return Ok(());
    }

    let normalizer = order[0].1.saturating_mul(order[1].1);
    let range = (normalizer / params.scaling_factor.max(1)).max(1);

    let mut placed: Vec<(u64, u64)> = Vec::with_capacity(order.len());
    placed.push(order[0]);

    for &(new, new_volume) in &order[1..] {
        let mut connected = false;
        for _ in 0..params.max_rounds {
            let mut volume_sum = 0u64;
            for &(existing, volume) in &placed {
                let sampled = volume_sum == 0
                    || rng.gen_range(0..range) <= volume.saturating_mul(new_volume);
                if !sampled {
                    continue;
                }
                volume_sum = volume_sum.saturating_add(volume);
                stats.policy_evaluations += 1;
                if params.bidirectional {
                    connected |= attach(graph, metric, existing, new, stats)?;
                    connected |= attach(graph, metric, new, existing, stats)?;
                } else if rng.gen_bool(0.5) {
                    connected |= attach(graph, metric, new, existing, stats)?;
                } else {
                    connected |= attach(graph, metric, existing, new, stats)?;
                }
            }
            if connected {
                break;
            }
        }
        if !connected {
            stats.unattached += 1;
            tracing::warn!(
                user_id = new,
                rounds = params.max_rounds,
                "No positive trust towards placed vertices, vertex left unattached"
            );
        }
        placed.push((new, new_volume));
    }
    Ok(())
}

fn attach(
    graph: &mut TrustGraph,
    metric: &dyn TrustMetric,
    from: u64,
    to: u64,
    stats: &mut BuildStats,
) -> Result<bool> {
    if graph.has_edge(from, to) {
        return Ok(false);
    }
    let trust = metric.trust(from, to)?;
    if trust > 0.0 {
        graph.add_edge(from, to, trust)?;
        Ok(true)
    } else {
        stats.non_positive_trust += 1;
        Ok(false)
    }
}
