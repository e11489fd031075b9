//! Iterative neighbor averaging and its belief-propagation variant.

use std::collections::HashMap;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use super::mapper::VotesMapper;
use super::{
    apply_votes, present_queries, MessageBudget, ProgressSink, PropagationEngine,
    PropagationSummary, ReportSchedule, DEFAULT_REPORT_INTERVAL,
};
use crate::error::{Error, Result};
use crate::graph::{Trust, TrustGraph, User};

/// Settings for [`AveragingEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AveragingConfig {
    /// Maximum number of delivered messages.
    pub budget: u64,
    /// Weight each neighbor by its trust level instead of equally.
    pub weighted: bool,
    /// Never send a vertex's own contribution straight back to it.
    pub belief_propagation: bool,
    /// Values closer than this count as unchanged.
    pub epsilon: f64,
    /// Budget units between two progress snapshots.
    pub report_interval: u64,
}

impl Default for AveragingConfig {
    fn default() -> Self {
        Self {
            budget: 100_000,
            weighted: true,
            belief_propagation: false,
            epsilon: 1e-9,
            report_interval: DEFAULT_REPORT_INTERVAL,
        }
    }
}

/// Propagates votes by repeatedly averaging the values of trusted
/// neighbors.
///
/// Each round visits the non-voters in ascending id order and updates them
/// in place, so later vertices already see this round's values. A vertex
/// `u` listens to every `v` it trusts (edge `u -> v`). Neighbors that have
/// no value yet, voters aside, send nothing.
///
/// With `belief_propagation` set, values travel as per-edge messages: the
/// message `v -> u` aggregates what `v` heard from everyone except `u`.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use trustwalk_core::graph::TrustGraph;
/// use trustwalk_core::propagation::{
///     AveragingConfig, AveragingEngine, NoProgress, PropagationEngine,
/// };
///
/// let mut graph = TrustGraph::new();
/// graph.add_vertex(1);
/// graph.add_vertex(2);
/// graph.add_edge(2, 1, 1.0)?;
///
/// let mut engine = AveragingEngine::new(AveragingConfig::default())?;
/// let votes = HashMap::from([(1, 4.0)]);
/// engine.recommend(&mut graph, &votes, &[2], &mut NoProgress)?;
///
/// assert_eq!(graph.vertex(2).map(|u| u.value()), Some(4.0));
/// # Ok::<(), trustwalk_core::Error>(())
/// ```
pub struct AveragingEngine {
    config: AveragingConfig,
    mapper: Option<Arc<dyn VotesMapper>>,
}

impl std::fmt::Debug for AveragingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AveragingEngine")
            .field("config", &self.config)
            .field("mapped", &self.mapper.is_some())
            .finish()
    }
}

impl AveragingEngine {
    /// Creates an engine sending raw neighbor values.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` unless `epsilon` is finite and
    /// strictly positive.
    pub fn new(config: AveragingConfig) -> Result<Self> {
        if !config.epsilon.is_finite() || config.epsilon <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "averaging epsilon must be > 0, got {}",
                config.epsilon
            )));
        }
        Ok(Self {
            config,
            mapper: None,
        })
    }

    /// Passes every message through `mapper`.
    #[must_use]
    pub fn with_mapper(mut self, mapper: Arc<dyn VotesMapper>) -> Self {
        self.mapper = Some(mapper);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &AveragingConfig {
        &self.config
    }

    /// Value `source` sends to `dest`, `None` if the mapper has no clue.
    fn message(&self, source: u64, dest: u64, value: f64) -> Option<f64> {
        match &self.mapper {
            None => Some(value),
            Some(mapper) => mapper.map_value(source, dest, value).expected_value(),
        }
    }

    fn weight(&self, edge: &Trust) -> f64 {
        if self.config.weighted {
            edge.weight()
        } else {
            1.0
        }
    }

    /// Returns `(rounds, converged)`.
    fn average(
        &self,
        graph: &mut TrustGraph,
        budget: &mut MessageBudget,
        schedule: ReportSchedule,
        progress: &mut dyn ProgressSink,
    ) -> (u64, bool) {
        let targets = non_voters(graph);
        let mut informed: FxHashSet<u64> = graph
            .vertices()
            .filter(|u| u.is_voter())
            .map(User::id)
            .collect();

        let mut rounds = 0;
        loop {
            rounds += 1;
            let mut changed = false;
            for &target in &targets {
                let neighbors: Vec<Trust> = graph.outgoing(target).copied().collect();
                let mut sum = 0.0;
                let mut total_weight = 0.0;
                for edge in &neighbors {
                    let neighbor = edge.target();
                    if !informed.contains(&neighbor) {
                        continue;
                    }
                    if !budget.try_consume() {
                        return (rounds, false);
                    }
                    schedule.after_consume(graph, budget, progress);

                    let value = graph.vertex(neighbor).map_or(0.0, User::value);
                    if let Some(message) = self.message(neighbor, target, value) {
                        let weight = self.weight(edge);
                        sum += weight * message;
                        total_weight += weight;
                    }
                }
                if total_weight > 0.0 {
                    changed |= self.update(graph, &mut informed, target, sum / total_weight);
                }
            }
            if !changed {
                return (rounds, true);
            }
        }
    }

    /// Returns `(rounds, converged)`.
    fn belief_propagation(
        &self,
        graph: &mut TrustGraph,
        budget: &mut MessageBudget,
        schedule: ReportSchedule,
        progress: &mut dyn ProgressSink,
    ) -> (u64, bool) {
        let targets = non_voters(graph);
        let mut informed = FxHashSet::default();
        // (sender, receiver) -> value in the sender's frame.
        let mut messages: FxHashMap<(u64, u64), f64> = FxHashMap::default();

        let mut rounds = 0;
        loop {
            rounds += 1;
            let mut next = FxHashMap::with_capacity_and_hasher(messages.len(), Default::default());
            for &target in &targets {
                let neighbors: Vec<u64> = graph.outgoing(target).map(Trust::target).collect();
                for neighbor in neighbors {
                    let outgoing = match graph.vertex(neighbor) {
                        Some(user) if user.is_voter() => Some(user.value()),
                        Some(_) => self.aggregate(graph, &messages, neighbor, Some(target)),
                        None => None,
                    };
                    let Some(value) = outgoing else { continue };
                    if !budget.try_consume() {
                        return (rounds, false);
                    }
                    schedule.after_consume(graph, budget, progress);
                    next.insert((neighbor, target), value);
                }
            }

            let changed = next.len() != messages.len()
                || next.iter().any(|(key, value)| {
                    messages
                        .get(key)
                        .is_none_or(|old| (old - value).abs() > self.config.epsilon)
                });
            messages = next;

            for &target in &targets {
                if let Some(belief) = self.aggregate(graph, &messages, target, None) {
                    self.update(graph, &mut informed, target, belief);
                }
            }
            if !changed {
                return (rounds, true);
            }
        }
    }

    /// Weighted mean of the messages `receiver` holds from the vertices it
    /// trusts, skipping `exclude`.
    fn aggregate(
        &self,
        graph: &TrustGraph,
        messages: &FxHashMap<(u64, u64), f64>,
        receiver: u64,
        exclude: Option<u64>,
    ) -> Option<f64> {
        let mut sum = 0.0;
        let mut total_weight = 0.0;
        for edge in graph.outgoing(receiver) {
            let sender = edge.target();
            if exclude == Some(sender) {
                continue;
            }
            let Some(&raw) = messages.get(&(sender, receiver)) else {
                continue;
            };
            if let Some(value) = self.message(sender, receiver, raw) {
                let weight = self.weight(edge);
                sum += weight * value;
                total_weight += weight;
            }
        }
        (total_weight > 0.0).then(|| sum / total_weight)
    }

    /// Writes a new value; returns true if it counts as a change.
    fn update(
        &self,
        graph: &mut TrustGraph,
        informed: &mut FxHashSet<u64>,
        target: u64,
        value: f64,
    ) -> bool {
        let Some(user) = graph.vertex_mut(target) else {
            return false;
        };
        let first = informed.insert(target);
        let changed = first || (user.value() - value).abs() > self.config.epsilon;
        user.set_value(value);
        changed
    }
}

impl PropagationEngine for AveragingEngine {
    fn recommend(
        &mut self,
        graph: &mut TrustGraph,
        votes: &HashMap<u64, f64>,
        queries: &[u64],
        progress: &mut dyn ProgressSink,
    ) -> Result<PropagationSummary> {
        apply_votes(graph, votes)?;
        let (_, skipped_queries) = present_queries(graph, queries);

        let mut budget = MessageBudget::new(self.config.budget);
        let schedule = ReportSchedule::new(self.config.report_interval);
        let (iterations, converged) = if self.config.belief_propagation {
            self.belief_propagation(graph, &mut budget, schedule, progress)
        } else {
            self.average(graph, &mut budget, schedule, progress)
        };
        progress.snapshot(graph, budget.consumed());

        tracing::debug!(
            rounds = iterations,
            consumed = budget.consumed(),
            converged,
            belief_propagation = self.config.belief_propagation,
            "Averaging propagation finished"
        );
        Ok(PropagationSummary {
            budget: budget.limit(),
            consumed: budget.consumed(),
            iterations,
            converged,
            skipped_queries,
        })
    }
}

fn non_voters(graph: &TrustGraph) -> Vec<u64> {
    graph
        .vertices()
        .filter(|u| !u.is_voter())
        .map(User::id)
        .collect()
}
