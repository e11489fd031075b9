//! Truncated random walks with backpropagation.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::{
    apply_votes, present_queries, MessageBudget, ProgressSink, PropagationEngine,
    PropagationSummary, ReportSchedule, DEFAULT_REPORT_INTERVAL,
};
use crate::error::Result;
use crate::graph::{TrustGraph, User};
use crate::walk::{BoundedSteps, WalkEvent, WalkPath, WeightedRandomWalk};

/// Settings for [`RandomWalkEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomWalkConfig {
    /// Maximum number of walk steps plus backpropagation updates.
    pub budget: u64,
    /// Pick edges proportionally to their trust instead of uniformly.
    pub weighted: bool,
    /// Budget units between two progress snapshots.
    pub report_interval: u64,
}

impl Default for RandomWalkConfig {
    fn default() -> Self {
        Self {
            budget: 100_000,
            weighted: true,
            report_interval: DEFAULT_REPORT_INTERVAL,
        }
    }
}

/// Estimates each query's value as the mean vote reached by random walks.
///
/// Queries are served least-hits first. From the chosen query a bounded
/// walk follows trust edges until it meets a voter, gets stuck on a sink
/// or runs out of steps. When it meets a voter, that vote is folded into
/// the running mean of every vertex on the way back to the query.
///
/// Each walk step and each backpropagation update costs one budget unit.
/// A walk is allowed `remaining budget / vertex count` steps, at least one.
#[derive(Debug)]
pub struct RandomWalkEngine {
    config: RandomWalkConfig,
    rng: StdRng,
}

impl RandomWalkEngine {
    /// Creates an engine seeded from system entropy.
    #[must_use]
    pub fn new(config: RandomWalkConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a reproducible engine.
    #[must_use]
    pub fn with_seed(config: RandomWalkConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &RandomWalkConfig {
        &self.config
    }

    /// Runs one walk from `source` and backpropagates on success.
    ///
    /// Returns the vote that was reached, if any.
    fn walk_once(
        &mut self,
        graph: &mut TrustGraph,
        source: u64,
        steps: usize,
        budget: &mut MessageBudget,
        schedule: ReportSchedule,
        progress: &mut dyn ProgressSink,
    ) -> Result<Option<f64>> {
        let mut path = WalkPath::new(source);
        let reached = {
            let view: &TrustGraph = graph;
            let mut walk =
                WeightedRandomWalk::new(view, source, BoundedSteps::new(steps), &mut self.rng)?;
            if !self.config.weighted {
                walk = walk.unweighted();
            }

            let mut reached = None;
            while let Some(event) = walk.step() {
                if !budget.try_consume() {
                    break;
                }
                schedule.after_consume(view, budget, progress);
                match event {
                    WalkEvent::Vertex {
                        vertex,
                        edge: Some(edge),
                    } => {
                        path.push(edge);
                        if let Some(voter) = view.vertex(vertex).filter(|u| u.is_voter()) {
                            reached = Some(voter.value());
                            break;
                        }
                    }
                    WalkEvent::Vertex { edge: None, .. } | WalkEvent::Sink { .. } => break,
                }
            }
            reached
        };

        let Some(vote) = reached else {
            return Ok(None);
        };
        for element in path.backtrack() {
            if !budget.try_consume() {
                break;
            }
            if let Some(user) = graph.vertex_mut(element.vertex) {
                user.record_vote(vote);
            }
            schedule.after_consume(graph, budget, progress);
        }
        Ok(Some(vote))
    }
}

impl PropagationEngine for RandomWalkEngine {
    fn recommend(
        &mut self,
        graph: &mut TrustGraph,
        votes: &HashMap<u64, f64>,
        queries: &[u64],
        progress: &mut dyn ProgressSink,
    ) -> Result<PropagationSummary> {
        apply_votes(graph, votes)?;
        let (present, skipped_queries) = present_queries(graph, queries);
        let sources: Vec<u64> = present
            .into_iter()
            .filter(|&id| graph.vertex(id).is_some_and(|u| !u.is_voter()))
            .collect();

        let mut budget = MessageBudget::new(self.config.budget);
        let mut summary = PropagationSummary {
            budget: budget.limit(),
            skipped_queries,
            ..PropagationSummary::default()
        };
        if sources.is_empty() {
            tracing::debug!("No non-voting query to walk from");
            progress.snapshot(graph, 0);
            return Ok(summary);
        }

        let schedule = ReportSchedule::new(self.config.report_interval);
        let vertex_count = u64::try_from(graph.vertex_count()).unwrap_or(u64::MAX).max(1);

        // Min-heap on (hits, insertion sequence): least served first, FIFO
        // among equals. Entries go stale when backpropagation through another
        // walk raises a query's hits; they are re-keyed on pop.
        let mut queue: BinaryHeap<Reverse<(u64, u64, u64)>> = BinaryHeap::new();
        let mut sequence = 0u64;
        for &source in &sources {
            queue.push(Reverse((0, sequence, source)));
            sequence += 1;
        }

        let mut reached = 0u64;
        while !budget.is_exhausted() {
            let Some(Reverse((hits, _, source))) = queue.pop() else {
                break;
            };
            let current_hits = graph.vertex(source).map_or(hits, User::hits);
            if current_hits != hits {
                queue.push(Reverse((current_hits, sequence, source)));
                sequence += 1;
                continue;
            }

            let steps = usize::try_from((budget.remaining() / vertex_count).max(1))
                .unwrap_or(usize::MAX);
            if self
                .walk_once(graph, source, steps, &mut budget, schedule, progress)?
                .is_some()
            {
                reached += 1;
            }
            summary.iterations += 1;

            let hits = graph.vertex(source).map_or(0, User::hits);
            queue.push(Reverse((hits, sequence, source)));
            sequence += 1;
        }

        summary.consumed = budget.consumed();
        progress.snapshot(graph, budget.consumed());
        tracing::debug!(
            walks = summary.iterations,
            reached,
            consumed = summary.consumed,
            "Random walk propagation finished"
        );
        Ok(summary)
    }
}
