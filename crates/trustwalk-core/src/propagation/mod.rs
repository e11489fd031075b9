//! Vote propagation engines.
//!
//! Given a trust graph, the known votes for one item and the users whose
//! rating is wanted, an engine fills in a value for every reachable
//! non-voter. Two engines are provided:
//!
//! - [`AveragingEngine`]: iterative weighted averaging over trusted
//!   neighbors, optionally in belief-propagation form that never echoes a
//!   neighbor's own contribution back to it;
//! - [`RandomWalkEngine`]: truncated random walks from the queried users,
//!   backpropagating the vote of the first voter reached.
//!
//! Both spend a [`MessageBudget`]: every delivered message or walk step
//! costs one unit, and the run stops when the budget is spent. Engines take
//! exclusive access to the graph and mutate vertex values in place.

mod averaging;
pub mod mapper;
mod message;
mod random_walk;


use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::TrustGraph;

pub use averaging::{AveragingConfig, AveragingEngine};
pub use message::{VotesDistributionMessage, CLUELESS_VOTE, MAX_VOTE, MIN_VOTE, SCALE_SIZE};
pub use random_walk::{RandomWalkConfig, RandomWalkEngine};

/// Default number of budget units between two progress snapshots.
pub const DEFAULT_REPORT_INTERVAL: u64 = 1_600;

/// Computes recommended values for queried vertices.
pub trait PropagationEngine {
    /// Resets `graph`, applies `votes` and propagates until the budget is
    /// spent or the values settle.
    ///
    /// Queries missing from the graph are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoVoters` if `votes` is empty.
    fn recommend(
        &mut self,
        graph: &mut TrustGraph,
        votes: &HashMap<u64, f64>,
        queries: &[u64],
        progress: &mut dyn ProgressSink,
    ) -> Result<PropagationSummary>;
}

/// Receives periodic snapshots of all vertex values.
pub trait ProgressSink {
    /// Records the current values together with the budget consumed so far.
    fn snapshot(&mut self, graph: &TrustGraph, consumed: u64);
}

/// Discards every snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn snapshot(&mut self, _graph: &TrustGraph, _consumed: u64) {}
}

/// Outcome of one propagation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationSummary {
    /// Configured budget.
    pub budget: u64,
    /// Units spent.
    pub consumed: u64,
    /// Averaging rounds or random walks performed.
    pub iterations: u64,
    /// True if values settled before the budget ran out.
    pub converged: bool,
    /// Queries absent from the graph.
    pub skipped_queries: usize,
}

/// Finite supply of message deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageBudget {
    limit: u64,
    consumed: u64,
}

impl MessageBudget {
    /// Creates a budget of `limit` units.
    #[must_use]
    pub fn new(limit: u64) -> Self {
        Self { limit, consumed: 0 }
    }

    /// Spends one unit. Returns false, spending nothing, once exhausted.
    pub fn try_consume(&mut self) -> bool {
        if self.consumed >= self.limit {
            return false;
        }
        self.consumed += 1;
        true
    }

    /// Units spent so far.
    #[must_use]
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Units left.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.limit - self.consumed
    }

    /// The configured limit.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Returns true when nothing is left.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.consumed >= self.limit
    }
}

/// Periodic snapshot trigger shared by both engines.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ReportSchedule {
    interval: u64,
}

impl ReportSchedule {
    pub(crate) fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
        }
    }

    pub(crate) fn after_consume(
        self,
        graph: &TrustGraph,
        budget: &MessageBudget,
        progress: &mut dyn ProgressSink,
    ) {
        if budget.consumed() % self.interval == 0 {
            tracing::debug!(consumed = budget.consumed(), "Propagation progress");
            progress.snapshot(graph, budget.consumed());
        }
    }
}

/// Resets the graph and marks voters. Fails on an empty votes map.
pub(crate) fn apply_votes(graph: &mut TrustGraph, votes: &HashMap<u64, f64>) -> Result<()> {
    if votes.is_empty() {
        return Err(Error::NoVoters);
    }
    graph.reset_values();
    for (&user_id, &vote) in votes {
        match graph.vertex_mut(user_id) {
            Some(user) => user.set_vote(vote),
            None => tracing::debug!(user_id, "Voter not in trust graph, ignored"),
        }
    }
    Ok(())
}

/// Keeps the queries present in the graph, warning about the others.
pub(crate) fn present_queries(graph: &TrustGraph, queries: &[u64]) -> (Vec<u64>, usize) {
    let mut present = Vec::with_capacity(queries.len());
    let mut skipped = 0;
    for &user_id in queries {
        if graph.contains_vertex(user_id) {
            present.push(user_id);
        } else {
            skipped += 1;
            tracing::warn!(user_id, "Queried user not in trust graph, skipped");
        }
    }
    (present, skipped)
}
