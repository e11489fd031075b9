//! Concurrent trust-graph construction.
//!
//! [`GraphBuilder`] runs a two-thread pipeline:
//!
//! 1. a producer thread drains the rating stream into a bounded channel
//!    (it blocks when the channel is full) and closes it with
//!    [`Feed::EndOfStream`];
//! 2. a consumer thread creates one vertex per distinct user, then runs
//!    the configured [`EdgeStrategy`] over the complete vertex set.
//!
//! The caller gets a [`BuildHandle`] that resolves once the consumer has
//! finished both phases. A stream read error ends the stream early; a
//! channel disconnect aborts the run with `Error::PipelineAborted`.

mod strategies;


use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{Error, Result};
use crate::graph::TrustGraph;
use crate::policy::PolicyChain;
use crate::storage::{RatingEvent, RatingStore, RatingStream};
use crate::trust::SharedTrustMetric;

/// Default capacity of the producer/consumer channel.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// Message on the producer/consumer channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    /// One rating event.
    Event(RatingEvent),
    /// No more events follow.
    EndOfStream,
}

/// How edges are generated once all vertices exist.
pub enum EdgeStrategy {
    /// Every ordered pair is offered to the policy; admitted pairs get the
    /// metric's trust as weight.
    BruteForce(PolicyChain),
    /// Per source, candidates sorted by descending trust are admitted until
    /// the accumulated trust reaches `percent_of_total_trust` percent of the
    /// source's total, or a candidate's trust drops below `min_trust`.
    BestOfBreed {
        /// Share of the source's total trust to keep, in percent.
        percent_of_total_trust: f64,
        /// Smallest admissible trust.
        min_trust: f64,
    },
    /// Preferential attachment in descending order of rating volume.
    ScaleFree {
        /// Divides the sampling range; larger values attach more eagerly.
        scaling_factor: u64,
        /// Add both directions for every accepted pair.
        bidirectional: bool,
        /// Sampling rounds per vertex before giving up on connecting it.
        max_rounds: usize,
    },
}

impl std::fmt::Debug for EdgeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BruteForce(chain) => f.debug_tuple("BruteForce").field(chain).finish(),
            Self::BestOfBreed {
                percent_of_total_trust,
                min_trust,
            } => f
                .debug_struct("BestOfBreed")
                .field("percent_of_total_trust", percent_of_total_trust)
                .field("min_trust", min_trust)
                .finish(),
            Self::ScaleFree {
                scaling_factor,
                bidirectional,
                max_rounds,
            } => f
                .debug_struct("ScaleFree")
                .field("scaling_factor", scaling_factor)
                .field("bidirectional", bidirectional)
                .field("max_rounds", max_rounds)
                .finish(),
        }
    }
}

/// Counters collected during one build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Rating events received by the consumer.
    pub events_consumed: u64,
    /// Distinct users seen.
    pub vertices: usize,
    /// Edges added.
    pub edges_added: usize,
    /// Candidate edges offered to a policy.
    pub policy_evaluations: u64,
    /// Candidates rejected by a policy.
    pub policy_rejections: u64,
    /// Candidates admitted by a policy but scored `<= 0` by the metric.
    pub non_positive_trust: u64,
    /// Scale-free vertices that could not be attached.
    pub unattached: usize,
}

/// A finished build.
#[derive(Debug)]
pub struct BuildOutcome {
    /// The constructed graph.
    pub graph: TrustGraph,
    /// Build counters.
    pub stats: BuildStats,
}

/// Builds a [`TrustGraph`] from a rating stream on two worker threads.
pub struct GraphBuilder {
    store: Arc<dyn RatingStore>,
    metric: SharedTrustMetric,
    strategy: EdgeStrategy,
    queue_capacity: usize,
    seed: Option<u64>,
}

impl GraphBuilder {
    /// Creates a builder scoring edges with `metric`.
    #[must_use]
    pub fn new(
        store: Arc<dyn RatingStore>,
        metric: SharedTrustMetric,
        strategy: EdgeStrategy,
    ) -> Self {
        Self {
            store,
            metric,
            strategy,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            seed: None,
        }
    }

    /// Sets the channel capacity (builder pattern). Zero is raised to 1.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Seeds the randomized strategies (builder pattern).
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builds from the store's own event stream and waits for completion.
    pub fn build(self) -> Result<BuildOutcome> {
        let events = self.store.rating_event_stream();
        self.spawn(events)?.wait()
    }

    /// Starts the pipeline over `events` and returns immediately.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if a worker thread cannot be spawned.
    pub fn spawn(self, events: RatingStream) -> Result<BuildHandle> {
        let (feed_tx, feed_rx) = bounded::<Feed>(self.queue_capacity);
        let (done_tx, done_rx) = bounded::<Result<BuildOutcome>>(1);

        let producer = thread::Builder::new()
            .name("trustwalk-producer".to_string())
            .spawn(move || produce(events, &feed_tx))?;

        let consumer = thread::Builder::new()
            .name("trustwalk-consumer".to_string())
            .spawn(move || {
                let outcome = self.consume(&feed_rx);
                // The handle may already be gone; nothing left to notify.
                let _ = done_tx.send(outcome);
            })?;

        Ok(BuildHandle {
            done: done_rx,
            producer,
            consumer,
        })
    }

    fn consume(self, feed: &Receiver<Feed>) -> Result<BuildOutcome> {
        let mut graph = TrustGraph::new();
        let mut stats = BuildStats::default();

        loop {
            match feed.recv() {
                Ok(Feed::Event(event)) => {
                    stats.events_consumed += 1;
                    graph.add_vertex(event.user_id);
                }
                Ok(Feed::EndOfStream) => break,
                Err(_) => {
                    return Err(Error::PipelineAborted(
                        "producer disconnected before end of stream".to_string(),
                    ))
                }
            }
        }
        stats.vertices = graph.vertex_count();
        tracing::debug!(
            events = stats.events_consumed,
            vertices = stats.vertices,
            "Vertex construction complete"
        );

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        match self.strategy {
            EdgeStrategy::BruteForce(mut policy) => strategies::brute_force(
                &mut graph,
                self.metric.as_ref(),
                &mut policy,
                &mut stats,
            )?,
            EdgeStrategy::BestOfBreed {
                percent_of_total_trust,
                min_trust,
            } => strategies::best_of_breed(
                &mut graph,
                &self.metric,
                percent_of_total_trust,
                min_trust,
                &mut stats,
            )?,
            EdgeStrategy::ScaleFree {
                scaling_factor,
                bidirectional,
                max_rounds,
            } => strategies::scale_free(
                &mut graph,
                self.store.as_ref(),
                self.metric.as_ref(),
                strategies::ScaleFreeParams {
                    scaling_factor,
                    bidirectional,
                    max_rounds,
                },
                &mut rng,
                &mut stats,
            )?,
        }
        stats.edges_added = graph.edge_count();

        tracing::info!(
            vertices = stats.vertices,
            edges = stats.edges_added,
            rejections = stats.policy_rejections,
            "Trust graph built"
        );
        Ok(BuildOutcome { graph, stats })
    }
}

fn produce(events: RatingStream, feed: &Sender<Feed>) -> Result<u64> {
    let aborted = || Error::PipelineAborted("consumer disconnected".to_string());
    let mut produced = 0u64;
    for event in events {
        match event {
            Ok(event) => {
                feed.send(Feed::Event(event)).map_err(|_| aborted())?;
                produced += 1;
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    produced,
                    "Rating stream read failed, treating as end of stream"
                );
                break;
            }
        }
    }
    feed.send(Feed::EndOfStream).map_err(|_| aborted())?;
    Ok(produced)
}

/// Completion handle of a running build.
#[derive(Debug)]
pub struct BuildHandle {
    done: Receiver<Result<BuildOutcome>>,
    producer: JoinHandle<Result<u64>>,
    consumer: JoinHandle<()>,
}

impl BuildHandle {
    /// Returns true once the consumer has published its result.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        !self.done.is_empty() || self.consumer.is_finished()
    }

    /// Blocks until the build completes.
    ///
    /// # Errors
    ///
    /// Returns the consumer's error, or `Error::PipelineAborted` if either
    /// worker terminated abnormally.
    pub fn wait(self) -> Result<BuildOutcome> {
        let outcome = self.done.recv().map_err(|_| {
            Error::PipelineAborted("consumer exited without a result".to_string())
        });
        let produced = self
            .producer
            .join()
            .map_err(|_| Error::PipelineAborted("producer thread panicked".to_string()))?;
        self.consumer
            .join()
            .map_err(|_| Error::PipelineAborted("consumer thread panicked".to_string()))?;

        let outcome = outcome??;
        let produced = produced?;
        tracing::debug!(produced, "Build pipeline joined");
        Ok(outcome)
    }
}
