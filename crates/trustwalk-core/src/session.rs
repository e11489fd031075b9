//! Per-item recommendation driver.
//!
//! A session owns a built trust graph and a propagation engine, and
//! answers questions `(item_id, user_id)`: consecutive questions about the
//! same item form one batch, propagated once and written as
//! `item_id,user_id,value` rows.
//!
//! For each batch the votes are the item's ratings in the store, averaged
//! per user and restricted to users in the graph. Queried users never vote
//! on their own batch. Users absent from the graph are logged and left out
//! of the output. An item without votes is written with value 0 for every
//! remaining query.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Write;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::builder::GraphBuilder;
use crate::config::TrustwalkConfig;
use crate::error::Result;
use crate::graph::TrustGraph;
use crate::propagation::{NoProgress, ProgressSink, PropagationEngine};
use crate::report::{CsvProgressReport, RecommendationWriter};
use crate::storage::{average_vote, RatingEvent, RatingStore};

/// Counters of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Item batches processed.
    pub items: u64,
    /// Rows written.
    pub rows_written: u64,
    /// Queries dropped because the user is not in the graph.
    pub unknown_users: u64,
    /// Items written as 0 because nobody in the graph rated them.
    pub items_without_votes: u64,
    /// Items written as 0 because no voter is in the largest component.
    pub items_outside_component: u64,
    /// Items whose propagation failed with a recoverable error.
    pub failed_items: u64,
    /// Batches that could not be written.
    pub write_failures: u64,
    /// Budget units spent over all items.
    pub messages_consumed: u64,
}

/// Answers recommendation questions item by item.
pub struct RecommendationSession<W: Write> {
    store: Arc<dyn RatingStore>,
    graph: TrustGraph,
    engine: Box<dyn PropagationEngine>,
    writer: RecommendationWriter<W>,
    progress: Box<dyn ProgressSink>,
    largest_component: Option<FxHashSet<u64>>,
    stats: SessionStats,
}

impl<W: Write> std::fmt::Debug for RecommendationSession<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationSession")
            .field("vertices", &self.graph.vertex_count())
            .field("edges", &self.graph.edge_count())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<W: Write> RecommendationSession<W> {
    /// Creates a session over a built graph.
    pub fn new(
        store: Arc<dyn RatingStore>,
        graph: TrustGraph,
        engine: Box<dyn PropagationEngine>,
        writer: RecommendationWriter<W>,
    ) -> Self {
        Self {
            store,
            graph,
            engine,
            writer,
            progress: Box::new(NoProgress),
            largest_component: None,
            stats: SessionStats::default(),
        }
    }

    /// Sends propagation snapshots to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Box<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Skips items that have no voter inside the largest strongly
    /// connected component of the graph.
    #[must_use]
    pub fn require_voter_in_largest_component(mut self) -> Self {
        let component = self.graph.largest_component();
        tracing::info!(size = component.len(), "Largest strongly connected component");
        self.largest_component = Some(component.into_iter().collect());
        self
    }

    /// Answers `questions`, batching consecutive ones with the same item.
    ///
    /// # Errors
    ///
    /// Stops at the first non-recoverable propagation error.
    pub fn run<I>(&mut self, questions: I) -> Result<SessionStats>
    where
        I: IntoIterator<Item = (u64, u64)>,
    {
        let mut current: Option<u64> = None;
        let mut batch: Vec<u64> = Vec::new();
        for (item_id, user_id) in questions {
            if let Some(item) = current.filter(|&item| item != item_id) {
                self.recommend_item(item, &batch)?;
                batch.clear();
            }
            current = Some(item_id);
            batch.push(user_id);
        }
        if let Some(item) = current {
            self.recommend_item(item, &batch)?;
        }
        Ok(self.stats)
    }

    /// Propagates one item and writes a row per known query.
    ///
    /// # Errors
    ///
    /// Returns non-recoverable propagation errors (see
    /// [`Error::is_recoverable`](crate::Error::is_recoverable)).
    pub fn recommend_item(&mut self, item_id: u64, queries: &[u64]) -> Result<()> {
        self.stats.items += 1;
        let known = self.known_queries(item_id, queries);
        let votes = votes_for_item(self.store.as_ref(), &self.graph, item_id, &known);

        if votes.is_empty() {
            tracing::debug!(item_id, "No votes in trust graph, writing zeros");
            self.stats.items_without_votes += 1;
            self.graph.reset_values();
        } else if !self.has_voter_in_component(&votes) {
            tracing::debug!(item_id, "No voter in largest component, writing zeros");
            self.stats.items_outside_component += 1;
            self.graph.reset_values();
        } else {
            match self
                .engine
                .recommend(&mut self.graph, &votes, &known, self.progress.as_mut())
            {
                Ok(summary) => self.stats.messages_consumed += summary.consumed,
                Err(err) if err.is_recoverable() => {
                    tracing::warn!(item_id, error = %err, "Propagation failed, item skipped");
                    self.stats.failed_items += 1;
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        }

        match self.writer.write_batch(item_id, &self.graph, &known) {
            Ok(()) => self.stats.rows_written += known.len() as u64,
            Err(err) => {
                tracing::warn!(item_id, error = %err, "Failed to write recommendations");
                self.stats.write_failures += 1;
            }
        }
        Ok(())
    }

    /// Returns the counters so far.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Returns the trust graph.
    #[must_use]
    pub fn graph(&self) -> &TrustGraph {
        &self.graph
    }

    /// Flushes the output and returns the writer.
    pub fn finish(self) -> Result<W> {
        self.writer.into_inner()
    }

    fn known_queries(&mut self, item_id: u64, queries: &[u64]) -> Vec<u64> {
        let mut known = Vec::with_capacity(queries.len());
        for &user_id in queries {
            if self.graph.contains_vertex(user_id) {
                known.push(user_id);
            } else {
                tracing::warn!(item_id, user_id, "Unknown user, question skipped");
                self.stats.unknown_users += 1;
            }
        }
        known
    }

    fn has_voter_in_component(&self, votes: &HashMap<u64, f64>) -> bool {
        self.largest_component
            .as_ref()
            .is_none_or(|component| votes.keys().any(|id| component.contains(id)))
    }
}

impl RecommendationSession<File> {
    /// Builds the graph and engine described by `config` and opens the
    /// configured output files.
    ///
    /// # Errors
    ///
    /// Returns configuration, build and I/O errors.
    pub fn from_config(config: &TrustwalkConfig, store: Arc<dyn RatingStore>) -> Result<Self> {
        config.validate()?;
        let metric = config.trust.build_metric(Arc::clone(&store))?;
        let strategy = config.builder.strategy(&store, &metric);

        let mut builder = GraphBuilder::new(Arc::clone(&store), metric, strategy)
            .with_queue_capacity(config.builder.queue_capacity);
        if let Some(seed) = config.builder.seed {
            builder = builder.with_seed(seed);
        }
        let mut graph = builder.build()?.graph;
        if let Some(power) = config.builder.weight_power {
            graph.power_weights(power)?;
        }

        let engine = config.propagation.build_engine(store.as_ref(), &graph)?;
        let session_config = &config.session;
        let writer = if session_config.append {
            RecommendationWriter::append(&session_config.output_path)?
        } else {
            RecommendationWriter::create(&session_config.output_path)?
        };

        let mut session = Self::new(store, graph, engine, writer);
        if let Some(path) = &session_config.progress_path {
            session = session.with_progress(Box::new(CsvProgressReport::create(path)?));
        }
        if session_config.require_voter_in_largest_component {
            session = session.require_voter_in_largest_component();
        }
        Ok(session)
    }
}

/// Votes on `item_id` by users in `graph`, excluding `queries`.
///
/// Users who rated the item several times vote their rounded mean.
#[must_use]
pub fn votes_for_item(
    store: &dyn RatingStore,
    graph: &TrustGraph,
    item_id: u64,
    queries: &[u64],
) -> HashMap<u64, f64> {
    let excluded: FxHashSet<u64> = queries.iter().copied().collect();
    let mut by_user: BTreeMap<u64, Vec<RatingEvent>> = BTreeMap::new();
    for rating in store.ratings_of_item(item_id) {
        if graph.contains_vertex(rating.user_id) && !excluded.contains(&rating.user_id) {
            by_user.entry(rating.user_id).or_default().push(*rating);
        }
    }
    by_user
        .into_iter()
        .filter_map(|(user_id, ratings)| average_vote(&ratings).map(|vote| (user_id, vote)))
        .collect()
}
