//! Weighted random walks over a trust graph.
//!
//! A [`WeightedRandomWalk`] moves along outgoing edges, sampling each step
//! proportionally to edge weight (or uniformly). When it reaches a vertex
//! without outgoing edges it emits [`WalkEvent::Sink`] once and then keeps
//! re-reporting that vertex. Whether the walk may continue is decided
//! solely by its [`Termination`] strategy: a walk parked at a sink still
//! has a next step until its termination is exhausted.
//!
//! ```rust
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use trustwalk_core::graph::TrustGraph;
//! use trustwalk_core::walk::{BoundedSteps, WalkEvent, WeightedRandomWalk};
//!
//! let mut graph = TrustGraph::new();
//! graph.add_vertex(1);
//! graph.add_vertex(2);
//! graph.add_edge(1, 2, 1.0).unwrap();
//!
//! let walk = WeightedRandomWalk::new(&graph, 1, BoundedSteps::new(3), StdRng::seed_from_u64(0)).unwrap();
//! let events: Vec<WalkEvent> = walk.collect();
//! assert_eq!(events.len(), 3);
//! assert!(matches!(events[1], WalkEvent::Sink { vertex: 2 }));
//! ```

mod path;


use rand::Rng;

use crate::error::{Error, Result};
use crate::graph::{Trust, TrustGraph};

pub use path::{PathElement, WalkPath};

/// One step of a walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WalkEvent {
    /// The walk is at `vertex`, reached over `edge`. `edge` is `None` when
    /// a sink vertex is re-reported.
    Vertex {
        /// Vertex reached.
        vertex: u64,
        /// Edge traversed to reach it.
        edge: Option<Trust>,
    },
    /// First step taken at a vertex with no outgoing edges.
    Sink {
        /// The sink vertex.
        vertex: u64,
    },
}

impl WalkEvent {
    /// Returns the vertex the walk is at after this step.
    #[must_use]
    pub fn vertex(&self) -> u64 {
        match *self {
            Self::Vertex { vertex, .. } | Self::Sink { vertex } => vertex,
        }
    }
}

/// Decides when a walk ends and observes every step.
pub trait Termination {
    /// Returns true once the walk must stop.
    fn is_exhausted(&self) -> bool;

    /// Called after every emitted step.
    fn on_step(&mut self, event: &WalkEvent);
}

/// Ends the walk after a fixed number of steps.
///
/// Every emitted step counts, including sink re-reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedSteps {
    remaining: usize,
}

impl BoundedSteps {
    /// Allows `steps` steps.
    #[must_use]
    pub fn new(steps: usize) -> Self {
        Self { remaining: steps }
    }

    /// Returns the number of steps left.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl Termination for BoundedSteps {
    fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    fn on_step(&mut self, _event: &WalkEvent) {
        self.remaining = self.remaining.saturating_sub(1);
    }
}

/// Never ends the walk; the caller stops iterating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Infinite;

impl Termination for Infinite {
    fn is_exhausted(&self) -> bool {
        false
    }

    fn on_step(&mut self, _event: &WalkEvent) {}
}

/// Random walk over a borrowed [`TrustGraph`].
#[derive(Debug)]
pub struct WeightedRandomWalk<'g, T, R> {
    graph: &'g TrustGraph,
    current: u64,
    weighted: bool,
    sink_reported: bool,
    termination: T,
    rng: R,
}

impl<'g, T: Termination, R: Rng> WeightedRandomWalk<'g, T, R> {
    /// Starts a weighted walk at `start`.
    ///
    /// # Errors
    ///
    /// Returns `Error::VertexNotFound` if `start` is not in `graph`.
    pub fn new(graph: &'g TrustGraph, start: u64, termination: T, rng: R) -> Result<Self> {
        if !graph.contains_vertex(start) {
            return Err(Error::VertexNotFound(start));
        }
        Ok(Self {
            graph,
            current: start,
            weighted: true,
            sink_reported: false,
            termination,
            rng,
        })
    }

    /// Samples outgoing edges uniformly instead of by weight.
    #[must_use]
    pub fn unweighted(mut self) -> Self {
        self.weighted = false;
        self
    }

    /// Returns the vertex the walk is at.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.current
    }

    /// Returns true while the termination strategy allows another step.
    #[must_use]
    pub fn has_next(&self) -> bool {
        !self.termination.is_exhausted()
    }

    /// Returns the termination strategy.
    #[must_use]
    pub fn termination(&self) -> &T {
        &self.termination
    }

    /// Takes one step, or returns `None` once terminated.
    pub fn step(&mut self) -> Option<WalkEvent> {
        if !self.has_next() {
            return None;
        }
        let event = match self.select_edge() {
            Some(edge) => {
                self.current = edge.target();
                WalkEvent::Vertex {
                    vertex: edge.target(),
                    edge: Some(edge),
                }
            }
            None if !self.sink_reported => {
                self.sink_reported = true;
                WalkEvent::Sink {
                    vertex: self.current,
                }
            }
            None => WalkEvent::Vertex {
                vertex: self.current,
                edge: None,
            },
        };
        self.termination.on_step(&event);
        Some(event)
    }

    fn select_edge(&mut self) -> Option<Trust> {
        let degree = self.graph.out_degree(self.current);
        if degree == 0 {
            return None;
        }
        if !self.weighted {
            let index = self.rng.gen_range(0..degree);
            return self.graph.outgoing(self.current).nth(index).copied();
        }

        let total: f64 = self.graph.outgoing(self.current).map(Trust::weight).sum();
        let draw = self.rng.gen::<f64>() * total;
        let mut cumulative = 0.0;
        let mut last = None;
        for edge in self.graph.outgoing(self.current) {
            cumulative += edge.weight();
            if cumulative >= draw {
                return Some(*edge);
            }
            last = Some(*edge);
        }
        // Rounding can leave the draw just above the final cumulative sum.
        last
    }
}

impl<T: Termination, R: Rng> Iterator for WeightedRandomWalk<'_, T, R> {
    type Item = WalkEvent;

    fn next(&mut self) -> Option<WalkEvent> {
        self.step()
    }
}
