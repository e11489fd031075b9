//! # trustwalk core
//!
//! Rating inference by vote propagation over a user trust graph.
//!
//! Users who rated an item ("voters") pass their rating along trust edges
//! to users who did not. The trust graph is built once from a rating
//! history; each item is then propagated on its own.
//!
//! ## Components
//!
//! - **Trust metrics** ([`trust`]): how much one user's ratings predict
//!   another's, with a FIFO memo cache.
//! - **Edge policies** ([`policy`]): composable predicates deciding which
//!   candidate edges enter the graph.
//! - **Graph builder** ([`builder`]): a producer/consumer pipeline turning a
//!   rating stream into a [`graph::TrustGraph`].
//! - **Random walks** ([`walk`]): weighted walks with sink detection.
//! - **Propagation** ([`propagation`]): budgeted averaging, belief
//!   propagation and random-walk engines, plus per-edge votes mappers.
//! - **Sessions** ([`session`]): per-item batches written as CSV.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! use trustwalk_core::builder::{EdgeStrategy, GraphBuilder};
//! use trustwalk_core::policy::PolicyChain;
//! use trustwalk_core::propagation::{
//!     AveragingConfig, AveragingEngine, NoProgress, PropagationEngine,
//! };
//! use trustwalk_core::storage::{InMemoryRatingStore, RatingEvent, RatingStore};
//! use trustwalk_core::trust::CommonItemsTrust;
//!
//! fn main() -> trustwalk_core::Result<()> {
//!     let store: Arc<dyn RatingStore> = Arc::new(InMemoryRatingStore::from_events([
//!         RatingEvent::new(1, 10, 4, 0),
//!         RatingEvent::new(1, 20, 4, 0),
//!         RatingEvent::new(2, 10, 5, 0),
//!     ])?);
//!
//!     // Users 10 and 20 share item 1, so each trusts the other.
//!     let metric = Arc::new(CommonItemsTrust::new(Arc::clone(&store)));
//!     let mut graph = GraphBuilder::new(store, metric, EdgeStrategy::BruteForce(PolicyChain::new()))
//!         .build()?
//!         .graph;
//!
//!     // What would user 20 think of item 2?
//!     let votes = HashMap::from([(10, 5.0)]);
//!     let mut engine = AveragingEngine::new(AveragingConfig::default())?;
//!     engine.recommend(&mut graph, &votes, &[20], &mut NoProgress)?;
//!
//!     assert_eq!(graph.vertex(20).map(|u| u.value()), Some(5.0));
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
// Clippy lints configured in workspace Cargo.toml [workspace.lints.clippy]
#![cfg_attr(
    test,
    allow(
        clippy::doc_markdown,
        clippy::uninlined_format_args,
        clippy::float_cmp,
        clippy::cast_lossless,
        clippy::manual_assert
    )
)]

pub mod builder;
pub mod config;
#[cfg(test)]
mod config_tests;
pub mod error;
pub mod graph;
pub mod logging;
pub mod policy;
pub mod propagation;
pub mod report;
pub mod session;
pub mod storage;
pub mod trust;
pub mod walk;

pub use config::{ConfigError, TrustwalkConfig};
pub use error::{Error, Result};
pub use graph::{Trust, TrustGraph, User};
pub use propagation::{PropagationEngine, PropagationSummary};
pub use session::RecommendationSession;
