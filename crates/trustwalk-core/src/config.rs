//! Configuration for trustwalk runs.
//!
//! Values are resolved in layers, later layers winning:
//!
//! 1. compiled defaults,
//! 2. an optional TOML file,
//! 3. `TRUSTWALK_`-prefixed environment variables, with `__` separating
//!    nesting levels (`TRUSTWALK_PROPAGATION__BUDGET=5000`).
//!
//! ```toml
//! [builder]
//! strategy = "best_of_breed"
//! queue_capacity = 4096
//!
//! [trust]
//! metric = "pearson"
//! cache_capacity = 64
//!
//! [propagation]
//! engine = "random_walk"
//! budget = 250000
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::builder::{EdgeStrategy, DEFAULT_QUEUE_CAPACITY};
use crate::error::Result;
use crate::graph::TrustGraph;
use crate::policy::{
    BipartiteWalkConfig, LimitedOutDegree, MinimumCommonItems, MinimumTrust, PolicyChain,
    RandomWalkBased,
};
use crate::propagation::mapper::{
    CluelessStrategy, IdentityMapper, MinRmseMapper, ScaledRangeMapper, VotesMapper,
};
use crate::propagation::{
    AveragingConfig, AveragingEngine, PropagationEngine, RandomWalkConfig, RandomWalkEngine,
    DEFAULT_REPORT_INTERVAL,
};
use crate::storage::RatingStore;
use crate::trust::{
    AgreementTrust, CachedTrustMetric, CommonItemsTrust, Normalization, PearsonTrust,
    RandomTrust, RmseTrust, SharedTrustMetric, TrustMetric,
};

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "TRUSTWALK_";

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A layer could not be read or parsed.
    #[error("Failed to load configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    /// A value is out of its allowed range.
    #[error("Invalid configuration value for '{field}': {message}")]
    Validation {
        /// Dotted path of the offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.to_string(),
        message: message.into(),
    }
}

// ── Top level ─────────────────────────────────────────────────────────

/// Complete configuration of a build-and-propagate run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustwalkConfig {
    /// Graph construction.
    pub builder: BuilderConfig,
    /// Trust metric and memo cache.
    pub trust: TrustConfig,
    /// Propagation engine.
    pub propagation: PropagationConfig,
    /// Output files of a recommendation session.
    pub session: SessionConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

impl TrustwalkConfig {
    /// Loads defaults, then `path` if given, then the environment, and
    /// validates the result.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` if a layer cannot be parsed and
    /// `ConfigError::Validation` for out-of-range values.
    pub fn load(path: Option<&Path>) -> std::result::Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document over the defaults, without environment
    /// overrides.
    pub fn from_toml(toml: &str) -> std::result::Result<Self, ConfigError> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every section, reporting the first invalid field.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.builder.validate()?;
        self.trust.validate()?;
        self.propagation.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

// ── Builder ───────────────────────────────────────────────────────────

/// Edge generation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// All ordered pairs through the policy chain.
    #[default]
    BruteForce,
    /// Greedy by descending trust per source.
    BestOfBreed,
    /// Preferential attachment.
    ScaleFree,
}

/// Policies chained for the brute-force strategy. Unset entries are left
/// out of the chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Minimum trust of an admitted edge.
    pub min_trust: Option<f64>,
    /// Minimum number of co-rated items.
    pub min_common_items: Option<usize>,
    /// Maximum out-degree per vertex.
    pub max_out_degree: Option<usize>,
    /// Restrict candidates to frequent bipartite-walk neighbors.
    pub random_walk: Option<BipartiteWalkConfig>,
}

/// Best-of-breed strategy settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BestOfBreedConfig {
    /// Share of each source's total trust to keep, in percent.
    pub percent_of_total_trust: f64,
    /// Smallest admissible trust.
    pub min_trust: f64,
}

impl Default for BestOfBreedConfig {
    fn default() -> Self {
        Self {
            percent_of_total_trust: 100.0,
            min_trust: 0.01,
        }
    }
}

/// Scale-free strategy settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleFreeConfig {
    /// Divides the sampling range.
    pub scaling_factor: u64,
    /// Add edges in both directions.
    pub bidirectional: bool,
    /// Sampling rounds per vertex before giving up.
    pub max_rounds: usize,
}

impl Default for ScaleFreeConfig {
    fn default() -> Self {
        Self {
            scaling_factor: 1,
            bidirectional: false,
            max_rounds: 10_000,
        }
    }
}

/// Graph construction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Capacity of the producer/consumer channel.
    pub queue_capacity: usize,
    /// Edge generation strategy.
    pub strategy: StrategyKind,
    /// Brute-force policy chain.
    pub policies: PolicyConfig,
    /// Best-of-breed parameters.
    pub best_of_breed: BestOfBreedConfig,
    /// Scale-free parameters.
    pub scale_free: ScaleFreeConfig,
    /// Raise every edge weight to this power after building.
    pub weight_power: Option<f64>,
    /// Seed for randomized strategies and policies.
    pub seed: Option<u64>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            strategy: StrategyKind::default(),
            policies: PolicyConfig::default(),
            best_of_breed: BestOfBreedConfig::default(),
            scale_free: ScaleFreeConfig::default(),
            weight_power: None,
            seed: None,
        }
    }
}

impl BuilderConfig {
    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(invalid("builder.queue_capacity", "must be greater than 0"));
        }
        let percent = self.best_of_breed.percent_of_total_trust;
        if !(percent > 0.0 && percent <= 100.0) {
            return Err(invalid(
                "builder.best_of_breed.percent_of_total_trust",
                "must be in (0, 100]",
            ));
        }
        if self.scale_free.scaling_factor == 0 {
            return Err(invalid(
                "builder.scale_free.scaling_factor",
                "must be greater than 0",
            ));
        }
        if self.scale_free.max_rounds == 0 {
            return Err(invalid("builder.scale_free.max_rounds", "must be greater than 0"));
        }
        if let Some(power) = self.weight_power {
            if !power.is_finite() {
                return Err(invalid("builder.weight_power", "must be finite"));
            }
        }
        Ok(())
    }

    /// Creates the configured edge strategy.
    ///
    /// The brute-force chain is assembled from [`PolicyConfig`] in a fixed
    /// order: random-walk neighbors, common items, out-degree, trust. The
    /// cheapest checks run before the trust metric is consulted.
    #[must_use]
    pub fn strategy(
        &self,
        store: &Arc<dyn RatingStore>,
        metric: &SharedTrustMetric,
    ) -> EdgeStrategy {
        match self.strategy {
            StrategyKind::BruteForce => EdgeStrategy::BruteForce(self.policy_chain(store, metric)),
            StrategyKind::BestOfBreed => EdgeStrategy::BestOfBreed {
                percent_of_total_trust: self.best_of_breed.percent_of_total_trust,
                min_trust: self.best_of_breed.min_trust,
            },
            StrategyKind::ScaleFree => EdgeStrategy::ScaleFree {
                scaling_factor: self.scale_free.scaling_factor,
                bidirectional: self.scale_free.bidirectional,
                max_rounds: self.scale_free.max_rounds,
            },
        }
    }

    fn policy_chain(&self, store: &Arc<dyn RatingStore>, metric: &SharedTrustMetric) -> PolicyChain {
        let policies = &self.policies;
        let mut chain = PolicyChain::new();
        if let Some(walk) = policies.random_walk {
            let mut rng = match self.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            chain = chain.and(RandomWalkBased::precompute(store.as_ref(), walk, &mut rng));
        }
        if let Some(threshold) = policies.min_common_items {
            chain = chain.and(MinimumCommonItems::new(Arc::clone(store), threshold));
        }
        if let Some(max_degree) = policies.max_out_degree {
            chain = chain.and(LimitedOutDegree::new(max_degree));
        }
        if let Some(threshold) = policies.min_trust {
            chain = chain.and(MinimumTrust::new(Arc::clone(metric), threshold));
        }
        chain
    }
}

// ── Trust ─────────────────────────────────────────────────────────────

/// Trust metric selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Number of co-rated items.
    #[default]
    CommonItems,
    /// Closeness-weighted agreement.
    Agreement,
    /// Pearson correlation around each user's mean.
    Pearson,
    /// Pearson correlation around the scale midpoint.
    ConstrainedPearson,
    /// Inverse RMSE.
    Rmse,
    /// Uniform random.
    Random,
}

/// Trust metric settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustConfig {
    /// Metric to use.
    pub metric: MetricKind,
    /// Common-items normalization.
    pub normalization: Normalization,
    /// Common-items power.
    pub power: f64,
    /// Rating scale size for the constrained Pearson metric (odd).
    pub scale: u8,
    /// Memo cache entries.
    pub cache_capacity: usize,
    /// Seed of the random metric.
    pub seed: Option<u64>,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            metric: MetricKind::default(),
            normalization: Normalization::None,
            power: 1.0,
            scale: 5,
            cache_capacity: crate::trust::DEFAULT_CAPACITY,
            seed: None,
        }
    }
}

impl TrustConfig {
    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.cache_capacity == 0 {
            return Err(invalid("trust.cache_capacity", "must be greater than 0"));
        }
        if !self.power.is_finite() {
            return Err(invalid("trust.power", "must be finite"));
        }
        if self.metric == MetricKind::ConstrainedPearson && self.scale % 2 == 0 {
            return Err(invalid("trust.scale", "constrained Pearson needs an odd scale"));
        }
        Ok(())
    }

    /// Creates the configured metric wrapped in its memo cache.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` for an even constrained-Pearson scale
    /// or a zero cache capacity.
    pub fn build_metric(&self, store: Arc<dyn RatingStore>) -> Result<SharedTrustMetric> {
        let metric: SharedTrustMetric = match self.metric {
            MetricKind::CommonItems => self.cached(
                CommonItemsTrust::new(store)
                    .with_normalization(self.normalization)
                    .with_power(self.power),
            )?,
            MetricKind::Agreement => self.cached(AgreementTrust::new(store))?,
            MetricKind::Pearson => self.cached(PearsonTrust::new(store))?,
            MetricKind::ConstrainedPearson => {
                self.cached(PearsonTrust::constrained(store, self.scale)?)?
            }
            MetricKind::Rmse => self.cached(RmseTrust::new(store))?,
            MetricKind::Random => self.cached(match self.seed {
                Some(seed) => RandomTrust::with_seed(seed),
                None => RandomTrust::new(),
            })?,
        };
        Ok(metric)
    }

    fn cached<M: TrustMetric + 'static>(&self, metric: M) -> Result<SharedTrustMetric> {
        Ok(Arc::new(CachedTrustMetric::with_capacity(
            metric,
            self.cache_capacity,
        )?))
    }
}

// ── Propagation ───────────────────────────────────────────────────────

/// Propagation algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Iterative neighbor averaging.
    #[default]
    Averaging,
    /// Averaging without echoing a neighbor's own contribution.
    BeliefPropagation,
    /// Truncated random walks with backpropagation.
    RandomWalk,
}

/// Votes mapper selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapperKind {
    /// Raw values, no mapping.
    #[default]
    None,
    /// Values rounded through the vote scale.
    Identity,
    /// Learned minimum-RMSE mapping.
    MinRmse,
    /// Linear rating-range mapping.
    ScaledRange,
}

/// Propagation engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationConfig {
    /// Algorithm.
    pub engine: EngineKind,
    /// Message budget per item.
    pub budget: u64,
    /// Use trust levels as weights.
    pub weighted: bool,
    /// Averaging convergence threshold.
    pub epsilon: f64,
    /// Budget units between progress snapshots.
    pub report_interval: u64,
    /// Votes mapper for the averaging engines.
    pub mapper: MapperKind,
    /// Fallback of the min-RMSE mapper.
    pub clueless: CluelessStrategy,
    /// Random walk seed.
    pub seed: Option<u64>,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        let averaging = AveragingConfig::default();
        Self {
            engine: EngineKind::default(),
            budget: averaging.budget,
            weighted: averaging.weighted,
            epsilon: averaging.epsilon,
            report_interval: DEFAULT_REPORT_INTERVAL,
            mapper: MapperKind::default(),
            clueless: CluelessStrategy::default(),
            seed: None,
        }
    }
}

impl PropagationConfig {
    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.budget == 0 {
            return Err(invalid("propagation.budget", "must be greater than 0"));
        }
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(invalid("propagation.epsilon", "must be greater than 0"));
        }
        if self.report_interval == 0 {
            return Err(invalid("propagation.report_interval", "must be greater than 0"));
        }
        Ok(())
    }

    /// Creates the configured engine for `graph`.
    ///
    /// The min-RMSE mapper is learned from `store` over the edges of
    /// `graph`, so the engine must be rebuilt if the graph changes.
    ///
    /// # Errors
    ///
    /// Returns `Error::CorruptedData` if learning a mapper hits
    /// inconsistent ratings, or `Error::InvalidConfig` for a bad epsilon.
    pub fn build_engine(
        &self,
        store: &dyn RatingStore,
        graph: &TrustGraph,
    ) -> Result<Box<dyn PropagationEngine>> {
        match self.engine {
            EngineKind::Averaging | EngineKind::BeliefPropagation => {
                let mut engine = AveragingEngine::new(AveragingConfig {
                    budget: self.budget,
                    weighted: self.weighted,
                    belief_propagation: self.engine == EngineKind::BeliefPropagation,
                    epsilon: self.epsilon,
                    report_interval: self.report_interval,
                })?;
                if let Some(mapper) = self.build_mapper(store, graph)? {
                    engine = engine.with_mapper(mapper);
                }
                Ok(Box::new(engine))
            }
            EngineKind::RandomWalk => {
                if self.mapper != MapperKind::None {
                    tracing::warn!(
                        mapper = ?self.mapper,
                        "Votes mapper is ignored by the random walk engine"
                    );
                }
                let config = RandomWalkConfig {
                    budget: self.budget,
                    weighted: self.weighted,
                    report_interval: self.report_interval,
                };
                Ok(Box::new(match self.seed {
                    Some(seed) => RandomWalkEngine::with_seed(config, seed),
                    None => RandomWalkEngine::new(config),
                }))
            }
        }
    }

    fn build_mapper(
        &self,
        store: &dyn RatingStore,
        graph: &TrustGraph,
    ) -> Result<Option<Arc<dyn VotesMapper>>> {
        let mapper: Option<Arc<dyn VotesMapper>> = match self.mapper {
            MapperKind::None => None,
            MapperKind::Identity => Some(Arc::new(IdentityMapper)),
            MapperKind::MinRmse => {
                let mapper = MinRmseMapper::build(store, graph, self.clueless)?;
                tracing::info!(
                    valuable_percent = mapper.valuable_mapping_percentage(),
                    "Votes mapper ready"
                );
                Some(Arc::new(mapper))
            }
            MapperKind::ScaledRange => Some(Arc::new(ScaledRangeMapper::from_store(store))),
        };
        Ok(mapper)
    }
}

// ── Session & logging ─────────────────────────────────────────────────

/// Files written by a recommendation session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Recommendation CSV.
    pub output_path: PathBuf,
    /// Append to an existing output file instead of truncating it.
    pub append: bool,
    /// Optional progress CSV.
    pub progress_path: Option<PathBuf>,
    /// Skip items with no voter inside the largest strongly connected
    /// component.
    pub require_voter_in_largest_component: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("recommendations.csv"),
            append: false,
            progress_path: None,
            require_voter_in_largest_component: false,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directives used when `RUST_LOG` is unset.
    pub level: String,
    /// Print the event target.
    pub with_target: bool,
    /// Print thread names (the builder threads are named).
    pub thread_names: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_target: true,
            thread_names: true,
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.level.trim().is_empty() {
            return Err(invalid("logging.level", "must not be empty"));
        }
        Ok(())
    }
}
