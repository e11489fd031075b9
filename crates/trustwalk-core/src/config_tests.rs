//! Tests for configuration loading, validation and factories.

use std::sync::Arc;

use crate::builder::EdgeStrategy;
use crate::config::*;
use crate::graph::TrustGraph;
use crate::policy::BipartiteWalkConfig;
use crate::propagation::mapper::CluelessStrategy;
use crate::propagation::NoProgress;
use crate::storage::{InMemoryRatingStore, RatingEvent, RatingStore};
use crate::trust::{Normalization, TrustMetric};
use crate::Error;

fn store() -> Arc<dyn RatingStore> {
    Arc::new(
        InMemoryRatingStore::from_events([
            RatingEvent::new(1, 1, 4, 0),
            RatingEvent::new(2, 1, 2, 0),
            RatingEvent::new(1, 2, 5, 0),
            RatingEvent::new(2, 2, 1, 0),
            RatingEvent::new(3, 3, 3, 0),
        ])
        .unwrap(),
    )
}

#[test]
fn test_defaults() {
    let config = TrustwalkConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.builder.queue_capacity, 10_000);
    assert_eq!(config.builder.strategy, StrategyKind::BruteForce);
    assert_eq!(config.builder.best_of_breed.percent_of_total_trust, 100.0);
    assert_eq!(config.builder.best_of_breed.min_trust, 0.01);
    assert_eq!(config.builder.scale_free.scaling_factor, 1);
    assert_eq!(config.trust.cache_capacity, 1);
    assert_eq!(config.trust.scale, 5);
    assert_eq!(config.propagation.budget, 100_000);
    assert_eq!(config.propagation.report_interval, 1_600);
    assert_eq!(config.propagation.engine, EngineKind::Averaging);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_from_toml_overrides_nested_values() {
    let config = TrustwalkConfig::from_toml(
        r#"
        [builder]
        strategy = "best_of_breed"
        queue_capacity = 64

        [builder.best_of_breed]
        percent_of_total_trust = 80.0

        [builder.policies]
        min_common_items = 2

        [builder.policies.random_walk]
        walk_length = 7

        [trust]
        metric = "constrained_pearson"
        normalization = "by_from"
        cache_capacity = 32

        [propagation]
        engine = "random_walk"
        budget = 5000
        mapper = "min_rmse"
        clueless = "map_to_median"
        seed = 9

        [session]
        output_path = "out/recs.csv"
        require_voter_in_largest_component = true
        "#,
    )
    .unwrap();

    assert_eq!(config.builder.strategy, StrategyKind::BestOfBreed);
    assert_eq!(config.builder.queue_capacity, 64);
    assert_eq!(config.builder.best_of_breed.percent_of_total_trust, 80.0);
    assert_eq!(config.builder.best_of_breed.min_trust, 0.01);
    assert_eq!(config.builder.policies.min_common_items, Some(2));
    assert_eq!(
        config.builder.policies.random_walk,
        Some(BipartiteWalkConfig {
            walk_length: 7,
            ..BipartiteWalkConfig::default()
        })
    );
    assert_eq!(config.trust.metric, MetricKind::ConstrainedPearson);
    assert_eq!(config.trust.normalization, Normalization::ByFrom);
    assert_eq!(config.propagation.engine, EngineKind::RandomWalk);
    assert_eq!(config.propagation.mapper, MapperKind::MinRmse);
    assert_eq!(config.propagation.clueless, CluelessStrategy::MapToMedian);
    assert_eq!(config.propagation.seed, Some(9));
    assert_eq!(config.session.output_path.to_str(), Some("out/recs.csv"));
    assert!(config.session.require_voter_in_largest_component);
}

#[test]
fn test_validation_reports_field() {
    let err = TrustwalkConfig::from_toml("[builder]\nqueue_capacity = 0").unwrap_err();
    match err {
        ConfigError::Validation { field, .. } => assert_eq!(field, "builder.queue_capacity"),
        other => panic!("unexpected error: {other}"),
    }

    let err = TrustwalkConfig::from_toml("[trust]\nmetric = \"constrained_pearson\"\nscale = 4")
        .unwrap_err();
    assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "trust.scale"));

    let err = TrustwalkConfig::from_toml("[propagation]\nepsilon = 0.0").unwrap_err();
    assert!(
        matches!(err, ConfigError::Validation { ref field, .. } if field == "propagation.epsilon")
    );
}

#[test]
fn test_malformed_toml_is_a_load_error() {
    let err = TrustwalkConfig::from_toml("[builder\nqueue_capacity = 1").unwrap_err();
    assert!(matches!(err, ConfigError::Figment(_)));

    let err = TrustwalkConfig::from_toml("[propagation]\nengine = \"teleport\"").unwrap_err();
    assert!(matches!(err, ConfigError::Figment(_)));
}

#[test]
fn test_load_layers_file_then_environment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trustwalk.toml");
    std::fs::write(&path, "[propagation]\nbudget = 42\nweighted = false\n").unwrap();

    std::env::set_var("TRUSTWALK_PROPAGATION__BUDGET", "77");
    let loaded = TrustwalkConfig::load(Some(&path));
    std::env::remove_var("TRUSTWALK_PROPAGATION__BUDGET");

    let config = loaded.unwrap();
    assert_eq!(config.propagation.budget, 77);
    assert!(!config.propagation.weighted);

    let missing = dir.path().join("absent.toml");
    let config = TrustwalkConfig::load(Some(&missing)).unwrap();
    assert_eq!(config, TrustwalkConfig::default());
}

#[test]
fn test_config_error_converts_into_crate_error() {
    let err: Error = TrustwalkConfig::from_toml("[builder]\nqueue_capacity = 0")
        .unwrap_err()
        .into();
    assert!(matches!(err, Error::Config(_)));
    assert!(!err.is_recoverable());
}

#[test]
fn test_build_every_metric() {
    let store = store();
    for metric in [
        MetricKind::CommonItems,
        MetricKind::Agreement,
        MetricKind::Pearson,
        MetricKind::ConstrainedPearson,
        MetricKind::Rmse,
        MetricKind::Random,
    ] {
        let config = TrustConfig {
            metric,
            seed: Some(1),
            ..TrustConfig::default()
        };
        let built = config.build_metric(Arc::clone(&store)).unwrap();
        let trust = built.trust(1, 2).unwrap();
        assert!(trust.is_finite(), "{metric:?} gave {trust}");
    }
}

#[test]
fn test_build_metric_rejects_even_scale() {
    let config = TrustConfig {
        metric: MetricKind::ConstrainedPearson,
        scale: 4,
        ..TrustConfig::default()
    };
    assert!(matches!(
        config.build_metric(store()),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn test_strategy_factory() {
    let store = store();
    let metric = TrustConfig::default().build_metric(Arc::clone(&store)).unwrap();

    let mut config = BuilderConfig::default();
    config.policies.max_out_degree = Some(3);
    config.policies.min_trust = Some(0.5);
    match config.strategy(&store, &metric) {
        EdgeStrategy::BruteForce(chain) => assert_eq!(chain.len(), 2),
        other => panic!("unexpected strategy: {other:?}"),
    }

    config.strategy = StrategyKind::ScaleFree;
    config.scale_free.bidirectional = true;
    assert!(matches!(
        config.strategy(&store, &metric),
        EdgeStrategy::ScaleFree {
            scaling_factor: 1,
            bidirectional: true,
            ..
        }
    ));
}

#[test]
fn test_engine_factory() {
    let store = store();
    let mut graph = TrustGraph::new();
    for id in 1..=3 {
        graph.add_vertex(id);
    }
    graph.add_edge(1, 2, 1.0).unwrap();

    for (engine, mapper) in [
        (EngineKind::Averaging, MapperKind::None),
        (EngineKind::BeliefPropagation, MapperKind::Identity),
        (EngineKind::Averaging, MapperKind::MinRmse),
        (EngineKind::Averaging, MapperKind::ScaledRange),
        (EngineKind::RandomWalk, MapperKind::None),
    ] {
        let config = PropagationConfig {
            engine,
            mapper,
            seed: Some(3),
            ..PropagationConfig::default()
        };
        let mut built = config.build_engine(store.as_ref(), &graph).unwrap();
        let votes = std::collections::HashMap::from([(2, 5.0)]);
        let summary = built
            .recommend(&mut graph, &votes, &[1], &mut NoProgress)
            .unwrap();
        assert!(summary.consumed > 0, "{engine:?}/{mapper:?}");
    }
}
