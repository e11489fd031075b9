//! Tests for the trust metric implementations.

use std::sync::Arc;

use super::*;
use crate::error::Error;
use crate::storage::{InMemoryRatingStore, RatingEvent, RatingStore};

fn rate(store: &mut InMemoryRatingStore, user: u64, ratings: &[(u64, u8)]) {
    for &(item, rating) in ratings {
        store.insert(RatingEvent::new(item, user, rating, 0)).unwrap();
    }
}

fn test_store() -> Arc<dyn RatingStore> {
    let mut store = InMemoryRatingStore::new();
    rate(&mut store, 1, &[(1, 5), (2, 4), (3, 3), (4, 1)]);
    rate(&mut store, 2, &[(2, 4), (3, 2), (4, 2), (5, 5), (6, 1)]);
    rate(&mut store, 10, &[(1, 1), (2, 2), (3, 3)]);
    rate(&mut store, 11, &[(1, 2), (2, 3), (3, 4)]);
    rate(&mut store, 12, &[(1, 3), (2, 2), (3, 1)]);
    rate(&mut store, 13, &[(1, 1), (2, 2), (3, 3)]);
    rate(&mut store, 20, &[(1, 5), (2, 4)]);
    rate(&mut store, 21, &[(1, 5), (2, 5)]);
    rate(&mut store, 30, &[(1, 5), (2, 3)]);
    rate(&mut store, 31, &[(1, 4), (2, 5)]);
    rate(&mut store, 40, &[(100, 3)]);
    Arc::new(store)
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_common_items_normalizations() {
    let store = test_store();
    let raw = CommonItemsTrust::new(Arc::clone(&store));
    assert!(approx(raw.trust(1, 2).unwrap(), 3.0));

    let by_from = CommonItemsTrust::new(Arc::clone(&store)).with_normalization(Normalization::ByFrom);
    assert!(approx(by_from.trust(1, 2).unwrap(), 0.75));

    let by_to = CommonItemsTrust::new(Arc::clone(&store)).with_normalization(Normalization::ByTo);
    assert!(approx(by_to.trust(1, 2).unwrap(), 0.6));

    let squared = CommonItemsTrust::new(store).with_power(2.0);
    assert!(approx(squared.trust(1, 2).unwrap(), 9.0));
}

#[test]
fn test_common_items_is_not_symmetric_when_normalized() {
    let store = test_store();
    let metric = CommonItemsTrust::new(store).with_normalization(Normalization::ByFrom);
    assert!(!approx(metric.trust(1, 2).unwrap(), metric.trust(2, 1).unwrap()));
}

#[test]
fn test_agreement_scales_by_log_count() {
    let store = test_store();
    let metric = AgreementTrust::new(store);
    // Gaps 0 and 1 give closeness 5 + 3, scaled by log2(2) / 2.
    assert!(approx(metric.trust(20, 21).unwrap(), 4.0));
}

#[test]
fn test_pearson_unconstrained() {
    let store = test_store();
    let metric = PearsonTrust::new(store);
    assert!(approx(metric.trust(10, 11).unwrap(), 1.0));
    assert!(approx(metric.trust(10, 12).unwrap(), -1.0));
}

#[test]
fn test_pearson_constrained_uses_midpoint() {
    let store = test_store();
    let metric = PearsonTrust::constrained(store, 5).unwrap();
    assert!(approx(metric.trust(20, 21).unwrap(), 6.0 / 40f64.sqrt()));
}

#[test]
fn test_pearson_constrained_rejects_even_scale() {
    let store = test_store();
    assert!(matches!(
        PearsonTrust::constrained(store, 4),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn test_pearson_zero_variance_is_neutral() {
    let store = test_store();
    // User 21 rated both items 5: no variance around its own mean.
    let metric = PearsonTrust::new(store);
    assert!(approx(metric.trust(20, 21).unwrap(), 0.0));
}

#[test]
fn test_rmse_inverse() {
    let store = test_store();
    let metric = RmseTrust::new(store);
    assert!(approx(metric.trust(30, 31).unwrap(), 1.0 / 2.5f64.sqrt()));
    assert!(approx(metric.trust(10, 13).unwrap(), MAX_RMSE_TRUST));
}

#[test]
fn test_no_co_rated_items_is_neutral() {
    let store = test_store();
    let metrics: Vec<Box<dyn TrustMetric>> = vec![
        Box::new(CommonItemsTrust::new(Arc::clone(&store))),
        Box::new(AgreementTrust::new(Arc::clone(&store))),
        Box::new(PearsonTrust::new(Arc::clone(&store))),
        Box::new(RmseTrust::new(Arc::clone(&store))),
    ];
    for metric in metrics {
        assert!(approx(metric.trust(10, 40).unwrap(), 0.0));
    }
}

#[test]
fn test_random_trust_is_seeded_and_bounded() {
    let a = RandomTrust::with_seed(7);
    let b = RandomTrust::with_seed(7);
    for _ in 0..100 {
        let x = a.trust(1, 2).unwrap();
        assert!((0.0..1.0).contains(&x));
        assert!(approx(x, b.trust(1, 2).unwrap()));
    }
}

#[test]
fn test_corrupted_history_aborts() {
    let mut store = InMemoryRatingStore::new();
    rate(&mut store, 1, &[(1, 5), (1, 4)]);
    rate(&mut store, 2, &[(1, 5)]);
    let metric = RmseTrust::new(Arc::new(store));
    assert!(matches!(metric.trust(1, 2), Err(Error::CorruptedData(_))));
}
