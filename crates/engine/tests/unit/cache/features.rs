//! Feature Extraction Tests.
//!
//! Checks observation widths, the per-slot values of each feature set, the
//! empty-slot sentinel, and that extraction depends on nothing but its inputs.

use cachesim_core::cache::{CacheEnv, StepEvent};
use cachesim_core::cache::features::{self, FeatureExtractor};
use cachesim_core::common::constants::EMPTY_SLOT_SENTINEL;
use cachesim_core::config::{CacheConfig, FeatureSet};
use pretty_assertions::assert_eq;

use crate::common::{env, trace};

const S: f64 = EMPTY_SLOT_SENTINEL;

fn env_with_features(blocks: &[u64], cache_size: usize, features: Vec<FeatureSet>) -> CacheEnv {
    let config = CacheConfig {
        cache_size,
        features,
        ..CacheConfig::default()
    };
    CacheEnv::new(trace(blocks), &config).unwrap()
}

fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "width mismatch: {actual:?}");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!((a - e).abs() < 1e-12, "feature {i}: got {a}, expected {e}");
    }
}

#[test]
fn widths_per_feature_set() {
    assert_eq!(FeatureSet::Base.width(5), 17);
    assert_eq!(FeatureSet::UsageTime.width(5), 5);
    assert_eq!(FeatureSet::CachedTime.width(5), 5);

    let extractor = FeatureExtractor::new(&[FeatureSet::Base, FeatureSet::CachedTime], 5);
    assert_eq!(extractor.n_features(), 22);
    assert_eq!(extractor.selection(), &[FeatureSet::Base, FeatureSet::CachedTime]);
}

#[test]
fn base_on_fresh_cache() {
    let mut env = env(&[1, 1], 2);
    let obs = env.reset();
    // Two empty slots, then the pending block: not resident, never seen.
    assert_close(obs.as_slice(), &[0.0, S, S, 0.0, S, S, 0.0, 0.0]);
}

#[test]
fn base_after_one_access() {
    let mut env = env(&[1, 1], 2);
    let _ = env.reset();
    let step = env.step(0).unwrap();
    // Clock 1: slot 0 aged 1 tick, seen once; block 1 is pending and resident.
    assert_close(
        step.observation.as_slice(),
        &[1.0, 0.5, 1.0, 0.0, S, S, 1.0, 1.0],
    );
}

#[test]
fn base_pending_pair_is_sentinel_once_exhausted() {
    let mut env = env(&[1], 1);
    let _ = env.reset();
    let step = env.step(0).unwrap();
    assert!(step.done);
    let obs = step.observation.into_inner();
    assert_eq!(&obs[obs.len() - 2..], &[S, S]);
}

#[test]
fn usage_time_is_age_over_elapsed() {
    let mut env = env_with_features(&[1, 2, 3], 3, vec![FeatureSet::UsageTime]);
    let _ = env.reset();
    let _ = env.step(0).unwrap();
    let step = env.step(0).unwrap();
    assert_close(step.observation.as_slice(), &[1.0, 0.5, S]);
}

#[test]
fn cached_time_is_residency_over_elapsed() {
    let mut env = env_with_features(&[1, 2, 1], 2, vec![FeatureSet::CachedTime]);
    let _ = env.reset();
    let _ = env.step(0).unwrap();
    let _ = env.step(0).unwrap();
    let step = env.step(0).unwrap();
    // Block 1 was hit at tick 2 but admitted at tick 0.
    assert_close(step.observation.as_slice(), &[1.0, 2.0 / 3.0]);
}

#[test]
fn selection_order_is_preserved() {
    let mut env = env_with_features(&[1, 2], 1, vec![FeatureSet::UsageTime, FeatureSet::Base]);
    let obs = env.reset();
    assert_close(obs.as_slice(), &[S, 0.0, S, S, 0.0, 0.0]);
}

#[test]
fn extraction_is_pure() {
    let mut env = env(&[1, 2, 1, 3], 2);
    let _ = env.reset();
    let _ = env.step(0).unwrap();
    let _ = env.step(0).unwrap();

    let a = env.observe();
    let b = env.observe();
    let c = features::extract(env.state(), env.pending(), &[FeatureSet::Base]);
    assert_eq!(a, b);
    assert_eq!(a, c);
}

#[test]
fn step_observations_match_extraction_of_the_post_step_state() {
    let selection = vec![FeatureSet::Base, FeatureSet::UsageTime, FeatureSet::CachedTime];
    let mut env = env_with_features(&[1, 2, 1, 3, 1, 4, 2, 2, 5], 2, selection.clone());
    let _ = env.reset();

    let (mut hits, mut fills, mut evictions) = (0, 0, 0);
    let mut action = 0;
    while !env.is_done() {
        let step = env.step(action).unwrap();
        match step.event {
            StepEvent::Hit { .. } => hits += 1,
            StepEvent::Fill { .. } => fills += 1,
            StepEvent::Evict { .. } => evictions += 1,
            StepEvent::Skip => {}
        }
        let replayed = features::extract(env.state(), env.pending(), &selection);
        assert_eq!(step.observation, replayed);
        action = 1 - action;
    }
    assert!(hits > 0 && fills > 0 && evictions > 0);
}

#[test]
fn values_are_finite() {
    let mut env = env_with_features(
        &[9, 8, 7, 9, 8, 6, 9],
        3,
        vec![FeatureSet::Base, FeatureSet::UsageTime, FeatureSet::CachedTime],
    );
    let mut obs = env.reset();
    loop {
        assert!(obs.as_slice().iter().all(|v| v.is_finite()));
        if env.is_done() {
            break;
        }
        obs = env.step(1).unwrap().observation;
    }
}
