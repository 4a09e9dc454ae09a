//! Reflex Policy Tests.
//!
//! Verifies the victim selection of LRU, LFU, MRU, and Random against real
//! cache states, their tie-breaking, and the miss rates they reach on classic
//! access patterns (locality, cyclic thrashing, frequency skew).

use cachesim_core::cache::{CacheEnv, CacheState};
use cachesim_core::config::PolicyKind;
use cachesim_core::policy::{
    LfuPolicy, LruPolicy, MruPolicy, Policy, RandomPolicy, ReflexPolicy,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::{env, miss_rate_of};

/// Steps `env` through `n` accesses using action 0.
fn advance(env: &mut CacheEnv, n: usize) {
    for _ in 0..n {
        let _ = env.step(0).unwrap();
    }
}

// ══════════════════════════════════════════════════════════
// 1. Victim selection
// ══════════════════════════════════════════════════════════

#[test]
fn empty_cache_selects_slot_zero() {
    let state = CacheState::new(4);
    assert_eq!(LruPolicy::new().select_victim(&state), 0);
    assert_eq!(LfuPolicy::new().select_victim(&state), 0);
    assert_eq!(MruPolicy::new().select_victim(&state), 0);
    assert_eq!(RandomPolicy::new(1).select_victim(&state), 0);
}

#[test]
fn lru_picks_oldest_last_access() {
    // Slots: 0 ← 1 (re-used at tick 2), 1 ← 2 (tick 1), 2 ← 3 (tick 3).
    let mut env = env(&[1, 2, 1, 3, 0], 3);
    let _ = env.reset();
    advance(&mut env, 4);
    assert_eq!(LruPolicy::new().select_victim(env.state()), 1);
}

#[test]
fn mru_picks_newest_last_access() {
    let mut env = env(&[1, 2, 1, 3, 0], 3);
    let _ = env.reset();
    advance(&mut env, 3);
    assert_eq!(MruPolicy::new().select_victim(env.state()), 0);
    advance(&mut env, 1);
    assert_eq!(MruPolicy::new().select_victim(env.state()), 2);
}

#[test]
fn lfu_picks_fewest_accesses() {
    let mut env = env(&[1, 1, 2, 2, 2, 3, 0], 3);
    let _ = env.reset();
    advance(&mut env, 6);
    // Counts: slot 0 = 2, slot 1 = 3, slot 2 = 1.
    assert_eq!(LfuPolicy::new().select_victim(env.state()), 2);
}

#[test]
fn lfu_ties_go_to_lowest_index() {
    let mut env = env(&[1, 2, 3, 0], 3);
    let _ = env.reset();
    advance(&mut env, 3);
    assert_eq!(LfuPolicy::new().select_victim(env.state()), 0);
}

#[test]
fn random_only_picks_occupied_slots() {
    let mut env = env(&[1, 2, 0], 4);
    let _ = env.reset();
    advance(&mut env, 2);

    let mut policy = RandomPolicy::new(99);
    let mut seen = [false; 2];
    for _ in 0..200 {
        let victim = policy.select_victim(env.state());
        assert!(victim < 2, "picked empty slot {victim}");
        seen[victim] = true;
    }
    assert_eq!(seen, [true, true]);
}

#[test]
fn random_is_reproducible_per_seed() {
    let mut env = env(&[1, 2, 3, 4, 0], 4);
    let _ = env.reset();
    advance(&mut env, 4);

    let picks = |seed| {
        let mut policy = RandomPolicy::new(seed);
        (0..32)
            .map(|_| policy.select_victim(env.state()))
            .collect::<Vec<_>>()
    };
    assert_eq!(picks(7), picks(7));
    assert_ne!(picks(7), picks(8));
}

// ══════════════════════════════════════════════════════════
// 2. Policy enum
// ══════════════════════════════════════════════════════════

#[rstest]
#[case(PolicyKind::Random, "Random")]
#[case(PolicyKind::Lru, "LRU")]
#[case(PolicyKind::Lfu, "LFU")]
#[case(PolicyKind::Mru, "MRU")]
fn reflex_constructor_matches_kind(#[case] kind: PolicyKind, #[case] name: &str) {
    let policy = Policy::reflex(kind, 1).unwrap();
    assert_eq!(policy.kind(), kind);
    assert_eq!(policy.name(), name);
    assert!(!policy.is_learner());
}

#[test]
fn learned_needs_a_scorer() {
    assert!(Policy::reflex(PolicyKind::Learned, 1).is_err());
}

// ══════════════════════════════════════════════════════════
// 3. Access patterns
// ══════════════════════════════════════════════════════════

#[rstest]
#[case(PolicyKind::Lru, 0.6)]
#[case(PolicyKind::Lfu, 0.6)]
#[case(PolicyKind::Mru, 0.8)]
fn short_locality_trace(#[case] kind: PolicyKind, #[case] expected: f64) {
    // A B A C A with two slots.
    let rate = miss_rate_of(kind, &[1, 2, 1, 3, 1], 2);
    assert!((rate - expected).abs() < 1e-12, "{kind}: {rate}");
}

#[rstest]
#[case(PolicyKind::Random)]
#[case(PolicyKind::Lru)]
#[case(PolicyKind::Lfu)]
#[case(PolicyKind::Mru)]
fn working_set_that_fits_only_takes_cold_misses(#[case] kind: PolicyKind) {
    let blocks: Vec<u64> = (0..30).map(|i| i % 3).collect();
    let rate = miss_rate_of(kind, &blocks, 3);
    assert!((rate - 0.1).abs() < 1e-12, "{kind}: {rate}");
}

#[rstest]
#[case(PolicyKind::Random)]
#[case(PolicyKind::Lru)]
#[case(PolicyKind::Lfu)]
#[case(PolicyKind::Mru)]
fn unique_scan_always_misses(#[case] kind: PolicyKind) {
    let blocks: Vec<u64> = (0..40).collect();
    assert_eq!(miss_rate_of(kind, &blocks, 4), 1.0);
}

#[test]
fn lru_thrashes_on_a_loop_larger_than_the_cache() {
    let blocks: Vec<u64> = (0..60).map(|i| i % 3).collect();
    assert_eq!(miss_rate_of(PolicyKind::Lru, &blocks, 2), 1.0);
}

#[test]
fn mru_beats_lru_on_a_loop_larger_than_the_cache() {
    let blocks: Vec<u64> = (0..60).map(|i| i % 3).collect();
    let lru = miss_rate_of(PolicyKind::Lru, &blocks, 2);
    let mru = miss_rate_of(PolicyKind::Mru, &blocks, 2);
    assert!(mru < lru, "MRU {mru} should beat LRU {lru}");
}

#[test]
fn lfu_keeps_a_hot_block_that_lru_drops() {
    // Block 1 is hot; 2 and 3 arrive once each before 1 returns.
    let blocks = [1, 1, 1, 2, 3, 1];
    let lfu = miss_rate_of(PolicyKind::Lfu, &blocks, 2);
    let lru = miss_rate_of(PolicyKind::Lru, &blocks, 2);
    assert!((lfu - 3.0 / 6.0).abs() < 1e-12);
    assert!((lru - 4.0 / 6.0).abs() < 1e-12);
}
