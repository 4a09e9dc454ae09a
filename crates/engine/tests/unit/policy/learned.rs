//! Learned Policy Tests.
//!
//! Uses a mocked `ActionScorer` to check greedy selection and tie-breaking,
//! exploration through a mentor, construction checks, and transition capture
//! when the policy is driven by the episode controller.

use cachesim_core::SimError;
use cachesim_core::cache::CacheState;
use cachesim_core::cache::features::Observation;
use cachesim_core::config::PolicyKind;
use cachesim_core::policy::{
    ActionScorer, LearnedPolicy, LinearScorer, LruPolicy, Mentor, Policy, PolicyParams, ReflexPolicy,
};
use cachesim_core::sim::controller::EpisodeController;
use pretty_assertions::assert_eq;

use crate::common::mocks::{MockScorer, fixed_scorer};
use crate::common::{env, temp_file};

fn observation(n: usize) -> Observation {
    Observation::new(vec![0.0; n])
}

// ══════════════════════════════════════════════════════════
// 1. Greedy selection
// ══════════════════════════════════════════════════════════

#[test]
fn greedy_picks_highest_score() {
    let scorer = fixed_scorer(vec![0.1, 0.9, 0.5]);
    let mut policy = LearnedPolicy::new(Box::new(scorer), 3, 1).unwrap();
    let state = CacheState::new(3);
    assert_eq!(policy.choose_action(&state, &observation(11)), 1);
    assert_eq!(policy.explorations(), 0);
}

#[test]
fn greedy_ties_go_to_lowest_action() {
    let scorer = fixed_scorer(vec![0.2, 0.7, 0.7, 0.7]);
    let mut policy = LearnedPolicy::new(Box::new(scorer), 4, 1).unwrap();
    let state = CacheState::new(4);
    assert_eq!(policy.choose_action(&state, &observation(14)), 1);
}

#[test]
fn scorer_receives_the_observation() {
    let mut scorer = MockScorer::new();
    let _ = scorer.expect_n_actions().return_const(2usize);
    let _ = scorer
        .expect_score()
        .times(1)
        .returning(|obs, scores| {
            assert_eq!(obs.to_vec(), vec![0.25, 0.5]);
            assert_eq!(scores.len(), 2);
            scores.copy_from_slice(&[1.0, 0.0]);
        });

    let mut policy = LearnedPolicy::new(Box::new(scorer), 2, 1).unwrap();
    let obs = Observation::new(vec![0.25, 0.5]);
    assert_eq!(policy.choose_action(&CacheState::new(2), &obs), 0);
}

// ══════════════════════════════════════════════════════════
// 2. Exploration
// ══════════════════════════════════════════════════════════

#[test]
fn full_exploration_defers_to_mentor() {
    let mut scorer = MockScorer::new();
    let _ = scorer.expect_n_actions().return_const(3usize);
    let _ = scorer.expect_score().times(0);

    let mut env = env(&[1, 2, 1, 3, 0], 3);
    let _ = env.reset();
    for _ in 0..4 {
        let _ = env.step(0).unwrap();
    }
    let expected = LruPolicy::new().select_victim(env.state());

    let mut policy = LearnedPolicy::new(Box::new(scorer), 3, 1)
        .unwrap()
        .with_exploration(1.0, Mentor::for_kind(PolicyKind::Lru));
    let obs = env.observe();
    for _ in 0..10 {
        assert_eq!(policy.choose_action(env.state(), &obs), expected);
    }
    assert_eq!(policy.explorations(), 10);
}

#[test]
fn exploration_without_mentor_stays_in_range() {
    let scorer = fixed_scorer(vec![0.0; 5]);
    let mut policy = LearnedPolicy::new(Box::new(scorer), 5, 3)
        .unwrap()
        .with_exploration(1.0, None);
    let state = CacheState::new(4);
    for _ in 0..100 {
        assert!(policy.choose_action(&state, &observation(14)) < 5);
    }
}

#[test]
fn exploration_rate_comes_from_params() {
    let params = PolicyParams {
        e_greedy_min: Some(0.1),
        explore_mentor: Some(PolicyKind::Lfu),
        memory_size: Some(8),
        batch_size: Some(4),
        ..PolicyParams::default()
    };
    let policy =
        LearnedPolicy::with_params(Box::new(fixed_scorer(vec![0.0; 2])), &params, 2, 1).unwrap();
    assert_eq!(policy.epsilon(), 0.1);
    assert_eq!(policy.memory().capacity(), 8);
    assert_eq!(Mentor::for_kind(PolicyKind::Mru), None);
}

// ══════════════════════════════════════════════════════════
// 3. Construction
// ══════════════════════════════════════════════════════════

#[test]
fn scorer_action_count_must_match() {
    let err = LearnedPolicy::new(Box::new(fixed_scorer(vec![0.0; 3])), 4, 1).unwrap_err();
    assert!(matches!(err, SimError::Config(_)));
}

#[test]
fn zero_actions_is_rejected() {
    let err = LearnedPolicy::new(Box::new(fixed_scorer(Vec::new())), 0, 1).unwrap_err();
    assert!(matches!(err, SimError::Config(_)));
}

// ══════════════════════════════════════════════════════════
// 4. Linear scorer
// ══════════════════════════════════════════════════════════

#[test]
fn linear_scorer_is_affine_per_action() {
    let scorer = LinearScorer {
        n_features: 2,
        weights: vec![1.0, 0.0, 0.0, 2.0],
        bias: vec![0.0, 0.5],
    };
    let mut scores = [0.0; 2];
    scorer.score(&[1.0, 1.0], &mut scores);
    assert_eq!(scores, [1.0, 2.5]);
    assert_eq!(scorer.n_actions(), 2);
}

#[test]
fn linear_scorer_file_shape_is_checked() {
    let good = temp_file(r#"{ "n_features": 1, "weights": [1.0, 2.0], "bias": [0.0, 0.0] }"#);
    let scorer = LinearScorer::from_json_file(good.path()).unwrap();
    assert_eq!(scorer.n_actions(), 2);

    let bad = temp_file(r#"{ "n_features": 2, "weights": [1.0], "bias": [0.0] }"#);
    assert!(matches!(
        LinearScorer::from_json_file(bad.path()),
        Err(SimError::Config(_))
    ));
}

// ══════════════════════════════════════════════════════════
// 5. Transition capture
// ══════════════════════════════════════════════════════════

#[test]
fn controller_feeds_every_transition_to_the_learner() {
    let mut env = env(&[1, 2, 1, 3, 1], 2);
    let scorer = LinearScorer::zeros(env.n_actions(), env.n_features());
    let learned = LearnedPolicy::new(Box::new(scorer), env.n_actions(), 1).unwrap();
    let mut policy = Policy::from(learned);
    assert!(policy.is_learner());

    let report = EpisodeController::new(1)
        .run_episode(&mut env, &mut policy, 0)
        .unwrap();
    assert_eq!(report.accesses, 5);

    let Policy::Learned(learned) = &mut policy else {
        panic!("expected learned policy");
    };
    let memory = learned.memory();
    assert_eq!(memory.len(), 5);
    let transitions: Vec<_> = memory.iter().collect();
    assert!(transitions[..4].iter().all(|t| !t.done));
    assert!(transitions[4].done);
    assert_eq!(transitions[0].next_observation, transitions[1].observation);

    let batch = learned.sample_batch();
    assert_eq!(batch.len(), 128);
}
