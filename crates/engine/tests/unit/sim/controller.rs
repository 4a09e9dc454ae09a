//! Episode Controller and Evaluation Tests.

use cachesim_core::config::{Config, EpisodePlan, PolicyKind};
use cachesim_core::policy::{LearnedPolicy, LinearScorer, Policy};
use cachesim_core::sim::controller::{
    EpisodeController, EpisodeReport, Evaluation, PolicySummary, TraceJob,
};
use cachesim_core::stats::CacheStats;
use cachesim_core::SimError;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::{cache_config, env, init_tracing, trace};

fn report(episode: usize, miss_rate: f64) -> EpisodeReport {
    EpisodeReport {
        episode,
        accesses: 0,
        misses: 0,
        miss_rate,
        total_reward: 0.0,
        stats: CacheStats::default(),
    }
}

fn job(name: &str, blocks: &[u64]) -> TraceJob {
    TraceJob {
        name: name.to_string(),
        trace: trace(blocks),
    }
}

fn config(cache_size: usize, policies: Vec<PolicyKind>, episodes: EpisodePlan) -> Config {
    let mut config = Config {
        cache: cache_config(cache_size),
        ..Config::default()
    };
    config.evaluation.policies = policies;
    config.evaluation.episodes = episodes;
    config
}

// ══════════════════════════════════════════════════════════
// 1. Summaries
// ══════════════════════════════════════════════════════════

#[test]
fn empty_summary_is_all_zero() {
    let summary = PolicySummary::from_reports("LRU", Vec::new());
    assert_eq!(
        (summary.mean, summary.median, summary.min, summary.max),
        (0.0, 0.0, 0.0, 0.0)
    );
}

#[rstest]
#[case(vec![0.5], 0.5, 0.5)]
#[case(vec![0.9, 0.1, 0.5], 0.5, 0.5)]
#[case(vec![0.4, 0.1, 0.2, 0.3], 0.25, 0.25)]
fn summary_statistics(#[case] rates: Vec<f64>, #[case] mean: f64, #[case] median: f64) {
    let reports: Vec<EpisodeReport> = rates.iter().enumerate().map(|(i, &r)| report(i, r)).collect();
    let summary = PolicySummary::from_reports("Random", reports);
    assert!((summary.mean - mean).abs() < 1e-12);
    assert!((summary.median - median).abs() < 1e-12);
    let lo = rates.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = rates.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(summary.min, lo);
    assert_eq!(summary.max, hi);
    // Reports stay in run order.
    assert_eq!(summary.episodes[0].miss_rate, rates[0]);
}

// ══════════════════════════════════════════════════════════
// 2. Episode control
// ══════════════════════════════════════════════════════════

#[test]
fn lru_episode_on_the_locality_trace() {
    init_tracing();
    let mut env = env(&[1, 2, 1, 3, 1], 2);
    let mut policy = Policy::reflex(PolicyKind::Lru, 0).unwrap();
    let summary = EpisodeController::new(3).run(&mut env, &mut policy).unwrap();

    assert_eq!(summary.policy, "LRU");
    assert_eq!(summary.episodes.len(), 3);
    for (i, ep) in summary.episodes.iter().enumerate() {
        assert_eq!(ep.episode, i);
        assert_eq!(ep.accesses, 5);
        assert_eq!(ep.misses, 3);
        assert_eq!(ep.stats.hits, 2);
    }
    assert!((summary.mean - 0.6).abs() < 1e-12);
    assert_eq!(summary.min, summary.max);
}

#[test]
fn step_cap_truncates_episodes() {
    let mut env = env(&[1, 2, 3, 4, 5, 6], 2);
    let mut policy = Policy::reflex(PolicyKind::Lru, 0).unwrap();
    let report = EpisodeController::new(1)
        .with_step_cap(Some(4))
        .run_episode(&mut env, &mut policy, 0)
        .unwrap();
    assert_eq!(report.accesses, 4);
    assert!(!env.is_done());
}

#[test]
fn empty_trace_episode_reports_zero() {
    let mut env = env(&[], 2);
    let mut policy = Policy::reflex(PolicyKind::Mru, 0).unwrap();
    let report = EpisodeController::new(1)
        .run_episode(&mut env, &mut policy, 0)
        .unwrap();
    assert_eq!(report.accesses, 0);
    assert_eq!(report.miss_rate, 0.0);
}

#[test]
fn random_episodes_keep_one_generator() {
    let blocks: Vec<u64> = (0..400).map(|i| (i * 7 + i / 3) % 13).collect();
    let mut env = env(&blocks, 4);
    let mut policy = Policy::reflex(PolicyKind::Random, 42).unwrap();
    let summary = EpisodeController::new(20).run(&mut env, &mut policy).unwrap();

    assert_eq!(summary.episodes.len(), 20);
    assert!(summary.min < summary.max, "episodes should differ");
    assert!(summary.min >= 0.0 && summary.max <= 1.0);
}

// ══════════════════════════════════════════════════════════
// 3. Evaluation
// ══════════════════════════════════════════════════════════

#[test]
fn evaluation_runs_every_policy_in_order() {
    let evaluation = Evaluation::new(config(
        2,
        vec![PolicyKind::Mru, PolicyKind::Lru],
        EpisodePlan::default(),
    ));
    let results = evaluation.run(&[job("abaca", &[1, 2, 1, 3, 1])]).unwrap();

    assert_eq!(results.len(), 1);
    let names: Vec<&str> = results[0].summaries.iter().map(|s| s.policy.as_str()).collect();
    assert_eq!(names, vec!["MRU", "LRU"]);
    assert!((results[0].summaries[0].mean - 0.8).abs() < 1e-12);
    assert!((results[0].summaries[1].mean - 0.6).abs() < 1e-12);
}

#[test]
fn episode_plan_sets_per_class_counts() {
    let plan = EpisodePlan {
        learned: 2,
        random: 5,
        deterministic: 1,
    };
    let evaluation = Evaluation::new(config(2, vec![PolicyKind::Random, PolicyKind::Lfu], plan));
    let results = evaluation.run(&[job("t", &[1, 2, 3, 1])]).unwrap();
    assert_eq!(results[0].summaries[0].episodes.len(), 5);
    assert_eq!(results[0].summaries[1].episodes.len(), 1);
}

#[test]
fn workers_preserve_job_order_and_results() {
    let jobs = vec![
        job("a", &[1, 2, 1, 3, 1]),
        job("b", &[1, 2, 3, 1, 2, 3]),
        job("c", &[4, 4, 4, 4]),
        job("d", &[]),
    ];
    let serial = Evaluation::new(config(2, vec![PolicyKind::Lru, PolicyKind::Random], EpisodePlan::uniform(2)));
    let mut parallel_config = config(2, vec![PolicyKind::Lru, PolicyKind::Random], EpisodePlan::uniform(2));
    parallel_config.evaluation.workers = 3;
    let parallel = Evaluation::new(parallel_config);

    let a = serial.run(&jobs).unwrap();
    let b = parallel.run(&jobs).unwrap();
    let names: Vec<&str> = b.iter().map(|r| r.trace.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c", "d"]);
    assert_eq!(a, b);
}

#[test]
fn learned_without_factory_is_a_config_error() {
    let evaluation = Evaluation::new(config(2, vec![PolicyKind::Learned], EpisodePlan::uniform(1)));
    let err = evaluation.run(&[job("t", &[1, 2])]).unwrap_err();
    assert!(matches!(err, SimError::Config(_)));
}

#[test]
fn learned_factory_is_used() {
    let evaluation = Evaluation::new(config(2, vec![PolicyKind::Learned], EpisodePlan::uniform(3)))
        .with_learned(|env, seed| {
            let scorer = LinearScorer::zeros(env.n_actions(), env.n_features());
            LearnedPolicy::new(Box::new(scorer), env.n_actions(), seed)
        });
    let results = evaluation.run(&[job("t", &[1, 2, 1, 3, 1])]).unwrap();
    let summary = &results[0].summaries[0];
    assert_eq!(summary.policy, "Learned");
    assert_eq!(summary.episodes.len(), 3);
    // A constant scorer always evicts slot 0.
    assert!((summary.mean - 0.8).abs() < 1e-12);
}

#[test]
fn panicking_worker_is_reported_by_trace_name() {
    let mut cfg = config(2, vec![PolicyKind::Learned], EpisodePlan::uniform(1));
    cfg.evaluation.workers = 2;
    let evaluation = Evaluation::new(cfg).with_learned(|env, seed| {
        assert!(env.n_features() > 100, "scorer width mismatch");
        LearnedPolicy::new(
            Box::new(LinearScorer::zeros(env.n_actions(), env.n_features())),
            env.n_actions(),
            seed,
        )
    });
    let err = evaluation
        .run(&[job("first", &[1, 2]), job("second", &[3])])
        .unwrap_err();
    assert!(matches!(err, SimError::Worker(ref name) if name == "first"));
}

#[test]
fn invalid_configuration_fails_before_running() {
    let mut bad = config(2, vec![PolicyKind::Lru], EpisodePlan::uniform(1));
    bad.evaluation.workers = 0;
    assert!(Evaluation::new(bad).run(&[job("t", &[1])]).is_err());
}
