//! Episode Controller and Evaluation.
//!
//! The controller drives `reset → step … → Done` for one policy on one
//! environment, repeats for the configured number of episodes, and summarises
//! the per-episode miss rates. `Evaluation` runs every configured policy on
//! every trace; traces are handed to scoped worker threads, each of which owns
//! its environment while sharing the immutable trace.

use std::thread;

use tracing::{debug, info};

use crate::cache::CacheEnv;
use crate::cache::Step;
use crate::common::error::{Result, SimError};
use crate::config::{Config, PolicyKind};
use crate::policy::{LearnedPolicy, Policy, Transition};
use crate::sim::loader::Trace;
use crate::stats::CacheStats;

/// Outcome of one episode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpisodeReport {
    /// Zero-based episode index.
    pub episode: usize,
    /// Accesses consumed.
    pub accesses: u64,
    /// Misses incurred.
    pub misses: u64,
    /// `misses / accesses`, `0.0` for an empty episode.
    pub miss_rate: f64,
    /// Sum of step rewards.
    pub total_reward: f64,
    /// Full counters at the end of the episode.
    pub stats: CacheStats,
}

/// Miss-rate statistics for one policy across episodes.
#[derive(Clone, Debug, PartialEq)]
pub struct PolicySummary {
    /// Policy display name.
    pub policy: String,
    /// Per-episode reports, in run order.
    pub episodes: Vec<EpisodeReport>,
    /// Mean miss rate.
    pub mean: f64,
    /// Median miss rate (mean of the two middle values for an even count).
    pub median: f64,
    /// Lowest miss rate.
    pub min: f64,
    /// Highest miss rate.
    pub max: f64,
}

impl PolicySummary {
    /// Summarises `episodes`. All statistics are `0.0` when there are none.
    pub fn from_reports(policy: impl Into<String>, episodes: Vec<EpisodeReport>) -> Self {
        let mut rates: Vec<f64> = episodes.iter().map(|e| e.miss_rate).collect();
        rates.sort_by(f64::total_cmp);

        let n = rates.len();
        let (mean, median, min, max) = if n == 0 {
            (0.0, 0.0, 0.0, 0.0)
        } else {
            let mean = rates.iter().sum::<f64>() / n as f64;
            let median = if n % 2 == 1 {
                rates[n / 2]
            } else {
                (rates[n / 2 - 1] + rates[n / 2]) / 2.0
            };
            (mean, median, rates[0], rates[n - 1])
        };

        Self {
            policy: policy.into(),
            episodes,
            mean,
            median,
            min,
            max,
        }
    }
}

/// Runs episodes of one policy against one environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EpisodeController {
    episodes: usize,
    step_cap: Option<u64>,
}

impl EpisodeController {
    /// Creates a controller running `episodes` episodes with no step cap of its own.
    pub const fn new(episodes: usize) -> Self {
        Self {
            episodes,
            step_cap: None,
        }
    }

    /// Ends each episode after at most `cap` steps, independent of the engine's budget.
    #[must_use]
    pub const fn with_step_cap(mut self, cap: Option<u64>) -> Self {
        self.step_cap = cap;
        self
    }

    /// Episodes per run.
    pub const fn episodes(&self) -> usize {
        self.episodes
    }

    /// Runs one episode from reset until the environment reports `Done`.
    ///
    /// Learned policies absorb every transition, including the final one.
    ///
    /// # Errors
    ///
    /// Propagates `InvalidStateError` from the environment; with the done check
    /// performed here that indicates a bug rather than a policy fault.
    pub fn run_episode(&self, env: &mut CacheEnv, policy: &mut Policy, episode: usize) -> Result<EpisodeReport> {
        let mut observation = env.reset();
        let mut total_reward = 0.0;
        let mut steps = 0u64;

        while !env.is_done() {
            if self.step_cap.is_some_and(|cap| steps >= cap) {
                break;
            }
            let action = policy.choose_action(env.state(), &observation);
            let Step {
                observation: next,
                reward,
                done,
                ..
            } = env.step(action)?;
            total_reward += reward;
            steps += 1;

            if policy.is_learner() {
                policy.absorb(Transition {
                    observation,
                    action,
                    reward,
                    next_observation: next.clone(),
                    done,
                });
            }
            observation = next;
        }

        let stats = env.stats();
        let report = EpisodeReport {
            episode,
            accesses: stats.accesses,
            misses: stats.misses,
            miss_rate: stats.miss_rate(),
            total_reward,
            stats: *stats,
        };
        debug!(
            policy = policy.name(),
            episode,
            accesses = report.accesses,
            misses = report.misses,
            miss_rate = report.miss_rate,
            "episode complete"
        );
        Ok(report)
    }

    /// Runs every episode and summarises the miss rates.
    ///
    /// # Errors
    ///
    /// See [`EpisodeController::run_episode`].
    pub fn run(&self, env: &mut CacheEnv, policy: &mut Policy) -> Result<PolicySummary> {
        let reports = (0..self.episodes)
            .map(|episode| self.run_episode(env, policy, episode))
            .collect::<Result<Vec<_>>>()?;
        let summary = PolicySummary::from_reports(policy.name(), reports);
        info!(
            policy = %summary.policy,
            mean = summary.mean,
            median = summary.median,
            min = summary.min,
            max = summary.max,
            "policy summary"
        );
        Ok(summary)
    }
}

/// A named trace to evaluate.
#[derive(Clone, Debug)]
pub struct TraceJob {
    /// Display name, usually the source file name.
    pub name: String,
    /// The accesses to replay.
    pub trace: Trace,
}

/// Per-policy summaries for one trace.
#[derive(Clone, Debug, PartialEq)]
pub struct TraceEvaluation {
    /// Trace display name.
    pub trace: String,
    /// One summary per policy, in configured order.
    pub summaries: Vec<PolicySummary>,
}

/// Builds a learned policy for a freshly constructed environment.
///
/// Receives the environment (for its action and feature counts) and the seed.
pub type LearnedFactory = dyn Fn(&CacheEnv, u64) -> Result<LearnedPolicy> + Send + Sync;

/// Evaluates the configured policies over a set of traces.
pub struct Evaluation {
    config: Config,
    learned: Option<Box<LearnedFactory>>,
}

impl std::fmt::Debug for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluation")
            .field("config", &self.config)
            .field("learned", &self.learned.is_some())
            .finish()
    }
}

impl Evaluation {
    /// Creates an evaluation with no learned policy factory.
    pub const fn new(config: Config) -> Self {
        Self {
            config,
            learned: None,
        }
    }

    /// Registers the factory used for `PolicyKind::Learned`.
    #[must_use]
    pub fn with_learned<F>(mut self, factory: F) -> Self
    where
        F: Fn(&CacheEnv, u64) -> Result<LearnedPolicy> + Send + Sync + 'static,
    {
        self.learned = Some(Box::new(factory));
        self
    }

    /// The configuration in use.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    fn build_policy(&self, kind: PolicyKind, env: &CacheEnv) -> Result<Policy> {
        let seed = self.config.evaluation.seed;
        match kind {
            PolicyKind::Learned => {
                let factory = self.learned.as_ref().ok_or_else(|| {
                    SimError::Config("Learned policy requested but no scorer was provided".into())
                })?;
                Ok(Policy::from(factory(env, seed)?))
            }
            reflex => Policy::reflex(reflex, seed),
        }
    }

    /// Evaluates every configured policy on one trace.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Config` for an invalid cache configuration or a
    /// missing learned-policy factory.
    pub fn evaluate_trace(&self, job: &TraceJob) -> Result<TraceEvaluation> {
        let eval = &self.config.evaluation;
        let mut env = CacheEnv::new(job.trace.clone(), &self.config.cache)?;
        info!(
            trace = %job.name,
            accesses = job.trace.len(),
            n_actions = env.n_actions(),
            n_features = env.n_features(),
            "evaluating trace"
        );

        let mut summaries = Vec::with_capacity(eval.policies.len());
        for &kind in &eval.policies {
            let mut policy = self.build_policy(kind, &env)?;
            let controller = EpisodeController::new(eval.episodes.episodes_for(kind))
                .with_step_cap(eval.step_cap);
            summaries.push(controller.run(&mut env, &mut policy)?);
        }

        Ok(TraceEvaluation {
            trace: job.name.clone(),
            summaries,
        })
    }

    /// Evaluates every trace, running up to `evaluation.workers` traces at once.
    ///
    /// Results are returned in the order of `jobs`.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered, in job order, or `SimError::Worker`
    /// if a worker thread panicked.
    ///
    /// # Panics
    ///
    /// Worker panics become `SimError::Worker` only when panics unwind. The
    /// workspace release profile sets `panic = "abort"`, so there a panicking
    /// worker aborts the process instead.
    pub fn run(&self, jobs: &[TraceJob]) -> Result<Vec<TraceEvaluation>> {
        self.config.validate()?;
        let workers = self.config.evaluation.workers.max(1);
        if workers == 1 {
            return jobs.iter().map(|job| self.evaluate_trace(job)).collect();
        }

        let mut results = Vec::with_capacity(jobs.len());
        for batch in jobs.chunks(workers) {
            let batch_results: Vec<Result<TraceEvaluation>> = thread::scope(|scope| {
                let handles: Vec<_> = batch
                    .iter()
                    .map(|job| scope.spawn(move || self.evaluate_trace(job)))
                    .collect();
                handles
                    .into_iter()
                    .zip(batch)
                    .map(|(handle, job)| {
                        handle
                            .join()
                            .unwrap_or_else(|_| Err(SimError::Worker(job.name.clone())))
                    })
                    .collect()
            });
            for result in batch_results {
                results.push(result?);
            }
        }
        Ok(results)
    }
}
