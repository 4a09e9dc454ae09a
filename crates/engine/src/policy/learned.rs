//! Learned Eviction Policy.
//!
//! Wraps an externally trained decision procedure behind the same interface as
//! the reflex rules. The procedure is an `ActionScorer` that produces one score
//! per action from the observation vector; the policy picks the highest score.
//! With probability `epsilon` it explores instead, deferring to a mentor reflex
//! policy when one is configured (uniform choice otherwise).
//!
//! Transitions passed to `absorb` land in a bounded replay memory so an
//! external trainer can improve the scorer offline. Training is not done here.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::memory::{ReplayMemory, Transition};
use super::params::PolicyParams;
use super::reflex::{LfuPolicy, LruPolicy, ReflexPolicy};
use super::rng::XorShift64;
use crate::cache::CacheState;
use crate::cache::features::Observation;
use crate::common::error::{Result, SimError};
use crate::config::PolicyKind;

/// External decision procedure mapping an observation to per-action scores.
pub trait ActionScorer: Send {
    /// Number of actions scored; must equal the environment's action count.
    fn n_actions(&self) -> usize;

    /// Writes one score per action into `scores` (length `n_actions()`).
    fn score(&self, observation: &[f64], scores: &mut [f64]);
}

/// Linear action-value model: `score[a] = bias[a] + weights[a] · observation`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearScorer {
    /// Observation width the weights were fitted for.
    pub n_features: usize,
    /// Row-major `n_actions × n_features` weight matrix.
    pub weights: Vec<f64>,
    /// Per-action bias.
    pub bias: Vec<f64>,
}

impl LinearScorer {
    /// A model scoring every action zero.
    pub fn zeros(n_actions: usize, n_features: usize) -> Self {
        Self {
            n_features,
            weights: vec![0.0; n_actions * n_features],
            bias: vec![0.0; n_actions],
        }
    }

    /// Reads weights from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Io` if the file cannot be read, `SimError::Json` if it
    /// does not parse, and `SimError::Config` if the matrix shape is inconsistent.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| SimError::io(path, e))?;
        let scorer: Self = serde_json::from_str(&text)?;
        if scorer.weights.len() != scorer.bias.len() * scorer.n_features {
            return Err(SimError::Config(format!(
                "weight matrix has {} entries, expected {} actions x {} features",
                scorer.weights.len(),
                scorer.bias.len(),
                scorer.n_features
            )));
        }
        Ok(scorer)
    }
}

impl ActionScorer for LinearScorer {
    fn n_actions(&self) -> usize {
        self.bias.len()
    }

    fn score(&self, observation: &[f64], scores: &mut [f64]) {
        let rows = self.weights.chunks(self.n_features.max(1));
        for ((out, row), bias) in scores.iter_mut().zip(rows).zip(&self.bias) {
            *out = bias + row.iter().zip(observation).map(|(w, x)| w * x).sum::<f64>();
        }
    }
}

/// Reflex policy consulted while exploring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mentor {
    /// Explore with LRU's choice.
    Lru(LruPolicy),
    /// Explore with LFU's choice.
    Lfu(LfuPolicy),
}

impl Mentor {
    /// Mentor for `kind`, if it is one of the supported reflex rules.
    pub const fn for_kind(kind: PolicyKind) -> Option<Self> {
        match kind {
            PolicyKind::Lru => Some(Self::Lru(LruPolicy::new())),
            PolicyKind::Lfu => Some(Self::Lfu(LfuPolicy::new())),
            _ => None,
        }
    }

    fn select_victim(&mut self, state: &CacheState) -> usize {
        match self {
            Self::Lru(p) => p.select_victim(state),
            Self::Lfu(p) => p.select_victim(state),
        }
    }
}

/// Policy driven by an external scorer.
pub struct LearnedPolicy {
    scorer: Box<dyn ActionScorer>,
    n_actions: usize,
    epsilon: f64,
    mentor: Option<Mentor>,
    rng: XorShift64,
    memory: ReplayMemory,
    batch_size: usize,
    scores: Vec<f64>,
    explorations: u64,
}

impl fmt::Debug for LearnedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LearnedPolicy")
            .field("n_actions", &self.n_actions)
            .field("epsilon", &self.epsilon)
            .field("mentor", &self.mentor)
            .field("memory", &self.memory.len())
            .field("explorations", &self.explorations)
            .finish_non_exhaustive()
    }
}

impl LearnedPolicy {
    /// Creates a greedy policy over `scorer` with an empty replay memory.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Config` if `n_actions` is zero or the scorer's action
    /// count differs from `n_actions`.
    pub fn new(scorer: Box<dyn ActionScorer>, n_actions: usize, seed: u64) -> Result<Self> {
        Self::with_params(scorer, &PolicyParams::default(), n_actions, seed)
    }

    /// Creates a policy configured from a parameter record.
    ///
    /// Uses the record's exploration floor, mentor, replay capacity, and batch size.
    ///
    /// # Errors
    ///
    /// See [`LearnedPolicy::new`]; also fails if `params` does not validate.
    pub fn with_params(
        scorer: Box<dyn ActionScorer>,
        params: &PolicyParams,
        n_actions: usize,
        seed: u64,
    ) -> Result<Self> {
        params.validate()?;
        if n_actions == 0 {
            return Err(SimError::Config("learned policy needs at least one action".into()));
        }
        if scorer.n_actions() != n_actions {
            return Err(SimError::Config(format!(
                "scorer produces {} scores but the environment has {} actions",
                scorer.n_actions(),
                n_actions
            )));
        }
        Ok(Self {
            scorer,
            n_actions,
            epsilon: params.exploration_rate(),
            mentor: params.explore_mentor.and_then(Mentor::for_kind),
            rng: XorShift64::new(seed),
            memory: ReplayMemory::new(params.memory_capacity()),
            batch_size: params.batch(),
            scores: vec![0.0; n_actions],
            explorations: 0,
        })
    }

    /// Overrides the exploration rate and mentor.
    #[must_use]
    pub fn with_exploration(mut self, epsilon: f64, mentor: Option<Mentor>) -> Self {
        self.epsilon = epsilon.clamp(0.0, 1.0);
        self.mentor = mentor;
        self
    }

    /// Number of actions the policy chooses among.
    pub const fn n_actions(&self) -> usize {
        self.n_actions
    }

    /// Exploration probability.
    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Decisions made by exploring rather than scoring.
    pub const fn explorations(&self) -> u64 {
        self.explorations
    }

    /// Absorbed transitions.
    pub const fn memory(&self) -> &ReplayMemory {
        &self.memory
    }

    /// Chooses an action in `[0, n_actions)`.
    pub fn choose_action(&mut self, state: &CacheState, observation: &Observation) -> usize {
        if self.epsilon > 0.0 && self.rng.next_f64() < self.epsilon {
            self.explorations += 1;
            return match &mut self.mentor {
                Some(mentor) => mentor.select_victim(state),
                None => self.rng.below(self.n_actions),
            };
        }

        self.scorer.score(observation.as_slice(), &mut self.scores);
        let mut best = 0;
        for (idx, &score) in self.scores.iter().enumerate().skip(1) {
            if score > self.scores[best] {
                best = idx;
            }
        }
        best
    }

    /// Stores a transition for offline improvement.
    pub fn absorb(&mut self, transition: Transition) {
        self.memory.push(transition);
    }

    /// Samples a replay batch of the configured size.
    pub fn sample_batch(&mut self) -> Vec<&Transition> {
        self.memory.sample(self.batch_size, &mut self.rng)
    }
}
