//! Eviction Policies.
//!
//! Every policy, reflex or learned, is a variant of the closed `Policy` enum
//! and is driven through the same two calls: `choose_action` before each step
//! and `absorb` after it. The environment never knows which variant it faces.
//!
//! # Policies
//!
//! - `Random`, `Lru`, `Lfu`, `Mru`: reflex rules over the full cache state.
//! - `Learned`: an external scorer over the observation vector.

/// Learned policy and its scorer interface.
pub mod learned;

/// Transition replay memory.
pub mod memory;

/// Learned policy parameter file.
pub mod params;

/// Reflex policies.
pub mod reflex;

/// Seedable pseudo-random generator.
pub mod rng;

pub use learned::{ActionScorer, LearnedPolicy, LinearScorer, Mentor};
pub use memory::{ReplayMemory, Transition};
pub use params::PolicyParams;
pub use reflex::{LfuPolicy, LruPolicy, MruPolicy, RandomPolicy, ReflexPolicy};

use crate::cache::CacheState;
use crate::cache::features::Observation;
use crate::common::error::{Result, SimError};
use crate::config::PolicyKind;

/// Closed set of eviction policies.
#[derive(Debug)]
pub enum Policy {
    /// Uniform choice among occupied slots.
    Random(RandomPolicy),
    /// Least Recently Used.
    Lru(LruPolicy),
    /// Least Frequently Used.
    Lfu(LfuPolicy),
    /// Most Recently Used.
    Mru(MruPolicy),
    /// External scorer with optional exploration.
    Learned(Box<LearnedPolicy>),
}

impl Policy {
    /// Builds a reflex policy.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Config` for `PolicyKind::Learned`, which needs a scorer;
    /// use `Policy::from(LearnedPolicy)` instead.
    pub fn reflex(kind: PolicyKind, seed: u64) -> Result<Self> {
        match kind {
            PolicyKind::Random => Ok(Self::Random(RandomPolicy::new(seed))),
            PolicyKind::Lru => Ok(Self::Lru(LruPolicy::new())),
            PolicyKind::Lfu => Ok(Self::Lfu(LfuPolicy::new())),
            PolicyKind::Mru => Ok(Self::Mru(MruPolicy::new())),
            PolicyKind::Learned => Err(SimError::Config(
                "a learned policy cannot be built without a scorer".into(),
            )),
        }
    }

    /// Which variant this is.
    pub const fn kind(&self) -> PolicyKind {
        match self {
            Self::Random(_) => PolicyKind::Random,
            Self::Lru(_) => PolicyKind::Lru,
            Self::Lfu(_) => PolicyKind::Lfu,
            Self::Mru(_) => PolicyKind::Mru,
            Self::Learned(_) => PolicyKind::Learned,
        }
    }

    /// Display name.
    pub const fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Returns `true` if the policy absorbs transitions.
    pub const fn is_learner(&self) -> bool {
        matches!(self, Self::Learned(_))
    }

    /// Chooses the action for the next step.
    ///
    /// Reflex variants read `state`; the learned variant reads `observation`
    /// (and `state` only through its mentor).
    pub fn choose_action(&mut self, state: &CacheState, observation: &Observation) -> usize {
        match self {
            Self::Random(p) => p.select_victim(state),
            Self::Lru(p) => p.select_victim(state),
            Self::Lfu(p) => p.select_victim(state),
            Self::Mru(p) => p.select_victim(state),
            Self::Learned(p) => p.choose_action(state, observation),
        }
    }

    /// Hands a transition to the policy. A no-op for reflex variants.
    pub fn absorb(&mut self, transition: Transition) {
        if let Self::Learned(p) = self {
            p.absorb(transition);
        }
    }
}

impl From<LearnedPolicy> for Policy {
    fn from(policy: LearnedPolicy) -> Self {
        Self::Learned(Box::new(policy))
    }
}
