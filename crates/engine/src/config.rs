//! Configuration system for the cache simulator.
//!
//! This module defines all configuration structures and enums used to parameterize
//! a simulation run. It provides:
//! 1. **Defaults:** Baseline cache size, reward coefficients, and episode counts.
//! 2. **Structures:** Hierarchical config for trace loading, the cache environment, and evaluation.
//! 3. **Enums:** Feature sets, reward shaping models, and policy kinds.
//!
//! Configuration is supplied as JSON (`Config::from_json_file`) or built from `Config::default()`.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::constants::DEFAULT_RANDOM_SEED;
use crate::common::error::{Result, SimError};

/// Default configuration constants for the simulator.
///
/// These values define the baseline setup when not explicitly overridden
/// in a JSON configuration file.
mod defaults {
    /// Number of cache slots.
    pub const CACHE_SIZE: usize = 50;

    /// `boot/exec` flag value marking execution-phase rows (`1` is boot).
    pub const EXEC_MARKER: u8 = 0;

    /// Miss penalty weight of the `our` reward model.
    pub const OUR_ALPHA: f64 = 0.5;

    /// Minimum recency horizon (in ticks) of the `our` reward model.
    pub const OUR_PSI: f64 = 10.0;

    /// Hit bonus of the `our` reward model.
    pub const OUR_MU: f64 = 1.0;

    /// Eviction and skip penalty weight of the `our` reward model.
    pub const OUR_BETA: f64 = 0.3;

    /// Hit reward of the `basic` reward model.
    pub const BASIC_HIT: f64 = 1.0;

    /// Miss reward of the `basic` reward model.
    pub const BASIC_MISS: f64 = -1.0;

    /// Skip reward of the `basic` reward model.
    pub const BASIC_SKIP: f64 = -1.0;

    /// Episodes per learned policy.
    pub const LEARNED_EPISODES: usize = 100;

    /// Episodes per Random policy.
    pub const RANDOM_EPISODES: usize = 20;

    /// Episodes per deterministic reflex policy (their miss rate is invariant).
    pub const DETERMINISTIC_EPISODES: usize = 1;

    /// Concurrent trace workers.
    pub const WORKERS: usize = 1;
}

/// Named groups of derived observation signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureSet {
    /// Occupancy, recency, and frequency per slot, plus the pending block's
    /// residency and historical access frequency.
    Base,
    /// Usage time: ticks since each slot's last access.
    #[serde(rename = "UT", alias = "UsageTime")]
    UsageTime,
    /// Cached time: ticks since each slot's admission.
    #[serde(rename = "CT", alias = "CachedTime")]
    CachedTime,
}

/// Reward shaping model and its coefficients.
///
/// Immutable once an environment is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum RewardParams {
    /// Recency-aware shaping.
    ///
    /// Hit: `+mu`. Miss: `-alpha`. An eviction additionally costs
    /// `beta * (1 - min(age, h) / h)` with `h = max(psi, running max age)`,
    /// so evicting a block that was just used costs up to `beta`.
    /// A skip additionally costs `beta`.
    #[serde(alias = "Our")]
    Our {
        /// Miss penalty weight.
        #[serde(default = "RewardParams::default_alpha")]
        alpha: f64,
        /// Minimum recency horizon in ticks.
        #[serde(default = "RewardParams::default_psi")]
        psi: f64,
        /// Hit bonus.
        #[serde(default = "RewardParams::default_mu")]
        mu: f64,
        /// Eviction and skip penalty weight.
        #[serde(default = "RewardParams::default_beta")]
        beta: f64,
    },
    /// Constant reward per outcome.
    #[serde(alias = "Basic")]
    Basic {
        /// Reward for a hit.
        #[serde(default = "RewardParams::default_hit")]
        hit: f64,
        /// Reward for a miss (fill or eviction).
        #[serde(default = "RewardParams::default_miss")]
        miss: f64,
        /// Reward for a skipped access.
        #[serde(default = "RewardParams::default_skip")]
        skip: f64,
    },
}

impl RewardParams {
    fn default_alpha() -> f64 {
        defaults::OUR_ALPHA
    }

    fn default_psi() -> f64 {
        defaults::OUR_PSI
    }

    fn default_mu() -> f64 {
        defaults::OUR_MU
    }

    fn default_beta() -> f64 {
        defaults::OUR_BETA
    }

    fn default_hit() -> f64 {
        defaults::BASIC_HIT
    }

    fn default_miss() -> f64 {
        defaults::BASIC_MISS
    }

    fn default_skip() -> f64 {
        defaults::BASIC_SKIP
    }
}

impl Default for RewardParams {
    fn default() -> Self {
        Self::Our {
            alpha: defaults::OUR_ALPHA,
            psi: defaults::OUR_PSI,
            mu: defaults::OUR_MU,
            beta: defaults::OUR_BETA,
        }
    }
}

/// Eviction policy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyKind {
    /// Uniform choice among occupied slots.
    #[serde(alias = "random")]
    Random,
    /// Least Recently Used.
    #[serde(rename = "LRU", alias = "Lru", alias = "lru")]
    Lru,
    /// Least Frequently Used.
    #[serde(rename = "LFU", alias = "Lfu", alias = "lfu")]
    Lfu,
    /// Most Recently Used (adversarial baseline).
    #[serde(rename = "MRU", alias = "Mru", alias = "mru")]
    Mru,
    /// Externally trained decision procedure.
    #[serde(alias = "learned", alias = "DQN")]
    Learned,
}

impl PolicyKind {
    /// Display name used in logs and result summaries.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Random => "Random",
            Self::Lru => "LRU",
            Self::Lfu => "LFU",
            Self::Mru => "MRU",
            Self::Learned => "Learned",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PolicyKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "lru" => Ok(Self::Lru),
            "lfu" => Ok(Self::Lfu),
            "mru" => Ok(Self::Mru),
            "learned" | "dqn" => Ok(Self::Learned),
            other => Err(SimError::Config(format!("unknown policy '{other}'"))),
        }
    }
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// ```
/// use cachesim_core::config::{Config, FeatureSet, PolicyKind, RewardParams};
///
/// let json = r#"{
///     "trace": { "include_boot": true },
///     "cache": {
///         "cache_size": 8,
///         "allow_skip": true,
///         "features": ["Base", "UT"],
///         "reward": { "name": "basic", "hit": 2.0 }
///     },
///     "evaluation": { "policies": ["LRU", "MRU"], "workers": 2 }
/// }"#;
///
/// let config: Config = serde_json::from_str(json).unwrap();
/// assert!(config.trace.include_boot);
/// assert_eq!(config.cache.cache_size, 8);
/// assert_eq!(config.cache.features, vec![FeatureSet::Base, FeatureSet::UsageTime]);
/// assert_eq!(
///     config.cache.reward,
///     RewardParams::Basic { hit: 2.0, miss: -1.0, skip: -1.0 }
/// );
/// assert_eq!(config.evaluation.policies, vec![PolicyKind::Lru, PolicyKind::Mru]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Trace loading options
    #[serde(default)]
    pub trace: TraceConfig,
    /// Cache environment settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Evaluation sweep settings
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

impl Config {
    /// Reads and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Io` if the file cannot be read, `SimError::Json` if it
    /// does not parse, and `SimError::Config` if a value is out of range.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| SimError::io(path, e))?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Config` describing the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        self.cache.validate()?;
        if self.evaluation.workers == 0 {
            return Err(SimError::Config("evaluation.workers must be at least 1".into()));
        }
        Ok(())
    }
}

/// Trace loading options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Keep boot-phase rows instead of filtering them out.
    #[serde(default)]
    pub include_boot: bool,

    /// `boot/exec` value that marks execution-phase rows; traces flag boot rows `1`
    /// and execution rows `0`.
    #[serde(default = "TraceConfig::default_exec_marker")]
    pub exec_marker: u8,
}

impl TraceConfig {
    fn default_exec_marker() -> u8 {
        defaults::EXEC_MARKER
    }
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            include_boot: false,
            exec_marker: defaults::EXEC_MARKER,
        }
    }
}

/// Cache environment settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Number of slots
    #[serde(default = "CacheConfig::default_cache_size")]
    pub cache_size: usize,

    /// Reserve action `cache_size` as "skip": drop the access without admitting it
    #[serde(default)]
    pub allow_skip: bool,

    /// Feature sets concatenated into each observation, in order
    #[serde(default = "CacheConfig::default_features")]
    pub features: Vec<FeatureSet>,

    /// Reward shaping model
    #[serde(default)]
    pub reward: RewardParams,

    /// Optional step budget; the episode ends when it is exhausted
    #[serde(default)]
    pub max_steps: Option<u64>,
}

impl CacheConfig {
    fn default_cache_size() -> usize {
        defaults::CACHE_SIZE
    }

    fn default_features() -> Vec<FeatureSet> {
        vec![FeatureSet::Base]
    }

    /// Number of actions a policy may emit.
    pub const fn n_actions(&self) -> usize {
        self.cache_size + self.allow_skip as usize
    }

    /// Checks that the environment can be constructed from these settings.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Config` for a zero cache size, an empty feature
    /// selection, or a non-positive reward horizon.
    pub fn validate(&self) -> Result<()> {
        if self.cache_size == 0 {
            return Err(SimError::Config("cache.cache_size must be at least 1".into()));
        }
        if self.features.is_empty() {
            return Err(SimError::Config(
                "cache.features must select at least one feature set".into(),
            ));
        }
        if matches!(self.reward, RewardParams::Our { psi, .. } if psi <= 0.0) {
            return Err(SimError::Config("cache.reward.psi must be positive".into()));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_size: defaults::CACHE_SIZE,
            allow_skip: false,
            features: Self::default_features(),
            reward: RewardParams::default(),
            max_steps: None,
        }
    }
}

/// Number of episodes to run per policy class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodePlan {
    /// Episodes for learned policies
    #[serde(default = "EpisodePlan::default_learned")]
    pub learned: usize,
    /// Episodes for the Random policy
    #[serde(default = "EpisodePlan::default_random")]
    pub random: usize,
    /// Episodes for LRU, LFU, and MRU
    #[serde(default = "EpisodePlan::default_deterministic")]
    pub deterministic: usize,
}

impl EpisodePlan {
    fn default_learned() -> usize {
        defaults::LEARNED_EPISODES
    }

    fn default_random() -> usize {
        defaults::RANDOM_EPISODES
    }

    fn default_deterministic() -> usize {
        defaults::DETERMINISTIC_EPISODES
    }

    /// Applies the same episode count to every policy class.
    pub const fn uniform(episodes: usize) -> Self {
        Self {
            learned: episodes,
            random: episodes,
            deterministic: episodes,
        }
    }

    /// Episodes to run for `kind`.
    pub const fn episodes_for(&self, kind: PolicyKind) -> usize {
        match kind {
            PolicyKind::Learned => self.learned,
            PolicyKind::Random => self.random,
            PolicyKind::Lru | PolicyKind::Lfu | PolicyKind::Mru => self.deterministic,
        }
    }
}

impl Default for EpisodePlan {
    fn default() -> Self {
        Self {
            learned: defaults::LEARNED_EPISODES,
            random: defaults::RANDOM_EPISODES,
            deterministic: defaults::DETERMINISTIC_EPISODES,
        }
    }
}

/// Evaluation sweep settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Policies to evaluate, in report order
    #[serde(default = "EvaluationConfig::default_policies")]
    pub policies: Vec<PolicyKind>,

    /// Episodes per policy class
    #[serde(default)]
    pub episodes: EpisodePlan,

    /// Maximum number of traces evaluated concurrently
    #[serde(default = "EvaluationConfig::default_workers")]
    pub workers: usize,

    /// Seed for the Random policy and learned-policy exploration
    #[serde(default = "EvaluationConfig::default_seed")]
    pub seed: u64,

    /// Controller-imposed step cap per episode, independent of the engine's budget
    #[serde(default)]
    pub step_cap: Option<u64>,
}

impl EvaluationConfig {
    fn default_policies() -> Vec<PolicyKind> {
        vec![
            PolicyKind::Random,
            PolicyKind::Lru,
            PolicyKind::Lfu,
            PolicyKind::Mru,
        ]
    }

    fn default_workers() -> usize {
        defaults::WORKERS
    }

    fn default_seed() -> u64 {
        DEFAULT_RANDOM_SEED
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            policies: Self::default_policies(),
            episodes: EpisodePlan::default(),
            workers: defaults::WORKERS,
            seed: DEFAULT_RANDOM_SEED,
            step_cap: None,
        }
    }
}
