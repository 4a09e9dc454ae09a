//! Trace-Driven Cache Environment.
//!
//! This module implements the cache state machine that eviction policies are
//! benchmarked against. It replays a trace one access per `step()`, resolves each
//! access as a hit, a fill of a free slot, an eviction chosen by the caller's
//! action, or (when enabled) a skip, and reports a shaped reward together with
//! the next observation.
//!
//! # Lifecycle
//!
//! `Uninitialized` → `reset()` → `Ready` → `step()` → `Running` → … → `Done`.
//! Only `reset()` leaves `Done`. Stepping in `Uninitialized` or `Done` fails
//! with `InvalidStateError`.

/// Observation feature extraction.
pub mod features;
/// Reward shaping models.
pub mod reward;
/// Fixed-capacity slot arena.
pub mod slot;

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, warn};

use self::features::{FeatureExtractor, Observation};
use self::reward::RewardShaper;
use self::slot::SlotArena;
use crate::common::error::{InvalidStateError, OutOfRangeAction, Result};
use crate::common::{AccessRecord, BlockAddr};
use crate::config::CacheConfig;
use crate::sim::loader::Trace;
use crate::stats::CacheStats;

/// Environment lifecycle phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Constructed; `reset()` has not been called.
    Uninitialized,
    /// Reset, no step taken yet.
    Ready,
    /// At least one step taken, trace not exhausted.
    Running,
    /// Trace exhausted or step budget spent.
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "Uninitialized",
            Self::Ready => "Ready",
            Self::Running => "Running",
            Self::Done => "Done",
        })
    }
}

/// How one access was resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepEvent {
    /// The block was resident in `slot`.
    Hit {
        /// Slot holding the block.
        slot: usize,
    },
    /// Miss placed into the free slot `slot`.
    Fill {
        /// Slot the block was placed in.
        slot: usize,
    },
    /// Miss that displaced `victim` from `slot`.
    Evict {
        /// Slot that was reassigned.
        slot: usize,
        /// Block that was displaced.
        victim: BlockAddr,
        /// Ticks since the victim was last accessed.
        victim_age: u64,
        /// The victim had been written since admission.
        dirty: bool,
        /// Set when the policy's action was out of range and slot 0 was used instead.
        fallback: Option<OutOfRangeAction>,
    },
    /// Miss dropped without admission (skip action).
    Skip,
}

impl StepEvent {
    /// Returns `true` for hits.
    #[inline]
    pub const fn is_hit(&self) -> bool {
        matches!(self, Self::Hit { .. })
    }

    /// Returns `true` for every miss outcome.
    #[inline]
    pub const fn is_miss(&self) -> bool {
        !self.is_hit()
    }
}

/// Result of one `step()`.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    /// Observation of the post-step state.
    pub observation: Observation,
    /// Shaped reward for this step.
    pub reward: f64,
    /// The episode ended with this step.
    pub done: bool,
    /// How the access was resolved.
    pub event: StepEvent,
}

/// Mutable cache state: slots, trace cursor, access history, and counters.
///
/// Read-only outside the engine; reflex policies and the feature extractor
/// inspect it through `CacheEnv::state()`.
#[derive(Clone, Debug)]
pub struct CacheState {
    slots: SlotArena,
    cursor: usize,
    history: HashMap<BlockAddr, u64>,
    stats: CacheStats,
}

impl CacheState {
    /// Creates an empty state with `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: SlotArena::new(capacity),
            cursor: 0,
            history: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// The slot arena.
    #[inline]
    pub const fn slots(&self) -> &SlotArena {
        &self.slots
    }

    /// Index of the next access to replay.
    #[inline]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Current tick; equal to the number of accesses consumed.
    #[inline]
    pub const fn clock(&self) -> u64 {
        self.cursor as u64
    }

    /// Accesses to `block` consumed so far this episode.
    #[inline]
    pub fn history_count(&self, block: BlockAddr) -> u64 {
        self.history.get(&block).copied().unwrap_or(0)
    }

    /// Running counters.
    #[inline]
    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.cursor = 0;
        self.history.clear();
        self.stats = CacheStats::default();
    }
}

/// The cache environment.
///
/// Owns its state exclusively; the trace is shared read-only and reused across
/// resets. One environment must not be stepped from more than one thread.
#[derive(Debug)]
pub struct CacheEnv {
    trace: Trace,
    cache_size: usize,
    allow_skip: bool,
    max_steps: Option<u64>,
    features: FeatureExtractor,
    reward: RewardShaper,
    state: CacheState,
    phase: Phase,
    steps: u64,
}

impl CacheEnv {
    /// Creates an environment replaying `trace` under `config`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Config` if `config` fails validation.
    pub fn new(trace: Trace, config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            trace,
            cache_size: config.cache_size,
            allow_skip: config.allow_skip,
            max_steps: config.max_steps,
            features: FeatureExtractor::new(&config.features, config.cache_size),
            reward: RewardShaper::new(config.reward),
            state: CacheState::new(config.cache_size),
            phase: Phase::Uninitialized,
            steps: 0,
        })
    }

    /// Number of slots.
    #[inline]
    pub const fn cache_size(&self) -> usize {
        self.cache_size
    }

    /// Size of the action space: one per slot, plus skip when enabled.
    #[inline]
    pub const fn n_actions(&self) -> usize {
        self.cache_size + self.allow_skip as usize
    }

    /// Observation width.
    #[inline]
    pub const fn n_features(&self) -> usize {
        self.features.n_features()
    }

    /// The reserved skip action, if skipping is enabled.
    #[inline]
    pub const fn skip_action(&self) -> Option<usize> {
        if self.allow_skip {
            Some(self.cache_size)
        } else {
            None
        }
    }

    /// Current lifecycle phase.
    #[inline]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns `true` once the trace is exhausted or the step budget is spent.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Read-only view of the cache state.
    #[inline]
    pub const fn state(&self) -> &CacheState {
        &self.state
    }

    /// Running counters for the current episode.
    #[inline]
    pub const fn stats(&self) -> &CacheStats {
        &self.state.stats
    }

    /// The replayed trace.
    #[inline]
    pub const fn trace(&self) -> &Trace {
        &self.trace
    }

    /// The feature extractor in use.
    #[inline]
    pub const fn extractor(&self) -> &FeatureExtractor {
        &self.features
    }

    /// The access the next `step()` will consume.
    #[inline]
    pub fn pending(&self) -> Option<&AccessRecord> {
        self.trace.get(self.state.cursor)
    }

    /// Accesses consumed this episode.
    #[inline]
    pub const fn total_count(&self) -> u64 {
        self.state.stats.accesses
    }

    /// Misses this episode.
    #[inline]
    pub const fn miss_count(&self) -> u64 {
        self.state.stats.misses
    }

    /// `miss_count / total_count`, or `0.0` before any access.
    #[inline]
    pub fn miss_rate(&self) -> f64 {
        self.state.stats.miss_rate()
    }

    /// Observation of the current state.
    pub fn observe(&self) -> Observation {
        self.features.extract(&self.state, self.pending())
    }

    /// Clears all slots, counters, and reward state and rewinds to the first access.
    ///
    /// Returns the initial observation, which is identical on every call for a
    /// given trace. An empty trace (or a zero step budget) resets straight to `Done`.
    pub fn reset(&mut self) -> Observation {
        self.state.clear();
        self.reward.reset();
        self.steps = 0;

        self.phase = if self.trace.is_empty() || self.max_steps == Some(0) {
            if self.trace.is_empty() {
                warn!("resetting over an empty trace; episode is done immediately");
            }
            Phase::Done
        } else {
            Phase::Ready
        };
        self.observe()
    }

    /// Consumes the access at the cursor, using `action` to resolve a miss.
    ///
    /// `action` is consulted only on a miss: when skipping is enabled and
    /// `action` is the skip value the access is dropped; otherwise a free slot is
    /// filled if one exists, and when the cache is full `action` names the slot to
    /// evict. An out-of-range eviction falls back to slot 0 and is reported in
    /// the returned event.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateError` before the first `reset()` and after `Done`.
    pub fn step(&mut self, action: usize) -> std::result::Result<Step, InvalidStateError> {
        if matches!(self.phase, Phase::Uninitialized | Phase::Done) {
            return Err(InvalidStateError { phase: self.phase });
        }
        let Some(&access) = self.trace.get(self.state.cursor) else {
            self.phase = Phase::Done;
            return Err(InvalidStateError { phase: self.phase });
        };

        let event = self.resolve(access, action);

        let stats = &mut self.state.stats;
        stats.accesses += 1;
        if access.op.is_write() {
            stats.writes += 1;
        } else {
            stats.reads += 1;
        }
        *self.state.history.entry(access.block).or_insert(0) += 1;
        self.state.cursor += 1;
        self.steps += 1;

        let reward = self.reward.reward(&event);

        let exhausted = self.state.cursor >= self.trace.len();
        let budget_spent = self.max_steps.is_some_and(|max| self.steps >= max);
        let done = exhausted || budget_spent;
        self.phase = if done { Phase::Done } else { Phase::Running };
        if done {
            debug!(
                accesses = self.state.stats.accesses,
                misses = self.state.stats.misses,
                budget_spent,
                "episode finished"
            );
        }

        Ok(Step {
            observation: self.observe(),
            reward,
            done,
            event,
        })
    }

    fn resolve(&mut self, access: AccessRecord, action: usize) -> StepEvent {
        let now = self.state.clock();
        let is_write = access.op.is_write();
        let slots = &mut self.state.slots;
        let stats = &mut self.state.stats;

        if let Some(slot) = slots.find(access.block) {
            slots.touch(slot, now, is_write);
            stats.hits += 1;
            return StepEvent::Hit { slot };
        }

        stats.misses += 1;

        if self.allow_skip && action == self.cache_size {
            stats.skips += 1;
            return StepEvent::Skip;
        }

        if let Some(slot) = slots.first_free() {
            let _ = slots.install(slot, access.block, now, is_write);
            stats.fills += 1;
            return StepEvent::Fill { slot };
        }

        let (slot, fallback) = if action < self.cache_size {
            (action, None)
        } else {
            let fault = OutOfRangeAction {
                action,
                cache_size: self.cache_size,
            };
            // Warn once per episode; the rest are counted in the stats.
            if stats.invalid_actions == 0 {
                warn!(%fault, "evicting slot 0 instead");
            } else {
                debug!(%fault, "evicting slot 0 instead");
            }
            stats.invalid_actions += 1;
            (0, Some(fault))
        };

        // The cache is full, so the chosen slot is always occupied.
        let evicted = slots.install(slot, access.block, now, is_write);
        stats.evictions += 1;
        let (victim, victim_age, dirty) = evicted.map_or((0, 0, false), |e| {
            (e.block, now.saturating_sub(e.meta.last_access), e.meta.dirty)
        });
        if dirty {
            stats.writebacks += 1;
        }
        StepEvent::Evict {
            slot,
            victim,
            victim_age,
            dirty,
            fallback,
        }
    }
}
