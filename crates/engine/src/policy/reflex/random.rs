//! Random Eviction Policy.
//!
//! Evicts an occupied slot chosen uniformly at random. The generator is seeded
//! once at construction and keeps running across episodes, so repeated
//! episodes sample different victims while a whole run stays reproducible.

use super::ReflexPolicy;
use crate::cache::CacheState;
use crate::policy::rng::XorShift64;

/// Random Policy state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RandomPolicy {
    rng: XorShift64,
}

impl RandomPolicy {
    /// Creates a new Random policy seeded with `seed`.
    pub const fn new(seed: u64) -> Self {
        Self {
            rng: XorShift64::new(seed),
        }
    }
}

impl ReflexPolicy for RandomPolicy {
    fn select_victim(&mut self, state: &CacheState) -> usize {
        let slots = state.slots();
        let occupied = slots.occupied();
        if occupied == 0 {
            return 0;
        }
        let pick = self.rng.below(occupied);
        slots
            .slots()
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_occupied())
            .nth(pick)
            .map_or(0, |(idx, _)| idx)
    }
}
