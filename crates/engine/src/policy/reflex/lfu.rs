//! Least Frequently Used (LFU) Eviction Policy.
//!
//! Evicts the resident block with the fewest accesses since admission.
//! Counts reset when a block is evicted, so a returning block starts over.

use super::{ReflexPolicy, argmin_occupied};
use crate::cache::CacheState;

/// LFU Policy. Stateless: frequency lives in the slot metadata.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LfuPolicy;

impl LfuPolicy {
    /// Creates a new LFU policy instance.
    pub const fn new() -> Self {
        Self
    }
}

impl ReflexPolicy for LfuPolicy {
    /// Returns the occupied slot with the lowest access count.
    fn select_victim(&mut self, state: &CacheState) -> usize {
        argmin_occupied(state, |slot| slot.meta.access_count)
    }
}
