//! Most Recently Used (MRU) Eviction Policy.
//!
//! Evicts the block that was accessed most recently. Kept as an adversarial
//! baseline: on a sequential scan it can never beat LRU, while on cyclic
//! patterns larger than the cache it retains part of the loop.

use std::cmp::Reverse;

use super::{ReflexPolicy, argmin_occupied};
use crate::cache::CacheState;

/// MRU Policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MruPolicy;

impl MruPolicy {
    /// Creates a new MRU policy instance.
    pub const fn new() -> Self {
        Self
    }
}

impl ReflexPolicy for MruPolicy {
    /// Returns the occupied slot with the largest last-access tick.
    fn select_victim(&mut self, state: &CacheState) -> usize {
        argmin_occupied(state, |slot| Reverse(slot.meta.last_access))
    }
}
