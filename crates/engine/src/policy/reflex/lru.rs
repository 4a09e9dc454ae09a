//! Least Recently Used (LRU) Eviction Policy.
//!
//! Evicts the resident block whose last access is oldest.
//!
//! # Performance
//!
//! - **Time Complexity:** O(N) per decision, N = cache size
//! - **Best Case:** Workloads with strong temporal locality
//! - **Worst Case:** Cyclic scans over more blocks than slots (every access misses)

use super::{ReflexPolicy, argmin_occupied};
use crate::cache::CacheState;

/// LRU Policy. Stateless: recency lives in the slot metadata.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LruPolicy;

impl LruPolicy {
    /// Creates a new LRU policy instance.
    pub const fn new() -> Self {
        Self
    }
}

impl ReflexPolicy for LruPolicy {
    /// Returns the occupied slot with the smallest last-access tick.
    fn select_victim(&mut self, state: &CacheState) -> usize {
        argmin_occupied(state, |slot| slot.meta.last_access)
    }
}
