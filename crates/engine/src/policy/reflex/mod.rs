//! Reflex Eviction Policies.
//!
//! Deterministic (or seeded) rules that pick a victim slot by inspecting the
//! full cache state rather than the observation vector.
//!
//! # Policies
//!
//! - `Lru`: Least Recently Used.
//! - `Lfu`: Least Frequently Used.
//! - `Mru`: Most Recently Used.
//! - `Random`: Uniform among occupied slots.
//!
//! Ties are broken by the lowest slot index. With no occupied slot every
//! policy returns slot 0, so the result is always a valid index.

/// Least Frequently Used policy.
pub mod lfu;

/// Least Recently Used policy.
pub mod lru;

/// Most Recently Used policy.
pub mod mru;

/// Random policy.
pub mod random;

pub use lfu::LfuPolicy;
pub use lru::LruPolicy;
pub use mru::MruPolicy;
pub use random::RandomPolicy;

use crate::cache::CacheState;
use crate::cache::slot::CacheSlot;

/// Trait for reflex eviction rules.
pub trait ReflexPolicy: Send {
    /// Selects the slot to evict.
    ///
    /// # Arguments
    ///
    /// * `state` - The full cache state.
    ///
    /// # Returns
    ///
    /// A slot index in `[0, cache_size)`.
    fn select_victim(&mut self, state: &CacheState) -> usize;
}

/// Index of the occupied slot with the smallest `key`, lowest index on ties.
pub(crate) fn argmin_occupied<K: Ord>(state: &CacheState, key: impl Fn(&CacheSlot) -> K) -> usize {
    state
        .slots()
        .slots()
        .iter()
        .enumerate()
        .filter(|(_, slot)| slot.is_occupied())
        .min_by_key(|(_, slot)| key(slot))
        .map_or(0, |(idx, _)| idx)
}
