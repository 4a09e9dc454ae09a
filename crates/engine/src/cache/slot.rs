//! Fixed-capacity slot arena.
//!
//! Slots are allocated once at construction and addressed by index. Admission
//! and eviction reassign a slot's occupant in place; a block-to-slot index sized
//! to the cache capacity keeps residency lookups O(1) without per-step growth.

use std::collections::HashMap;

use crate::common::BlockAddr;

/// Per-slot bookkeeping consumed by reflex policies and feature extraction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlotMeta {
    /// Tick of the most recent access to the occupant.
    pub last_access: u64,
    /// Accesses to the occupant since it was admitted (admission included).
    pub access_count: u64,
    /// Tick at which the occupant was admitted.
    pub admitted_at: u64,
    /// Set when the occupant has been written since admission.
    pub dirty: bool,
}

/// One cache line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheSlot {
    /// Resident block, if any.
    pub occupant: Option<BlockAddr>,
    /// Metadata for the resident block. Meaningless when `occupant` is `None`.
    pub meta: SlotMeta,
}

impl CacheSlot {
    /// Returns `true` if a block is resident.
    #[inline]
    pub const fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }
}

/// Occupant and metadata displaced by an eviction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Evicted {
    /// Block that was resident.
    pub block: BlockAddr,
    /// Its metadata at the moment of eviction.
    pub meta: SlotMeta,
}

/// The cache's slots, exclusively owned by the environment.
#[derive(Clone, Debug)]
pub struct SlotArena {
    slots: Box<[CacheSlot]>,
    index: HashMap<BlockAddr, usize>,
}

impl SlotArena {
    /// Creates `capacity` empty slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![CacheSlot::default(); capacity].into_boxed_slice(),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Number of slots.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    #[inline]
    pub fn occupied(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` when every slot holds a block.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.index.len() == self.slots.len()
    }

    /// All slots in index order.
    #[inline]
    pub fn slots(&self) -> &[CacheSlot] {
        &self.slots
    }

    /// Slot at `idx`, if in range.
    #[inline]
    pub fn get(&self, idx: usize) -> Option<&CacheSlot> {
        self.slots.get(idx)
    }

    /// Index of the slot holding `block`.
    #[inline]
    pub fn find(&self, block: BlockAddr) -> Option<usize> {
        self.index.get(&block).copied()
    }

    /// Lowest-index empty slot.
    pub fn first_free(&self) -> Option<usize> {
        if self.is_full() {
            return None;
        }
        self.slots.iter().position(|s| !s.is_occupied())
    }

    /// Records a hit on slot `idx` at tick `now`.
    pub fn touch(&mut self, idx: usize, now: u64, is_write: bool) {
        let meta = &mut self.slots[idx].meta;
        meta.last_access = now;
        meta.access_count += 1;
        meta.dirty |= is_write;
    }

    /// Places `block` into slot `idx`, returning the displaced occupant.
    ///
    /// The caller guarantees `idx < capacity()` and that `block` is not resident.
    pub fn install(&mut self, idx: usize, block: BlockAddr, now: u64, is_write: bool) -> Option<Evicted> {
        let slot = &mut self.slots[idx];
        let evicted = slot.occupant.map(|old| Evicted {
            block: old,
            meta: slot.meta,
        });
        if let Some(old) = &evicted {
            let _ = self.index.remove(&old.block);
        }

        *slot = CacheSlot {
            occupant: Some(block),
            meta: SlotMeta {
                last_access: now,
                access_count: 1,
                admitted_at: now,
                dirty: is_write,
            },
        };
        let _ = self.index.insert(block, idx);
        evicted
    }

    /// Empties every slot.
    pub fn clear(&mut self) {
        self.slots.fill(CacheSlot::default());
        self.index.clear();
    }
}
