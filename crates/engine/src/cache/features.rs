//! Observation Feature Extraction.
//!
//! Turns the cache state and the pending access into a fixed-width numeric
//! vector. Extraction is a pure function of its inputs: the extractor holds
//! only its selection, and the same state always yields the same vector.
//!
//! # Layout
//!
//! Selected sets are concatenated in selection order. With `n` slots:
//!
//! - `Base` (`3n + 2`): per slot `[occupied, recency, frequency]`, then
//!   `[pending_resident, pending_frequency]`.
//! - `UT` (`n`): per slot ticks since last access over elapsed ticks.
//! - `CT` (`n`): per slot ticks since admission over elapsed ticks.
//!
//! Empty slots report `0.0` occupancy and `EMPTY_SLOT_SENTINEL` for every
//! other per-slot value. Once the trace is exhausted the pending pair is also
//! `EMPTY_SLOT_SENTINEL`.

use serde::{Deserialize, Serialize};

use super::CacheState;
use crate::common::AccessRecord;
use crate::common::constants::EMPTY_SLOT_SENTINEL;
use crate::config::FeatureSet;

/// A fixed-width observation vector.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Observation(Vec<f64>);

impl Observation {
    /// Wraps raw feature values.
    pub const fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// Feature values.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Number of features.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for a zero-width observation.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the observation, returning its values.
    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl AsRef<[f64]> for Observation {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

impl FeatureSet {
    /// Number of values this set contributes for a cache of `cache_size` slots.
    pub const fn width(self, cache_size: usize) -> usize {
        match self {
            Self::Base => 3 * cache_size + 2,
            Self::UsageTime | Self::CachedTime => cache_size,
        }
    }
}

/// Stateless feature extractor for one selection and cache size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureExtractor {
    selection: Vec<FeatureSet>,
    cache_size: usize,
    n_features: usize,
}

impl FeatureExtractor {
    /// Creates an extractor for `selection` over `cache_size` slots.
    pub fn new(selection: &[FeatureSet], cache_size: usize) -> Self {
        let n_features = selection.iter().map(|f| f.width(cache_size)).sum();
        Self {
            selection: selection.to_vec(),
            cache_size,
            n_features,
        }
    }

    /// Observation width; constant for the extractor's lifetime.
    #[inline]
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Selected feature sets, in output order.
    pub fn selection(&self) -> &[FeatureSet] {
        &self.selection
    }

    /// Builds the observation for `state` with `pending` as the next access.
    pub fn extract(&self, state: &CacheState, pending: Option<&AccessRecord>) -> Observation {
        debug_assert_eq!(state.slots().capacity(), self.cache_size);
        let mut out = Vec::with_capacity(self.n_features);
        for set in &self.selection {
            match set {
                FeatureSet::Base => push_base(state, pending, &mut out),
                FeatureSet::UsageTime => push_usage_time(state, &mut out),
                FeatureSet::CachedTime => push_cached_time(state, &mut out),
            }
        }
        debug_assert_eq!(out.len(), self.n_features);
        Observation(out)
    }
}

/// Convenience wrapper: extract with a throwaway extractor.
pub fn extract(state: &CacheState, pending: Option<&AccessRecord>, selection: &[FeatureSet]) -> Observation {
    FeatureExtractor::new(selection, state.slots().capacity()).extract(state, pending)
}

/// Elapsed ticks, floored at 1 so ratios stay finite on a fresh cache.
#[inline]
fn elapsed(state: &CacheState) -> f64 {
    state.clock().max(1) as f64
}

fn push_base(state: &CacheState, pending: Option<&AccessRecord>, out: &mut Vec<f64>) {
    let now = state.clock();
    let span = elapsed(state);
    for slot in state.slots().slots() {
        if slot.is_occupied() {
            let age = now.saturating_sub(slot.meta.last_access);
            out.push(1.0);
            out.push(1.0 / (1.0 + age as f64));
            out.push(slot.meta.access_count as f64 / span);
        } else {
            out.push(0.0);
            out.push(EMPTY_SLOT_SENTINEL);
            out.push(EMPTY_SLOT_SENTINEL);
        }
    }

    match pending {
        Some(access) => {
            let resident = state.slots().find(access.block).is_some();
            out.push(if resident { 1.0 } else { 0.0 });
            out.push(state.history_count(access.block) as f64 / span);
        }
        None => {
            out.push(EMPTY_SLOT_SENTINEL);
            out.push(EMPTY_SLOT_SENTINEL);
        }
    }
}

fn push_usage_time(state: &CacheState, out: &mut Vec<f64>) {
    let now = state.clock();
    let span = elapsed(state);
    out.extend(state.slots().slots().iter().map(|slot| {
        if slot.is_occupied() {
            now.saturating_sub(slot.meta.last_access) as f64 / span
        } else {
            EMPTY_SLOT_SENTINEL
        }
    }));
}

fn push_cached_time(state: &CacheState, out: &mut Vec<f64>) {
    let now = state.clock();
    let span = elapsed(state);
    out.extend(state.slots().slots().iter().map(|slot| {
        if slot.is_occupied() {
            now.saturating_sub(slot.meta.admitted_at) as f64 / span
        } else {
            EMPTY_SLOT_SENTINEL
        }
    }));
}
