//! Reward Shaping.
//!
//! Maps each step's outcome to a scalar reward under the model selected by
//! `RewardParams`. The shaper owns the only mutable reward state (the running
//! maximum victim age used to normalise the `our` eviction term); it is cleared
//! on every environment reset so episodes stay independent.

use super::StepEvent;
use crate::config::RewardParams;

/// Stateful reward calculator for one environment.
#[derive(Clone, Debug, PartialEq)]
pub struct RewardShaper {
    params: RewardParams,
    max_victim_age: u64,
}

impl RewardShaper {
    /// Creates a shaper for `params`.
    pub const fn new(params: RewardParams) -> Self {
        Self {
            params,
            max_victim_age: 0,
        }
    }

    /// Coefficients in use.
    pub const fn params(&self) -> &RewardParams {
        &self.params
    }

    /// Largest victim age observed since the last reset.
    pub const fn max_victim_age(&self) -> u64 {
        self.max_victim_age
    }

    /// Clears running state.
    pub const fn reset(&mut self) {
        self.max_victim_age = 0;
    }

    /// Computes the reward for `event`, updating running state.
    pub fn reward(&mut self, event: &StepEvent) -> f64 {
        if let StepEvent::Evict { victim_age, .. } = *event {
            self.max_victim_age = self.max_victim_age.max(victim_age);
        }

        match self.params {
            RewardParams::Basic { hit, miss, skip } => match event {
                StepEvent::Hit { .. } => hit,
                StepEvent::Fill { .. } | StepEvent::Evict { .. } => miss,
                StepEvent::Skip => skip,
            },
            RewardParams::Our {
                alpha,
                psi,
                mu,
                beta,
            } => match *event {
                StepEvent::Hit { .. } => mu,
                StepEvent::Fill { .. } => -alpha,
                StepEvent::Evict { victim_age, .. } => {
                    let horizon = psi.max(self.max_victim_age as f64);
                    let freshness = 1.0 - (victim_age as f64).min(horizon) / horizon;
                    -alpha - beta * freshness
                }
                StepEvent::Skip => -alpha - beta,
            },
        }
    }
}
