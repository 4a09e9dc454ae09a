//! Learned Policy Parameter File.
//!
//! A flat JSON record of numeric and categorical hyperparameters, plus the best
//! miss rate the producing search achieved. Written by an external optimiser and
//! read only when constructing a learned policy; the environment never sees it.
//! Keys this crate does not interpret are preserved on round-trip.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::error::{Result, SimError};
use crate::config::PolicyKind;

/// Replay capacity used when the file does not specify `memory_size`.
const DEFAULT_MEMORY_SIZE: usize = 10_000;

/// Batch size used when the file does not specify `batch_size`.
const DEFAULT_BATCH_SIZE: usize = 128;

/// Hyperparameter record for a learned policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyParams {
    /// Optimiser step size used during training
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_rate: Option<f64>,
    /// Discount factor used during training
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_decay: Option<f64>,
    /// Lower bound of the exploration rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e_greedy_min: Option<f64>,
    /// Upper bound of the exploration rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e_greedy_max: Option<f64>,
    /// Initial exploration rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e_greedy_init: Option<f64>,
    /// Exploration rate increment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e_greedy_increment: Option<f64>,
    /// Exploration rate decrement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e_greedy_decrement: Option<f64>,
    /// Reward level that toggles exploration adjustments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_threshold: Option<f64>,
    /// Window of rewards considered for exploration adjustments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_size: Option<u64>,
    /// Steps between exploration adjustments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_e_greedy_iter: Option<u64>,
    /// Reflex policy consulted when exploring
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explore_mentor: Option<PolicyKind>,
    /// Steps between target network refreshes during training
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace_target_iter: Option<u64>,
    /// Replay memory capacity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_size: Option<usize>,
    /// Replay sample batch size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
    /// Best miss rate achieved by the search that produced this record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_miss_rate: Option<f64>,
    /// Keys not interpreted here
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl PolicyParams {
    /// Reads a parameter file.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Io` if the file cannot be read, `SimError::Json` if it
    /// does not parse, and `SimError::Config` if a value is out of range.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| SimError::io(path, e))?;
        let params: Self = serde_json::from_str(&text)?;
        params.validate()?;
        Ok(params)
    }

    /// Writes the record as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Io` if the file cannot be written.
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).map_err(|e| SimError::io(path, e))
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Config` for an exploration rate outside `[0, 1]` or a
    /// mentor other than LRU or LFU.
    pub fn validate(&self) -> Result<()> {
        let rates = [
            ("e_greedy_min", self.e_greedy_min),
            ("e_greedy_max", self.e_greedy_max),
            ("e_greedy_init", self.e_greedy_init),
        ];
        for (key, value) in rates {
            match value {
                Some(v) if !(0.0..=1.0).contains(&v) => {
                    return Err(SimError::Config(format!("{key} must lie in [0, 1], got {v}")));
                }
                _ => {}
            }
        }
        match self.explore_mentor {
            None | Some(PolicyKind::Lru | PolicyKind::Lfu) => Ok(()),
            Some(other) => Err(SimError::Config(format!(
                "explore_mentor must be LRU or LFU, got {other}"
            ))),
        }
    }

    /// Exploration rate applied at evaluation time: the configured floor.
    pub fn exploration_rate(&self) -> f64 {
        self.e_greedy_min.unwrap_or(0.0)
    }

    /// Replay memory capacity.
    pub fn memory_capacity(&self) -> usize {
        self.memory_size.unwrap_or(DEFAULT_MEMORY_SIZE)
    }

    /// Replay sample batch size.
    pub fn batch(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE)
    }
}
