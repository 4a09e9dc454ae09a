//! Transition Replay Memory.
//!
//! A bounded FIFO of `(observation, action, reward, next_observation)` tuples
//! that a learned policy absorbs during evaluation. The contents can be sampled
//! in batches or exported as JSON lines for offline improvement by an external
//! trainer; nothing here updates a model.

use std::collections::VecDeque;
use std::io::Write;

use serde::{Deserialize, Serialize};

use super::rng::XorShift64;
use crate::cache::features::Observation;
use crate::common::error::Result;

/// One environment transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Observation the action was chosen from.
    pub observation: Observation,
    /// Action taken.
    pub action: usize,
    /// Reward received.
    pub reward: f64,
    /// Observation after the step.
    pub next_observation: Observation,
    /// The step ended the episode.
    pub done: bool,
}

/// Bounded transition buffer; the oldest entry is dropped when full.
#[derive(Clone, Debug)]
pub struct ReplayMemory {
    buffer: VecDeque<Transition>,
    capacity: usize,
    absorbed: u64,
}

impl ReplayMemory {
    /// Creates a buffer holding at most `capacity` transitions.
    ///
    /// Storage grows with use; `capacity` only bounds it.
    pub const fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::new(),
            capacity,
            absorbed: 0,
        }
    }

    /// Maximum number of retained transitions.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of retained transitions.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` if nothing is retained.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Transitions absorbed over the buffer's lifetime, including dropped ones.
    #[inline]
    pub const fn absorbed(&self) -> u64 {
        self.absorbed
    }

    /// Appends a transition, dropping the oldest if full.
    pub fn push(&mut self, transition: Transition) {
        self.absorbed += 1;
        if self.capacity == 0 {
            return;
        }
        if self.buffer.len() == self.capacity {
            let _ = self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
    }

    /// Retained transitions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }

    /// Samples `batch_size` transitions uniformly with replacement.
    ///
    /// Returns an empty batch when the buffer is empty.
    pub fn sample(&self, batch_size: usize, rng: &mut XorShift64) -> Vec<&Transition> {
        if self.buffer.is_empty() {
            return Vec::new();
        }
        (0..batch_size)
            .filter_map(|_| self.buffer.get(rng.below(self.buffer.len())))
            .collect()
    }

    /// Writes every retained transition as one JSON object per line.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Json` if serialisation or the underlying write fails.
    pub fn export_jsonl(&self, mut writer: impl Write) -> Result<()> {
        for transition in &self.buffer {
            serde_json::to_writer(&mut writer, transition)?;
            writer
                .write_all(b"\n")
                .map_err(serde_json::Error::io)?;
        }
        Ok(())
    }

    /// Drops every retained transition.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
