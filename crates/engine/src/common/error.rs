//! Error definitions.
//!
//! This module defines every failure the simulator can surface. It provides:
//! 1. **Trace Errors:** Malformed or incomplete trace input (`TraceFormatError`).
//! 2. **Protocol Errors:** Stepping an environment outside its valid phases (`InvalidStateError`).
//! 3. **Recoverable Conditions:** Out-of-range eviction actions (`OutOfRangeAction`), which are
//!    reported alongside a step result rather than returned as an error.
//! 4. **Crate Error:** `SimError`, which wraps the above plus I/O and configuration failures.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::cache::Phase;

/// Malformed trace input.
///
/// Fatal to the load call that produced it; rows are never silently skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceFormatError {
    /// The source has no header row.
    #[error("{source_name}: trace has no header row")]
    MissingHeader {
        /// Name of the trace source (usually its path).
        source_name: String,
    },

    /// A required column is absent from the header.
    #[error("{source_name}: required column '{column}' not found in header")]
    MissingColumn {
        /// Name of the trace source.
        source_name: String,
        /// Name of the missing column.
        column: &'static str,
    },

    /// A row is shorter than the header and lacks a required field.
    #[error("{source_name}:{line}: row has no value for column '{column}'")]
    MissingField {
        /// Name of the trace source.
        source_name: String,
        /// 1-based line number.
        line: usize,
        /// Name of the missing column.
        column: &'static str,
    },

    /// The `read/write` flag is not one of the recognised values.
    #[error("{source_name}:{line}: unrecognised operation flag '{value}' (expected 0 or 1)")]
    InvalidOperation {
        /// Name of the trace source.
        source_name: String,
        /// 1-based line number.
        line: usize,
        /// Raw field contents.
        value: String,
    },

    /// A numeric field could not be parsed.
    #[error("{source_name}:{line}: column '{column}' holds non-numeric value '{value}'")]
    InvalidNumber {
        /// Name of the trace source.
        source_name: String,
        /// 1-based line number.
        line: usize,
        /// Name of the offending column.
        column: &'static str,
        /// Raw field contents.
        value: String,
    },
}

/// `step()` was called while the environment could not accept one.
///
/// Raised before the first `reset()` and after the episode is `Done`.
/// Callers must check `is_done()` before stepping; this is never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("step() called while environment is {phase}")]
pub struct InvalidStateError {
    /// Phase the environment was in when `step()` was attempted.
    pub phase: Phase,
}

/// Eviction index outside `[0, cache_size)`.
///
/// Recovered locally by evicting slot 0; the occurrence is attached to the
/// step event and counted in statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("action {action} outside eviction range [0, {cache_size})")]
pub struct OutOfRangeAction {
    /// Action emitted by the policy.
    pub action: usize,
    /// Number of slots in the cache.
    pub cache_size: usize,
}

/// Crate-level error type.
#[derive(Debug, Error)]
pub enum SimError {
    /// Reading a trace, parameter, or weight file failed.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Trace input is malformed.
    #[error(transparent)]
    TraceFormat(#[from] TraceFormatError),

    /// The environment was stepped outside its valid phases.
    #[error(transparent)]
    InvalidState(#[from] InvalidStateError),

    /// A configuration value is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// JSON (de)serialisation failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An evaluation worker thread panicked.
    #[error("worker for trace '{0}' panicked")]
    Worker(String),
}

impl SimError {
    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SimError>;
