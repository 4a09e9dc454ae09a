//! Common types shared across the cache simulator.
//!
//! This module provides the building blocks used by every other component:
//! 1. **Access Records:** The `(block, operation)` pairs a trace is made of.
//! 2. **Constants:** Trace column names, feature sentinels, and reserved values.
//! 3. **Error Handling:** Trace format, state-machine, and action-range errors.

/// Access record and operation definitions.
pub mod access;

/// Common constants used throughout the simulator.
pub mod constants;

/// Error types.
pub mod error;

pub use access::{AccessRecord, BlockAddr, Operation};
pub use error::{InvalidStateError, OutOfRangeAction, Result, SimError, TraceFormatError};
