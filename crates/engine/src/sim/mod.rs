//! Simulation driving.
//!
//! Provides trace loading, the episode controller that runs policies against
//! an environment, and the result summary written after an evaluation.

/// Episode control and multi-trace evaluation.
pub mod controller;
/// Trace loading.
pub mod loader;
/// Result summaries.
pub mod report;
