//! Trace-driven cache replacement simulator library.
//!
//! This crate replays recorded block-level storage accesses against a fixed-capacity
//! cache and benchmarks eviction policies on miss rate:
//! 1. **Trace:** Loading ordered `(block, operation)` records from CSV access logs.
//! 2. **Cache:** The slot arena, hit/miss/eviction state machine, feature extraction, and reward shaping.
//! 3. **Policy:** Reflex policies (Random, LRU, LFU, MRU) and learned policies behind one interface.
//! 4. **Simulation:** Episode control, multi-trace evaluation, and result summaries.
//! 5. **Statistics:** Running counters and console reporting.

/// Common types (access records, operations, constants, errors).
pub mod common;
/// Simulator configuration (defaults, trace/cache/evaluation structures).
pub mod config;
/// Cache environment (slots, features, rewards, step/reset engine).
pub mod cache;
/// Eviction policies (reflex and learned) and transition memory.
pub mod policy;
/// Trace loading, episode control, and result reporting.
pub mod sim;
/// Running cache statistics and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// The cache environment; construct with `CacheEnv::new`.
pub use crate::cache::CacheEnv;
/// Crate-level error and result types.
pub use crate::common::error::{Result, SimError};
/// Closed set of eviction policies dispatched through one interface.
pub use crate::policy::Policy;
/// Shared, immutable access trace.
pub use crate::sim::loader::Trace;
