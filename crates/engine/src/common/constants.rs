//! Simulator-wide constants.

/// Trace column holding the block (sector) address.
pub const COL_BLOCK: &str = "blocksector";

/// Trace column holding the operation flag (`1` = read, `0` = write).
pub const COL_OPERATION: &str = "read/write";

/// Optional trace column holding the boot/exec phase flag.
pub const COL_PHASE: &str = "boot/exec";

/// Feature value emitted for slots with no occupant.
pub const EMPTY_SLOT_SENTINEL: f64 = -1.0;

/// Seed used by the Random policy when none is configured.
pub const DEFAULT_RANDOM_SEED: u64 = 123456789;
