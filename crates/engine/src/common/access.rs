//! Storage Access Records.
//!
//! A trace is an ordered list of these records. Insertion order is the
//! temporal order of the recorded accesses and is preserved exactly.

use serde::{Deserialize, Serialize};

/// Block (sector) address on the traced device.
pub type BlockAddr = u64;

/// Type of block access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Block read. Encoded as `1` in the `read/write` trace column.
    Read,
    /// Block write. Encoded as `0` in the `read/write` trace column.
    ///
    /// Writes mark the resident slot dirty.
    Write,
}

impl Operation {
    /// Decodes the `read/write` column flag.
    ///
    /// Returns `None` for anything other than `1` (read) or `0` (write).
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "1" => Some(Self::Read),
            "0" => Some(Self::Write),
            _ => None,
        }
    }

    /// Returns `true` for writes.
    #[inline]
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Write)
    }
}

/// One traced access: the block touched and how.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessRecord {
    /// Block address being accessed.
    pub block: BlockAddr,
    /// Read or write.
    pub op: Operation,
}

impl AccessRecord {
    /// Creates a read access to `block`.
    #[inline]
    pub const fn read(block: BlockAddr) -> Self {
        Self {
            block,
            op: Operation::Read,
        }
    }

    /// Creates a write access to `block`.
    #[inline]
    pub const fn write(block: BlockAddr) -> Self {
        Self {
            block,
            op: Operation::Write,
        }
    }
}
