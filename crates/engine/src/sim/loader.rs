//! Trace Loader.
//!
//! This module turns recorded block-access logs into the immutable access
//! sequence an environment replays. It performs:
//! 1. **Header resolution:** Locates `blocksector`, `read/write`, and the optional
//!    `boot/exec` column by name; column order and extra columns do not matter.
//! 2. **Row decoding:** Parses block addresses and operation flags, failing with
//!    `TraceFormatError` on the first malformed row.
//! 3. **Phase filtering:** Drops boot-phase rows unless `include_boot` is set.
//! 4. **Concatenation:** Joins several sources in the order supplied.
//!
//! A load that keeps zero rows is reported but is not an error.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::common::constants::{COL_BLOCK, COL_OPERATION, COL_PHASE};
use crate::common::error::{Result, SimError, TraceFormatError};
use crate::common::{AccessRecord, Operation};
use crate::config::TraceConfig;

/// Immutable, cheaply clonable access sequence.
///
/// Clones share one allocation, so a trace can be handed to any number of
/// concurrently running environments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trace {
    records: Arc<[AccessRecord]>,
}

impl Trace {
    /// Wraps an already-built access sequence.
    pub fn new(records: Vec<AccessRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    /// Builds a read-only trace from bare block addresses.
    pub fn from_blocks(blocks: impl IntoIterator<Item = u64>) -> Self {
        Self::new(blocks.into_iter().map(AccessRecord::read).collect())
    }

    /// Aggregate counts over the whole trace.
    pub fn summary(&self) -> TraceSummary {
        let mut unique = HashSet::new();
        let mut writes = 0;
        for r in self.records.iter() {
            let _ = unique.insert(r.block);
            if r.op.is_write() {
                writes += 1;
            }
        }
        TraceSummary {
            accesses: self.records.len(),
            unique_blocks: unique.len(),
            reads: self.records.len() - writes,
            writes,
        }
    }
}

impl Deref for Trace {
    type Target = [AccessRecord];

    fn deref(&self) -> &[AccessRecord] {
        &self.records
    }
}

impl FromIterator<AccessRecord> for Trace {
    fn from_iter<I: IntoIterator<Item = AccessRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Aggregate trace counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TraceSummary {
    /// Total accesses.
    pub accesses: usize,
    /// Distinct block addresses.
    pub unique_blocks: usize,
    /// Read accesses.
    pub reads: usize,
    /// Write accesses.
    pub writes: usize,
}

/// Row counts for one loaded source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceSummary {
    /// Source name (usually its path).
    pub source: String,
    /// Data rows read.
    pub rows: usize,
    /// Rows kept after phase filtering.
    pub kept: usize,
}

/// A loaded trace and per-source counts.
#[derive(Clone, Debug)]
pub struct LoadedTrace {
    /// The concatenated access sequence.
    pub trace: Trace,
    /// One entry per source, in load order.
    pub sources: Vec<SourceSummary>,
}

/// Column positions resolved from a header row.
struct Columns {
    block: usize,
    op: usize,
    phase: Option<usize>,
}

impl Columns {
    fn resolve(source_name: &str, header: &str) -> std::result::Result<Self, TraceFormatError> {
        let names: Vec<&str> = header
            .trim_start_matches('\u{feff}')
            .split(',')
            .map(str::trim)
            .collect();
        let find = |column: &'static str| {
            names
                .iter()
                .position(|n| *n == column)
                .ok_or_else(|| TraceFormatError::MissingColumn {
                    source_name: source_name.to_string(),
                    column,
                })
        };
        Ok(Self {
            block: find(COL_BLOCK)?,
            op: find(COL_OPERATION)?,
            phase: find(COL_PHASE).ok(),
        })
    }
}

/// Parses trace sources into access sequences.
#[derive(Clone, Debug, Default)]
pub struct TraceLoader {
    config: TraceConfig,
}

impl TraceLoader {
    /// Creates a loader with the given filtering options.
    pub const fn new(config: TraceConfig) -> Self {
        Self { config }
    }

    /// Loads and concatenates trace files in the order given.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Io` if a file cannot be opened or read, and
    /// `SimError::TraceFormat` on the first malformed header or row.
    pub fn load_paths<P: AsRef<Path>>(&self, paths: &[P]) -> Result<LoadedTrace> {
        let mut records = Vec::new();
        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let file = File::open(path).map_err(|e| SimError::io(path, e))?;
            let name = path.display().to_string();
            sources.push(self.parse_into(&name, BufReader::new(file), &mut records)?);
        }
        Ok(self.finish(records, sources))
    }

    /// Loads a single trace file.
    ///
    /// # Errors
    ///
    /// See [`TraceLoader::load_paths`].
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<LoadedTrace> {
        self.load_paths(&[path])
    }

    /// Loads a single in-memory or streamed source.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Io` if reading fails and `SimError::TraceFormat` on
    /// malformed input.
    pub fn load_reader(&self, source_name: &str, reader: impl BufRead) -> Result<LoadedTrace> {
        let mut records = Vec::new();
        let summary = self.parse_into(source_name, reader, &mut records)?;
        Ok(self.finish(records, vec![summary]))
    }

    /// Parses one source, appending kept rows to `out`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Io` if reading fails and `SimError::TraceFormat` on
    /// malformed input.
    pub fn parse_into(
        &self,
        source_name: &str,
        reader: impl BufRead,
        out: &mut Vec<AccessRecord>,
    ) -> Result<SourceSummary> {
        let mut lines = reader.lines().enumerate();

        let columns = loop {
            match lines.next() {
                Some((_, line)) => {
                    let line = line.map_err(|e| SimError::io(source_name, e))?;
                    if !line.trim().is_empty() {
                        break Columns::resolve(source_name, &line)?;
                    }
                }
                None => {
                    return Err(TraceFormatError::MissingHeader {
                        source_name: source_name.to_string(),
                    }
                    .into());
                }
            }
        };

        let mut rows = 0;
        let mut kept = 0;
        for (idx, line) in lines {
            let line = line.map_err(|e| SimError::io(source_name, e))?;
            if line.trim().is_empty() {
                continue;
            }
            rows += 1;
            if let Some(record) = self.parse_row(source_name, idx + 1, &line, &columns)? {
                out.push(record);
                kept += 1;
            }
        }

        info!(source = source_name, rows, kept, "loaded trace source");
        Ok(SourceSummary {
            source: source_name.to_string(),
            rows,
            kept,
        })
    }

    fn parse_row(
        &self,
        source_name: &str,
        line_no: usize,
        line: &str,
        columns: &Columns,
    ) -> std::result::Result<Option<AccessRecord>, TraceFormatError> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let field = |idx: usize, column: &'static str| {
            fields
                .get(idx)
                .copied()
                .ok_or_else(|| TraceFormatError::MissingField {
                    source_name: source_name.to_string(),
                    line: line_no,
                    column,
                })
        };

        let phase_filter = columns.phase.filter(|_| !self.config.include_boot);
        if let Some(phase_idx) = phase_filter {
            let raw = field(phase_idx, COL_PHASE)?;
            let phase: u8 = raw.parse().map_err(|_| TraceFormatError::InvalidNumber {
                source_name: source_name.to_string(),
                line: line_no,
                column: COL_PHASE,
                value: raw.to_string(),
            })?;
            if phase != self.config.exec_marker {
                return Ok(None);
            }
        }

        let raw_block = field(columns.block, COL_BLOCK)?;
        let block = raw_block
            .parse()
            .map_err(|_| TraceFormatError::InvalidNumber {
                source_name: source_name.to_string(),
                line: line_no,
                column: COL_BLOCK,
                value: raw_block.to_string(),
            })?;

        let raw_op = field(columns.op, COL_OPERATION)?;
        let op = Operation::from_flag(raw_op).ok_or_else(|| TraceFormatError::InvalidOperation {
            source_name: source_name.to_string(),
            line: line_no,
            value: raw_op.to_string(),
        })?;

        Ok(Some(AccessRecord { block, op }))
    }

    fn finish(&self, records: Vec<AccessRecord>, sources: Vec<SourceSummary>) -> LoadedTrace {
        if records.is_empty() {
            warn!(
                sources = sources.len(),
                include_boot = self.config.include_boot,
                "trace load kept zero accesses"
            );
        }
        LoadedTrace {
            trace: Trace::new(records),
            sources,
        }
    }
}
