//! Result summary file.
//!
//! One record per (trace, policy) pair: the policy name and its mean miss rate
//! as a percentage rounded to two decimals. Written as a pretty-printed JSON
//! array after an evaluation completes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::controller::{PolicySummary, TraceEvaluation};
use crate::common::error::{Result, SimError};

/// Mean miss rate of one policy on one trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Policy display name.
    pub algorithm: String,
    /// Mean miss rate in percent, rounded to two decimals.
    pub miss_rate: f64,
    /// Trace the policy was evaluated on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

impl ResultRecord {
    /// Builds a record from a policy summary, without a trace name.
    pub fn from_summary(summary: &PolicySummary) -> Self {
        Self {
            algorithm: summary.policy.clone(),
            miss_rate: percent(summary.mean),
            trace: None,
        }
    }
}

/// Converts a ratio to a percentage rounded to two decimals.
fn percent(ratio: f64) -> f64 {
    (ratio * 10_000.0).round() / 100.0
}

/// Flattens evaluations into records, trace by trace, in policy order.
pub fn collect_records(evaluations: &[TraceEvaluation]) -> Vec<ResultRecord> {
    evaluations
        .iter()
        .flat_map(|eval| {
            eval.summaries.iter().map(|summary| ResultRecord {
                trace: Some(eval.trace.clone()),
                ..ResultRecord::from_summary(summary)
            })
        })
        .collect()
}

/// Writes `records` as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns `SimError::Io` if the file cannot be written.
pub fn write_results(path: impl AsRef<Path>, records: &[ResultRecord]) -> Result<()> {
    let path = path.as_ref();
    let text = serde_json::to_string_pretty(records)?;
    fs::write(path, text).map_err(|e| SimError::io(path, e))?;
    info!(path = %path.display(), records = records.len(), "results written");
    Ok(())
}

/// Reads a results file written by [`write_results`].
///
/// # Errors
///
/// Returns `SimError::Io` if the file cannot be read and `SimError::Json` if
/// it does not parse.
pub fn read_results(path: impl AsRef<Path>) -> Result<Vec<ResultRecord>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| SimError::io(path, e))?;
    Ok(serde_json::from_str(&text)?)
}
