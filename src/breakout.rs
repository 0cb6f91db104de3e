//! Breakout selection
//!
//! The breakout is the per-author leaderboard of one window. Which window is
//! shown is the caller's state; this is a plain lookup into computed tables.

use crate::error::ComputeError;
use crate::types::{CohortRecord, CohortTable};

/// Records of window `index`, already sorted by descending `cur`
pub fn breakout(tables: &[CohortTable], index: usize) -> Result<&[CohortRecord], ComputeError> {
    tables
        .get(index)
        .map(|table| table.records.as_slice())
        .ok_or(ComputeError::WindowOutOfRange {
            index,
            len: tables.len(),
        })
}
