//! Pipeline orchestration
//!
//! This module provides the public API for Cohort Flux.
//! It runs the full pipeline from a content snapshot to series and leaderboards.
//! Every entry point is a pure function of its inputs: the same snapshot,
//! strategy and as-of instant always yield the same output.

use crate::aggregator::SeriesAggregator;
use crate::breakout::breakout;
use crate::classifier::CohortClassifier;
use crate::config::EngineConfig;
use crate::encoder::ReportEncoder;
use crate::error::ComputeError;
use crate::export::flatten;
use crate::normalizer::ContentNormalizer;
use crate::partition::Partitioner;
use crate::snapshot::ContentSnapshot;
use crate::types::{
    CohortRecord, CohortSeries, CohortTable, Completeness, PartitionStrategy, SeriesOutput,
    TimeWindow,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Bounds and size of one window, without its items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub items: usize,
}

impl From<&TimeWindow> for WindowInfo {
    fn from(window: &TimeWindow) -> Self {
        Self {
            label: window.label.clone(),
            start: window.start,
            end: window.end,
            items: window.items.len(),
        }
    }
}

/// Everything one engine run computes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortReport {
    pub strategy: PartitionStrategy,
    pub as_of: DateTime<Utc>,
    pub windows: Vec<WindowInfo>,
    pub tables: Vec<CohortTable>,
    pub series: CohortSeries,
    /// Channels that did not contribute; computed independently of the engine
    pub completeness: Completeness,
}

impl CohortReport {
    /// Window labels, oldest first
    pub fn labels(&self) -> Vec<String> {
        self.windows.iter().map(|w| w.label.clone()).collect()
    }

    pub fn series_output(&self) -> SeriesOutput {
        SeriesOutput {
            windows: self.labels(),
            series: self.series.clone(),
        }
    }

    /// Leaderboard of window `index`
    pub fn breakout(&self, index: usize) -> Result<&[CohortRecord], ComputeError> {
        breakout(&self.tables, index)
    }

    /// One row per (window, author)
    pub fn flat_records(&self) -> Vec<CohortRecord> {
        flatten(&self.tables)
    }
}

/// Run the full pipeline.
///
/// Pipeline stages:
/// 1. ContentNormalizer - Flatten resolved channel payloads to content items
/// 2. Partitioner - Split items into ordered windows
/// 3. CohortClassifier - Classify authors per window
/// 4. SeriesAggregator - Sum classifications into chart series
pub fn analyze(snapshot: &ContentSnapshot, config: &EngineConfig) -> Result<CohortReport, ComputeError> {
    config.validate()?;
    let as_of = config.resolve_as_of();

    let completeness = snapshot.completeness();
    if completeness.is_incomplete() {
        warn!(
            pending = completeness.pending.len(),
            failed = completeness.failed.len(),
            "snapshot is incomplete, results cover resolved channels only"
        );
    }

    // Stage 1: Normalize content
    let items = ContentNormalizer::normalize(snapshot);

    // Stage 2: Partition into windows
    let windows = Partitioner::partition(&items, config, as_of)?;

    // Stage 3: Classify cohorts
    let tables = CohortClassifier::classify(&windows);

    // Stage 4: Aggregate series
    let series = SeriesAggregator::aggregate(&tables);

    info!(
        strategy = config.strategy.as_str(),
        items = items.len(),
        windows = windows.len(),
        "cohort analysis complete"
    );

    Ok(CohortReport {
        strategy: config.strategy,
        as_of,
        windows: windows.iter().map(WindowInfo::from).collect(),
        tables,
        series,
        completeness,
    })
}

/// Window labels and chart series for a snapshot
pub fn build_series(
    snapshot: &ContentSnapshot,
    strategy: PartitionStrategy,
    as_of: DateTime<Utc>,
) -> Result<SeriesOutput, ComputeError> {
    let config = EngineConfig::with_strategy(strategy).as_of(as_of);
    Ok(analyze(snapshot, &config)?.series_output())
}

/// Leaderboard of one window; fails when `window_index` is out of range
pub fn get_breakout(
    snapshot: &ContentSnapshot,
    strategy: PartitionStrategy,
    as_of: DateTime<Utc>,
    window_index: usize,
) -> Result<Vec<CohortRecord>, ComputeError> {
    let config = EngineConfig::with_strategy(strategy).as_of(as_of);
    let report = analyze(snapshot, &config)?;
    Ok(report.breakout(window_index)?.to_vec())
}

/// Flat rows for tabular export
pub fn export_flat(
    snapshot: &ContentSnapshot,
    strategy: PartitionStrategy,
    as_of: DateTime<Utc>,
) -> Result<Vec<CohortRecord>, ComputeError> {
    let config = EngineConfig::with_strategy(strategy).as_of(as_of);
    Ok(analyze(snapshot, &config)?.flat_records())
}

/// Convert a snapshot JSON document to an encoded series payload.
///
/// # Arguments
/// * `snapshot_json` - Snapshot file contents (`{"channels": {...}}`)
/// * `config_json` - Engine config JSON; `None` uses defaults
///
/// # Example
/// ```ignore
/// let payload = snapshot_to_series_json(snapshot_json, None)?;
/// ```
pub fn snapshot_to_series_json(
    snapshot_json: &str,
    config_json: Option<&str>,
) -> Result<String, ComputeError> {
    let snapshot = ContentSnapshot::from_json(snapshot_json)?;
    let config = match config_json {
        Some(json) => EngineConfig::from_json(json)?,
        None => EngineConfig::default(),
    };
    let report = analyze(&snapshot, &config)?;
    ReportEncoder::new().encode_to_json(&report)
}
