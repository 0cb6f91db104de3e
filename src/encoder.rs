//! Report encoding
//!
//! This module encodes a computed cohort report into a versioned JSON payload
//! with producer metadata, ready for a charting front-end.

use crate::aggregator::ChartDataset;
use crate::error::ComputeError;
use crate::pipeline::{CohortReport, WindowInfo};
use crate::types::{CohortSeries, Completeness};
use crate::{FLUX_VERSION, PRODUCER_NAME};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current payload schema version
pub const PAYLOAD_VERSION: &str = "1.0.0";

/// Producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Encoded series payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesPayload {
    pub payload_version: String,
    pub producer: Producer,
    pub computed_at_utc: String,
    pub as_of_utc: String,
    pub strategy: String,
    /// Channels still pending or failed when the snapshot was taken
    pub completeness: Completeness,
    pub windows: Vec<WindowInfo>,
    pub series: CohortSeries,
    /// Stacked chart series, churn negated
    pub datasets: Vec<ChartDataset>,
}

/// Encoder for producing series payloads
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Encode a report into a series payload
    pub fn encode(&self, report: &CohortReport) -> SeriesPayload {
        SeriesPayload {
            payload_version: PAYLOAD_VERSION.to_string(),
            producer: Producer {
                name: PRODUCER_NAME.to_string(),
                version: FLUX_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            as_of_utc: report.as_of.to_rfc3339(),
            strategy: report.strategy.as_str().to_string(),
            completeness: report.completeness.clone(),
            windows: report.windows.clone(),
            series: report.series.clone(),
            datasets: report.series.stacked_datasets(),
        }
    }

    /// Encode to JSON string
    pub fn encode_to_json(&self, report: &CohortReport) -> Result<String, ComputeError> {
        let payload = self.encode(report);
        serde_json::to_string_pretty(&payload).map_err(ComputeError::JsonError)
    }
}
