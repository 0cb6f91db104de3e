//! Cohort Flux - Engagement-cohort analytics for group content streams
//!
//! Flux turns a snapshot of a group's channel content into per-window author
//! cohorts through a deterministic pipeline: channel adaptation → normalization
//! → window partitioning → cohort classification → series aggregation.
//!
//! ## Modules
//!
//! - **Snapshot**: Channel payloads with their fetch state (resolved, pending, failed)
//! - **Cohort Pipeline**: Classify authors as new, retained, expanded, resurrected,
//!   contracted or churned per window, and sum them into chart series

pub mod adapters;
pub mod aggregator;
pub mod breakout;
pub mod classifier;
pub mod config;
pub mod encoder;
pub mod error;
pub mod export;
pub mod normalizer;
pub mod partition;
pub mod pipeline;
pub mod snapshot;
pub mod types;
pub mod week;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::EngineConfig;
pub use error::ComputeError;
pub use pipeline::{
    analyze, build_series, export_flat, get_breakout, snapshot_to_series_json, CohortReport,
};
pub use snapshot::{ChannelState, ContentSnapshot, ContentSource};
pub use types::{
    ChannelKind, CohortRecord, CohortSeries, CohortTable, Completeness, ContentItem,
    PartitionStrategy, SeriesOutput, TimeWindow,
};

/// Flux version embedded in all series payloads
pub const FLUX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for series payloads
pub const PRODUCER_NAME: &str = "cohort-flux";
