//! Engine configuration
//!
//! All settings have defaults, so an empty JSON object is a valid config.

use crate::error::ComputeError;
use crate::types::PartitionStrategy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default rolling window starts, in days before the as-of instant
pub const DEFAULT_ROLLING_OFFSETS: [u32; 4] = [120, 90, 60, 30];

/// Default rolling window length in days
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Settings for one engine run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How content is split into windows
    pub strategy: PartitionStrategy,
    /// Instant rolling windows are measured against; `None` means now
    pub as_of: Option<DateTime<Utc>>,
    /// Start of each rolling window, in days before `as_of`
    pub rolling_offsets_days: Vec<u32>,
    /// Length of each rolling window in days
    pub window_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strategy: PartitionStrategy::default(),
            as_of: None,
            rolling_offsets_days: DEFAULT_ROLLING_OFFSETS.to_vec(),
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

impl EngineConfig {
    /// Default config with the given strategy
    pub fn with_strategy(strategy: PartitionStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Pin the as-of instant
    pub fn as_of(mut self, as_of: DateTime<Utc>) -> Self {
        self.as_of = Some(as_of);
        self
    }

    /// Load and validate a config from JSON
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ComputeError> {
        if self.window_days == 0 {
            return Err(ComputeError::InvalidConfig(
                "window_days must be positive".to_string(),
            ));
        }
        if self.strategy == PartitionStrategy::Rolling {
            if self.rolling_offsets_days.is_empty() {
                return Err(ComputeError::InvalidConfig(
                    "rolling_offsets_days must not be empty".to_string(),
                ));
            }
            if self.rolling_offsets_days.contains(&0) {
                return Err(ComputeError::InvalidConfig(
                    "rolling_offsets_days must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// The as-of instant, falling back to the current time
    pub fn resolve_as_of(&self) -> DateTime<Utc> {
        self.as_of.unwrap_or_else(Utc::now)
    }
}
