//! Period partitioning
//!
//! Splits normalized content into windows ordered oldest to newest. Window `i`'s
//! predecessor is `i - 1` and its pre-predecessor `i - 2`.
//! - Rolling: fixed-length buckets counted back from the as-of instant
//! - Calendar week: buckets keyed by [`week_label`]

use crate::config::EngineConfig;
use crate::error::ComputeError;
use crate::types::{ContentItem, PartitionStrategy, TimeWindow};
use crate::week::week_label;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeMap;
use tracing::debug;

/// Partitioner for splitting content into time windows
pub struct Partitioner;

impl Partitioner {
    /// Partition with the strategy and settings of `config`
    pub fn partition(
        items: &[ContentItem],
        config: &EngineConfig,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<TimeWindow>, ComputeError> {
        let windows = match config.strategy {
            PartitionStrategy::Rolling => {
                Self::rolling(items, as_of, &config.rolling_offsets_days, config.window_days)?
            }
            PartitionStrategy::CalendarWeek => Self::calendar_weeks(items),
        };

        debug!(
            strategy = config.strategy.as_str(),
            windows = windows.len(),
            "partitioned content"
        );
        Ok(windows)
    }

    /// One window `[as_of - offset, as_of - offset + window_days)` per offset.
    ///
    /// Offsets are visited largest first so the result runs oldest to newest.
    /// Every window is produced even when empty; items outside all windows are
    /// discarded. Fails when a window bound falls outside the representable
    /// date range.
    pub fn rolling(
        items: &[ContentItem],
        as_of: DateTime<Utc>,
        offsets_days: &[u32],
        window_days: u32,
    ) -> Result<Vec<TimeWindow>, ComputeError> {
        let mut offsets = offsets_days.to_vec();
        offsets.sort_unstable_by(|a, b| b.cmp(a));
        offsets.dedup();

        offsets
            .into_iter()
            .map(|offset| {
                let (start, end) = rolling_bounds(as_of, offset, window_days)?;
                let window_items = items
                    .iter()
                    .filter(|item| item.sent_at >= start && item.sent_at < end)
                    .cloned()
                    .collect();

                Ok(TimeWindow {
                    label: offset.to_string(),
                    start,
                    end,
                    items: window_items,
                })
            })
            .collect()
    }

    /// Group items by calendar week, sorted ascending by week label.
    ///
    /// Only weeks with content produce a window. Bounds are the labelled Monday
    /// plus seven days; membership is decided by the week key.
    pub fn calendar_weeks(items: &[ContentItem]) -> Vec<TimeWindow> {
        let mut by_week: BTreeMap<String, Vec<ContentItem>> = BTreeMap::new();

        for item in items {
            match week_label(item.sent_at) {
                Some(label) => by_week.entry(label).or_default().push(item.clone()),
                None => debug!(sent_at = %item.sent_at, "no week label for item"),
            }
        }

        by_week
            .into_iter()
            .filter_map(|(label, items)| {
                let start = NaiveDate::parse_from_str(&label, "%Y-%m-%d")
                    .ok()?
                    .and_hms_opt(0, 0, 0)?
                    .and_utc();
                Some(TimeWindow {
                    end: start + Duration::weeks(1),
                    start,
                    label,
                    items,
                })
            })
            .collect()
    }
}

/// `[as_of - offset, as_of - offset + window_days)`, checked against the date range
fn rolling_bounds(
    as_of: DateTime<Utc>,
    offset_days: u32,
    window_days: u32,
) -> Result<(DateTime<Utc>, DateTime<Utc>), ComputeError> {
    let out_of_range = || {
        ComputeError::InvalidConfig(format!(
            "rolling window {} days back of {} days from {} is out of range",
            offset_days, window_days, as_of
        ))
    };

    let start = as_of
        .checked_sub_signed(Duration::days(offset_days as i64))
        .ok_or_else(out_of_range)?;
    let end = start
        .checked_add_signed(Duration::days(window_days as i64))
        .ok_or_else(out_of_range)?;
    Ok((start, end))
}
