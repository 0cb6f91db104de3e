//! Series aggregation
//!
//! Reduces cohort tables to per-window scalars for charting. Category series sum
//! `cur`, except churn, which sums `prev` (the volume that went away).

use crate::types::{CohortRecord, CohortSeries, CohortTable};
use serde::{Deserialize, Serialize};

/// Per-window sums for one cohort table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSummary {
    pub new_posts: u64,
    pub expanded_posts: u64,
    pub retained_posts: u64,
    pub resurrected_posts: u64,
    pub contracted_posts: u64,
    pub churned_posts: u64,
    pub total: u64,
    pub value: u64,
}

impl WindowSummary {
    /// Sum one table's records
    pub fn from_records(records: &[CohortRecord]) -> Self {
        let sum_cur = |keep: fn(&CohortRecord) -> bool| -> u64 {
            records.iter().filter(|r| keep(r)).map(|r| r.cur as u64).sum()
        };

        Self {
            new_posts: sum_cur(|r| r.is_new),
            expanded_posts: sum_cur(|r| r.is_expanded),
            retained_posts: sum_cur(|r| r.is_retained),
            resurrected_posts: sum_cur(|r| r.is_resurrected),
            contracted_posts: sum_cur(|r| r.is_contracted),
            churned_posts: records
                .iter()
                .filter(|r| r.is_churned)
                .map(|r| r.prev as u64)
                .sum(),
            total: sum_cur(|r| !r.is_churned),
            value: sum_cur(|r| !r.is_churned && !r.is_contracted),
        }
    }
}

/// Aggregator for building chart series from cohort tables
pub struct SeriesAggregator;

impl SeriesAggregator {
    /// Build series index-aligned with `tables`
    pub fn aggregate(tables: &[CohortTable]) -> CohortSeries {
        let mut series = CohortSeries::default();

        for table in tables {
            let summary = WindowSummary::from_records(&table.records);
            series.new_posts.push(summary.new_posts);
            series.expanded_posts.push(summary.expanded_posts);
            series.retained_posts.push(summary.retained_posts);
            series.resurrected_posts.push(summary.resurrected_posts);
            series.contracted_posts.push(summary.contracted_posts);
            series.churned_posts.push(summary.churned_posts);
            series.total.push(summary.total);
            series.value.push(summary.value);
        }

        series
    }
}

/// One labelled series of a stacked bar chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartDataset {
    pub label: String,
    pub data: Vec<i64>,
}

impl CohortSeries {
    /// Number of windows covered
    pub fn len(&self) -> usize {
        self.total.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total.is_empty()
    }

    /// Category series in stacking order, bottom to top.
    ///
    /// Churn is negated so it draws below the axis.
    pub fn stacked_datasets(&self) -> Vec<ChartDataset> {
        let dataset = |label: &str, data: &[u64], sign: i64| ChartDataset {
            label: label.to_string(),
            data: data.iter().map(|v| *v as i64 * sign).collect(),
        };

        vec![
            dataset("Churned", &self.churned_posts, -1),
            dataset("Contracted", &self.contracted_posts, 1),
            dataset("Retained", &self.retained_posts, 1),
            dataset("Resurrected", &self.resurrected_posts, 1),
            dataset("Expanded", &self.expanded_posts, 1),
            dataset("New", &self.new_posts, 1),
        ]
    }
}
