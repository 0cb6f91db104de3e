//! Core types for the Cohort Flux pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: normalized content items, time windows, cohort records and the
//! aggregated chart series.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Channel kind, derived from the channel identifier prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Chat channels ("writs")
    Conversation,
    /// Gallery/link collections ("curios")
    Collection,
    /// Notebook posts ("outlines")
    Note,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Conversation => "conversation",
            ChannelKind::Collection => "collection",
            ChannelKind::Note => "note",
        }
    }

    /// Resolve the kind of a channel from its identifier.
    ///
    /// Channel ids look like `chat/~zod/general`; the leading segment names the
    /// store the channel lives in. The long kind names are accepted as aliases.
    pub fn from_channel_id(channel_id: &str) -> Option<Self> {
        let prefix = channel_id.split('/').next().unwrap_or_default();
        match prefix {
            "chat" | "conversation" => Some(ChannelKind::Conversation),
            "heap" | "collection" => Some(ChannelKind::Collection),
            "diary" | "note" => Some(ChannelKind::Note),
            _ => None,
        }
    }
}

/// One normalized activity record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Contributor identifier
    pub author: String,
    /// When the post was sent (UTC, millisecond resolution)
    pub sent_at: DateTime<Utc>,
    /// Source channel identifier
    pub channel: String,
    /// Raw shape the item was normalized from
    pub kind: ChannelKind,
}

/// Strategy used to split content into windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionStrategy {
    /// Fixed-length buckets counted back from the as-of instant
    #[default]
    Rolling,
    /// Monday-labelled calendar weeks
    CalendarWeek,
}

impl PartitionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionStrategy::Rolling => "rolling",
            PartitionStrategy::CalendarWeek => "calendar_week",
        }
    }
}

/// A half-open time interval `[start, end)` and the items assigned to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Display label: days-ago for rolling windows, week start date for calendar weeks
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub items: Vec<ContentItem>,
}

impl TimeWindow {
    /// Number of items by `author` in this window
    pub fn count_by(&self, author: &str) -> u32 {
        self.items.iter().filter(|item| item.author == author).count() as u32
    }
}

/// One author's classification within one window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortRecord {
    pub author: String,
    pub window_label: String,
    /// Posts in the window itself
    pub cur: u32,
    /// Posts in the immediately preceding window
    pub prev: u32,
    /// Posts in the window before that
    pub past: u32,
    pub is_new: bool,
    pub is_retained: bool,
    pub is_expanded: bool,
    pub is_resurrected: bool,
    pub is_contracted: bool,
    pub is_churned: bool,
}

/// All cohort records of one window, ordered by descending `cur`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortTable {
    pub label: String,
    pub records: Vec<CohortRecord>,
}

/// Per-window chart series, index-aligned with the window labels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortSeries {
    pub new_posts: Vec<u64>,
    pub expanded_posts: Vec<u64>,
    pub retained_posts: Vec<u64>,
    pub resurrected_posts: Vec<u64>,
    pub contracted_posts: Vec<u64>,
    /// Volume lost: sum of `prev` over churned authors
    pub churned_posts: Vec<u64>,
    /// All posts physically in the window
    pub total: Vec<u64>,
    /// Posts excluding churned and contracted volume
    pub value: Vec<u64>,
}

/// Window labels plus their series, as returned by `build_series`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesOutput {
    pub windows: Vec<String>,
    pub series: CohortSeries,
}

/// Completeness of a content snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completeness {
    /// Channels in the snapshot
    pub total: usize,
    /// Channels whose content resolved
    pub resolved: usize,
    /// Channel ids still pending
    pub pending: Vec<String>,
    /// Channel ids whose fetch failed
    pub failed: Vec<String>,
}

impl Completeness {
    /// True when some channels have not contributed content
    pub fn is_incomplete(&self) -> bool {
        !self.pending.is_empty() || !self.failed.is_empty()
    }
}
