//! Channel payload adapters
//!
//! This module provides adapters that read raw channel entries and map them to
//! the uniform [`ContentItem`] shape. Each channel kind stores its author and
//! timestamp in a different place; everything downstream only sees content items.

mod chat;
mod diary;
mod heap;

pub use chat::ChatAdapter;
pub use diary::DiaryAdapter;
pub use heap::HeapAdapter;

use crate::error::ComputeError;
use crate::types::{ChannelKind, ContentItem};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Width of a millisecond epoch timestamp in decimal digits
const EPOCH_MILLIS_DIGITS: usize = 13;

/// Trait for channel payload adapters
pub trait ChannelPayloadAdapter {
    /// Channel kind handled by this adapter
    fn kind(&self) -> ChannelKind;

    /// Map one raw entry to a content item.
    ///
    /// Returns `None` when the entry is empty or has no usable author or timestamp.
    fn extract(&self, channel_id: &str, entry: &Value) -> Option<ContentItem>;
}

/// Adapter for the given channel kind
pub fn adapter_for(kind: ChannelKind) -> &'static dyn ChannelPayloadAdapter {
    match kind {
        ChannelKind::Conversation => &ChatAdapter,
        ChannelKind::Collection => &HeapAdapter,
        ChannelKind::Note => &DiaryAdapter,
    }
}

/// Timestamp as found in raw payloads: a (possibly truncated) integer, sometimes
/// serialized as a string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawTimestamp {
    Int(u64),
    Text(String),
}

impl RawTimestamp {
    pub(crate) fn to_datetime(&self) -> Result<DateTime<Utc>, ComputeError> {
        match self {
            RawTimestamp::Int(value) => pad_timestamp(&value.to_string()),
            RawTimestamp::Text(text) => pad_timestamp(text.trim()),
        }
    }
}

/// Reconstruct a millisecond instant from a truncated integer timestamp.
///
/// The decimal digits are right-padded with `'0'` to 13 places before parsing;
/// longer inputs are parsed as-is. `"1700000"` becomes `1700000000000` ms.
pub fn pad_timestamp(digits: &str) -> Result<DateTime<Utc>, ComputeError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ComputeError::InvalidTimestamp(digits.to_string()));
    }

    let padded = format!("{:0<width$}", digits, width = EPOCH_MILLIS_DIGITS);
    let millis: i64 = padded
        .parse()
        .map_err(|_| ComputeError::InvalidTimestamp(digits.to_string()))?;

    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| ComputeError::InvalidTimestamp(digits.to_string()))
}

/// Build a content item from the fields every adapter extracts
pub(crate) fn build_item(
    kind: ChannelKind,
    channel_id: &str,
    author: Option<String>,
    sent: Option<RawTimestamp>,
) -> Option<ContentItem> {
    let author = author.filter(|a| !a.trim().is_empty())?;
    let sent_at = sent?.to_datetime().ok()?;

    Some(ContentItem {
        author,
        sent_at,
        channel: channel_id.to_string(),
        kind,
    })
}

/// True for entries that carry nothing (`null`, `{}`, `[]`, `""`, `false`)
pub(crate) fn is_empty_entry(entry: &Value) -> bool {
    match entry {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_truncated_timestamp() {
        let dt = pad_timestamp("1700000").unwrap();
        assert_eq!(dt.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_pad_full_width_timestamp_is_unchanged() {
        let dt = pad_timestamp("1700000000123").unwrap();
        assert_eq!(dt.timestamp_millis(), 1_700_000_000_123);
    }

    #[test]
    fn test_pad_keeps_longer_inputs() {
        // 14 digits are not truncated back to 13
        let dt = pad_timestamp("17000000000000").unwrap();
        assert_eq!(dt.timestamp_millis(), 17_000_000_000_000);
    }

    #[test]
    fn test_pad_rejects_non_digits() {
        assert!(pad_timestamp("").is_err());
        assert!(pad_timestamp("17e5").is_err());
        assert!(pad_timestamp("-1700000").is_err());
    }

    #[test]
    fn test_raw_timestamp_accepts_strings() {
        let raw: RawTimestamp = serde_json::from_str("\"1700000\"").unwrap();
        assert_eq!(raw.to_datetime().unwrap().timestamp_millis(), 1_700_000_000_000);

        let raw: RawTimestamp = serde_json::from_str("1700000").unwrap();
        assert_eq!(raw.to_datetime().unwrap().timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_empty_entries() {
        assert!(is_empty_entry(&Value::Null));
        assert!(is_empty_entry(&serde_json::json!({})));
        assert!(is_empty_entry(&serde_json::json!(false)));
        assert!(!is_empty_entry(&serde_json::json!({"author": "~zod"})));
    }

    #[test]
    fn test_adapter_for_kind() {
        for kind in [
            ChannelKind::Conversation,
            ChannelKind::Collection,
            ChannelKind::Note,
        ] {
            assert_eq!(adapter_for(kind).kind(), kind);
        }
    }
}
