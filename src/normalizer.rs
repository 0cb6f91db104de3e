//! Content normalization
//!
//! This module flattens every resolved channel payload of a snapshot into one
//! list of [`ContentItem`]s.
//! - Channel kind picks the adapter
//! - Entries without author or timestamp are dropped silently
//! - Pending and failed channels contribute nothing

use crate::adapters::adapter_for;
use crate::snapshot::ContentSnapshot;
use crate::types::{ChannelKind, ContentItem};
use serde_json::Value;
use tracing::debug;

/// Normalizer for converting raw channel payloads to content items
pub struct ContentNormalizer;

impl ContentNormalizer {
    /// Normalize all resolved channels of a snapshot, in channel id order
    pub fn normalize(snapshot: &ContentSnapshot) -> Vec<ContentItem> {
        let mut items = Vec::new();

        for (channel_id, payload) in snapshot.resolved() {
            items.extend(Self::normalize_channel(channel_id, payload));
        }

        debug!(items = items.len(), channels = snapshot.len(), "normalized content");
        items
    }

    /// Normalize one channel's payload.
    ///
    /// Returns an empty list for channels of unknown kind.
    pub fn normalize_channel(channel_id: &str, payload: &Value) -> Vec<ContentItem> {
        let Some(kind) = ChannelKind::from_channel_id(channel_id) else {
            debug!(channel = %channel_id, "unknown channel kind, skipping");
            return Vec::new();
        };
        let adapter = adapter_for(kind);

        let entries = payload_entries(payload);
        let items: Vec<ContentItem> = entries
            .iter()
            .filter_map(|entry| adapter.extract(channel_id, entry))
            .collect();

        let dropped = entries.len() - items.len();
        if dropped > 0 {
            debug!(
                channel = %channel_id,
                kind = kind.as_str(),
                dropped,
                "dropped incomplete entries"
            );
        }

        items
    }
}

/// Entries of a payload: array elements, or object values in key order
fn payload_entries(payload: &Value) -> Vec<&Value> {
    match payload {
        Value::Array(entries) => entries.iter().collect(),
        Value::Object(entries) => entries.values().collect(),
        _ => Vec::new(),
    }
}
