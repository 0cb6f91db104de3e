//! Content snapshots
//!
//! A snapshot is whatever channel content has resolved at the moment the engine
//! runs. Channels that are still loading or failed contribute no items; the
//! caller learns about them through [`ContentSnapshot::completeness`] and can
//! re-run the engine once more data arrives.

use crate::error::ComputeError;
use crate::types::{ChannelKind, Completeness};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// State of one channel's content at snapshot time
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelState {
    /// Raw payload: an array of entries or an object keyed by entry id
    Resolved(Value),
    /// Fetch still in flight
    Pending,
    /// Fetch failed with the given reason
    Failed(String),
}

impl ChannelState {
    /// Read a channel state from its snapshot-file representation.
    ///
    /// `{"status": "pending"}` and `{"status": "failed", "reason": ".."}` are
    /// status markers; any other value is a resolved payload.
    pub fn from_value(value: Value) -> Self {
        if let Value::Object(map) = &value {
            let only_status_keys = map.keys().all(|k| k == "status" || k == "reason");
            if only_status_keys {
                match map.get("status").and_then(Value::as_str) {
                    Some("pending") => return ChannelState::Pending,
                    Some("failed") => {
                        let reason = map
                            .get("reason")
                            .and_then(Value::as_str)
                            .unwrap_or("unknown error")
                            .to_string();
                        return ChannelState::Failed(reason);
                    }
                    _ => {}
                }
            }
        }
        ChannelState::Resolved(value)
    }

    /// Snapshot-file representation of this state
    pub fn to_value(&self) -> Value {
        match self {
            ChannelState::Resolved(payload) => payload.clone(),
            ChannelState::Pending => serde_json::json!({ "status": "pending" }),
            ChannelState::Failed(reason) => {
                serde_json::json!({ "status": "failed", "reason": reason })
            }
        }
    }
}

/// Upstream collaborator that lists a group's channels and fetches their content
pub trait ContentSource {
    /// Channel ids of a group, tagged by kind prefix
    fn list_channels(&self, group: &str) -> Result<Vec<String>, ComputeError>;

    /// Current content of one channel
    fn fetch_content(&self, channel_id: &str) -> ChannelState;
}

/// Immutable view of a group's channel content
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentSnapshot {
    channels: BTreeMap<String, ChannelState>,
}

impl ContentSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with_channel(mut self, channel_id: impl Into<String>, state: ChannelState) -> Self {
        self.insert(channel_id, state);
        self
    }

    pub fn insert(&mut self, channel_id: impl Into<String>, state: ChannelState) {
        self.channels.insert(channel_id.into(), state);
    }

    /// Take a snapshot of every known-kind channel of `group`.
    ///
    /// Channels whose kind cannot be derived from the id are skipped.
    pub fn collect(source: &dyn ContentSource, group: &str) -> Result<Self, ComputeError> {
        let mut snapshot = Self::new();

        for channel_id in source.list_channels(group)? {
            if ChannelKind::from_channel_id(&channel_id).is_none() {
                debug!(channel = %channel_id, "skipping channel of unknown kind");
                continue;
            }
            let state = source.fetch_content(&channel_id);
            if let ChannelState::Failed(reason) = &state {
                warn!(channel = %channel_id, %reason, "channel fetch failed");
            }
            snapshot.insert(channel_id, state);
        }

        Ok(snapshot)
    }

    /// Parse a snapshot file: `{"channels": {"<id>": <payload | status marker>}}`
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let root: Value = serde_json::from_str(json)?;
        let channels = match root {
            Value::Object(mut map) => match map.remove("channels") {
                Some(Value::Object(channels)) => channels,
                Some(_) => {
                    return Err(ComputeError::ParseError(
                        "\"channels\" must be an object".to_string(),
                    ))
                }
                None => {
                    return Err(ComputeError::ParseError(
                        "missing \"channels\" object".to_string(),
                    ))
                }
            },
            _ => {
                return Err(ComputeError::ParseError(
                    "snapshot must be a JSON object".to_string(),
                ))
            }
        };

        let channels = channels
            .into_iter()
            .map(|(id, value)| (id, ChannelState::from_value(value)))
            .collect();

        Ok(Self { channels })
    }

    /// Serialize back to the snapshot-file format
    pub fn to_json(&self) -> Result<String, ComputeError> {
        let channels: Map<String, Value> = self
            .channels
            .iter()
            .map(|(id, state)| (id.clone(), state.to_value()))
            .collect();
        let root = serde_json::json!({ "channels": channels });
        serde_json::to_string_pretty(&root).map_err(ComputeError::JsonError)
    }

    /// All channels in id order
    pub fn channels(&self) -> impl Iterator<Item = (&str, &ChannelState)> {
        self.channels.iter().map(|(id, state)| (id.as_str(), state))
    }

    /// Resolved payloads in id order
    pub fn resolved(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.channels.iter().filter_map(|(id, state)| match state {
            ChannelState::Resolved(payload) => Some((id.as_str(), payload)),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Which channels have contributed content so far
    pub fn completeness(&self) -> Completeness {
        let mut completeness = Completeness {
            total: self.channels.len(),
            ..Default::default()
        };

        for (id, state) in &self.channels {
            match state {
                ChannelState::Resolved(_) => completeness.resolved += 1,
                ChannelState::Pending => completeness.pending.push(id.clone()),
                ChannelState::Failed(_) => completeness.failed.push(id.clone()),
            }
        }

        completeness
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    struct MockSource {
        channels: Vec<String>,
        content: HashMap<String, ChannelState>,
    }

    impl ContentSource for MockSource {
        fn list_channels(&self, group: &str) -> Result<Vec<String>, ComputeError> {
            if group == "~zod/missing" {
                return Err(ComputeError::SourceError("no such group".to_string()));
            }
            Ok(self.channels.clone())
        }

        fn fetch_content(&self, channel_id: &str) -> ChannelState {
            self.content
                .get(channel_id)
                .cloned()
                .unwrap_or(ChannelState::Pending)
        }
    }

    fn mock_source() -> MockSource {
        let mut content = HashMap::new();
        content.insert(
            "chat/~zod/general".to_string(),
            ChannelState::Resolved(json!([{ "memo": { "author": "~zod", "sent": 1700000 } }])),
        );
        content.insert(
            "diary/~zod/blog".to_string(),
            ChannelState::Failed("timeout".to_string()),
        );
        MockSource {
            channels: vec![
                "chat/~zod/general".to_string(),
                "heap/~zod/links".to_string(),
                "diary/~zod/blog".to_string(),
                "feed/~zod/other".to_string(),
            ],
            content,
        }
    }

    #[test]
    fn test_collect_from_source() {
        let snapshot = ContentSnapshot::collect(&mock_source(), "~zod/group").unwrap();

        // Unknown kind is skipped
        assert_eq!(snapshot.len(), 3);

        let completeness = snapshot.completeness();
        assert_eq!(completeness.total, 3);
        assert_eq!(completeness.resolved, 1);
        assert_eq!(completeness.pending, vec!["heap/~zod/links".to_string()]);
        assert_eq!(completeness.failed, vec!["diary/~zod/blog".to_string()]);
        assert!(completeness.is_incomplete());
    }

    #[test]
    fn test_collect_propagates_listing_error() {
        let result = ContentSnapshot::collect(&mock_source(), "~zod/missing");
        assert!(matches!(result, Err(ComputeError::SourceError(_))));
    }

    #[test]
    fn test_from_json_status_markers() {
        let json = r#"{
            "channels": {
                "chat/~zod/general": [{ "memo": { "author": "~zod", "sent": 1700000 } }],
                "heap/~zod/links": { "status": "pending" },
                "diary/~zod/blog": { "status": "failed", "reason": "502" }
            }
        }"#;

        let snapshot = ContentSnapshot::from_json(json).unwrap();
        let states: Vec<_> = snapshot.channels().collect();

        assert_eq!(states.len(), 3);
        assert_eq!(states[0].0, "chat/~zod/general");
        assert!(matches!(states[0].1, ChannelState::Resolved(_)));
        assert_eq!(states[1].1, &ChannelState::Failed("502".to_string()));
        assert_eq!(states[2].1, &ChannelState::Pending);
    }

    #[test]
    fn test_payload_object_with_status_field_is_resolved() {
        // A keyed payload that happens to contain other keys is still content
        let state = ChannelState::from_value(json!({
            "status": "pending",
            "170.000": { "memo": { "author": "~zod", "sent": 1 } }
        }));
        assert!(matches!(state, ChannelState::Resolved(_)));
    }

    #[test]
    fn test_from_json_rejects_bad_shape() {
        assert!(ContentSnapshot::from_json("[]").is_err());
        assert!(ContentSnapshot::from_json(r#"{"channels": []}"#).is_err());
        assert!(ContentSnapshot::from_json("not json").is_err());
    }

    #[test]
    fn test_json_roundtrip_preserves_states() {
        let snapshot = ContentSnapshot::new()
            .with_channel("chat/~zod/general", ChannelState::Resolved(json!([])))
            .with_channel("heap/~zod/links", ChannelState::Pending)
            .with_channel("diary/~zod/blog", ChannelState::Failed("boom".to_string()));

        let json = snapshot.to_json().unwrap();
        let restored = ContentSnapshot::from_json(&json).unwrap();
        assert_eq!(restored, snapshot);
    }
}
