//! Collection channel adapter
//!
//! Collection entries ("curios") carry author and send time in `heart`.

use crate::types::{ChannelKind, ContentItem};
use serde::Deserialize;
use serde_json::Value;

use super::{build_item, is_empty_entry, ChannelPayloadAdapter, RawTimestamp};

/// Collection payload adapter
pub struct HeapAdapter;

impl ChannelPayloadAdapter for HeapAdapter {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Collection
    }

    fn extract(&self, channel_id: &str, entry: &Value) -> Option<ContentItem> {
        if is_empty_entry(entry) {
            return None;
        }
        let curio = Curio::deserialize(entry).ok()?;
        let heart = curio.heart?;
        build_item(self.kind(), channel_id, heart.author, heart.sent)
    }
}

#[derive(Debug, Deserialize)]
struct Curio {
    heart: Option<Heart>,
}

#[derive(Debug, Deserialize)]
struct Heart {
    author: Option<String>,
    sent: Option<RawTimestamp>,
}
