//! Notebook channel adapter
//!
//! Notebook outlines are flat: author and send time sit at the top level.

use crate::types::{ChannelKind, ContentItem};
use serde::Deserialize;
use serde_json::Value;

use super::{build_item, is_empty_entry, ChannelPayloadAdapter, RawTimestamp};

/// Notebook payload adapter
pub struct DiaryAdapter;

impl ChannelPayloadAdapter for DiaryAdapter {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Note
    }

    fn extract(&self, channel_id: &str, entry: &Value) -> Option<ContentItem> {
        if is_empty_entry(entry) {
            return None;
        }
        let outline = Outline::deserialize(entry).ok()?;
        build_item(self.kind(), channel_id, outline.author, outline.sent)
    }
}

#[derive(Debug, Deserialize)]
struct Outline {
    author: Option<String>,
    sent: Option<RawTimestamp>,
}
