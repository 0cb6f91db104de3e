//! Chat channel adapter
//!
//! Chat entries ("writs") keep their author and send time in a nested `memo`.

use crate::types::{ChannelKind, ContentItem};
use serde::Deserialize;
use serde_json::Value;

use super::{build_item, is_empty_entry, ChannelPayloadAdapter, RawTimestamp};

/// Chat payload adapter
pub struct ChatAdapter;

impl ChannelPayloadAdapter for ChatAdapter {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Conversation
    }

    fn extract(&self, channel_id: &str, entry: &Value) -> Option<ContentItem> {
        if is_empty_entry(entry) {
            return None;
        }
        let writ = Writ::deserialize(entry).ok()?;
        let memo = writ.memo?;
        build_item(self.kind(), channel_id, memo.author, memo.sent)
    }
}

#[derive(Debug, Deserialize)]
struct Writ {
    memo: Option<Memo>,
}

#[derive(Debug, Deserialize)]
struct Memo {
    author: Option<String>,
    sent: Option<RawTimestamp>,
}
