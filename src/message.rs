use serde_derive::{Deserialize, Serialize};

use crate::block::Block;

/// Body of `chat.postMessage`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostMessage {
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Block>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
}

impl PostMessage {
    pub fn text(channel: impl Into<String>, text: impl Into<String>) -> Self {
        PostMessage {
            channel: channel.into(),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn blocks(channel: impl Into<String>, blocks: Vec<Block>) -> Self {
        PostMessage {
            channel: channel.into(),
            blocks,
            ..Default::default()
        }
    }

    pub fn in_thread(mut self, thread_ts: impl Into<String>) -> Self {
        self.thread_ts = Some(thread_ts.into());
        self
    }
}

/// Envelope every Web API method answers with.
#[derive(Debug, Deserialize)]
pub struct ApiReply {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}
