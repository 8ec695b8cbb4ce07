//! Durable conversation store record
//!
//! The transport layer persists one [`ConversationState`] per conversation,
//! reading it before each turn and writing it after. The topic tree anchors
//! itself under the `topicsRoot` field; everything else in the record belongs
//! to the transport and rides along untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::state::TopicState;

/// Anchor record for the topic tree within conversation state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicsRootState {
    #[serde(default)]
    pub state: TopicState,
}

/// Per-conversation durable state.
///
/// JSON-serializable; the caller owns persistence. Unknown fields are kept
/// in `extra` so a transport can co-locate its own data in the same record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics_root: Option<TopicsRootState>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }
}
