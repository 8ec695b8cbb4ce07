//! Persisted topic state types
//!
//! Everything a topic needs to survive a turn boundary lives here. The wire
//! format is camelCase JSON: the same blobs remain readable regardless of
//! which transport layer persisted them.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Dehydrated reference to the currently active sub-topic.
///
/// `key` names the factory in the owning topic's registry that can rebuild
/// the sub-topic on a later turn; `state` is the sub-topic's own persisted
/// state record, opaque to the parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveTopicState {
    pub key: String,
    pub state: Value,
}

/// Base persisted shape every topic's state satisfies.
///
/// Concrete topics extend this structurally: their own state struct carries
/// the active-topic slot alongside arbitrary domain fields and implements
/// [`TopicData`] to expose it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_topic: Option<ActiveTopicState>,
}

impl TopicState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Contract a topic's persisted state record must meet.
///
/// The only structural requirement is the active-topic slot; the rest of the
/// record is owned by the concrete topic type.
pub trait TopicData: Serialize + DeserializeOwned + Send {
    fn active_topic(&self) -> Option<&ActiveTopicState>;
    fn active_topic_mut(&mut self) -> &mut Option<ActiveTopicState>;
}

impl TopicData for TopicState {
    fn active_topic(&self) -> Option<&ActiveTopicState> {
        self.active_topic.as_ref()
    }

    fn active_topic_mut(&mut self) -> &mut Option<ActiveTopicState> {
        &mut self.active_topic
    }
}
