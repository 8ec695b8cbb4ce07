//! Hierarchical, resumable conversation topics.
//!
//! A conversation is modeled as a tree of topics: units of conversational
//! logic that may delegate to at most one active sub-topic at a time. The
//! whole tree is torn down at the end of every turn and rebuilt from a flat
//! JSON state record at the start of the next one, so arbitrarily deep
//! conversations survive process restarts with no recursive serialization
//! code anywhere.
//!
//! The lifecycle is a dehydrate/rehydrate protocol: activating a sub-topic
//! writes `{ key, state }` into the parent's state slot; reading it back on
//! a later turn rebuilds a blank instance from the keyed factory and
//! overwrites its state wholesale. [`TopicsRoot`] anchors the tree in the
//! per-conversation durable record the transport layer persists.

pub mod context;
pub mod error;
pub mod root;
pub mod state;
pub mod store;
pub mod testing;
pub mod topic;

#[cfg(test)]
mod proptests;

pub use context::TurnContext;
pub use error::{TopicError, TopicResult};
pub use root::TopicsRoot;
pub use state::{ActiveTopicState, TopicData, TopicState};
pub use store::{ConversationState, TopicsRootState};
pub use topic::{Resolution, SubTopicRegistry, Topic, TopicCore};
