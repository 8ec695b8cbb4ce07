//! Topic tree root
//!
//! [`TopicsRoot`] anchors a topic tree in the conversation's durable state.
//! Binding seeds the `topicsRoot` record on first contact and rebuilds the
//! concrete root from it on every later turn; saving walks the owned tree
//! back into the record so the caller can persist it. Nothing else in the
//! tree writes persistence logic.

use crate::context::TurnContext;
use crate::error::TopicResult;
use crate::state::TopicState;
use crate::store::TopicsRootState;
use crate::topic::{Resolution, Topic};

/// A concrete root topic anchored in durable conversation state.
pub struct TopicsRoot<T: Topic> {
    inner: T,
}

impl<T: Topic> TopicsRoot<T> {
    /// Bind a root topic to the conversation's durable state.
    ///
    /// First-time binding initializes `topicsRoot` with an empty
    /// [`TopicState`]; later bindings rebuild from whatever is already
    /// persisted, active topic included. `make` receives that state and
    /// constructs the concrete root around it.
    pub fn bind(turn: &mut TurnContext<'_>, make: impl FnOnce(TopicState) -> T) -> Self {
        let conversation = turn.conversation();
        if conversation.topics_root.is_none() {
            tracing::debug!("anchoring topic tree in conversation state");
            conversation.topics_root = Some(TopicsRootState::default());
        }
        let state = conversation
            .topics_root
            .as_ref()
            .map(|root| root.state.clone())
            .unwrap_or_default();
        Self { inner: make(state) }
    }

    /// The concrete root topic.
    pub fn topic(&self) -> &T {
        &self.inner
    }

    pub fn topic_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Drive one turn: forward to the root topic, then write the resulting
    /// tree back into the store.
    pub async fn receive(&mut self, turn: &mut TurnContext<'_>) -> TopicResult<Resolution> {
        let resolution = self.inner.on_receive(turn).await?;
        self.save(turn)?;
        Ok(resolution)
    }

    /// Walk the owned topic tree back into the durable record.
    ///
    /// Called automatically by [`receive`](Self::receive); also available for
    /// callers that mutate the tree outside a turn.
    pub fn save(&mut self, turn: &mut TurnContext<'_>) -> TopicResult<()> {
        let snapshot = self.inner.dehydrate()?;
        let state: TopicState = serde_json::from_value(snapshot)?;
        tracing::trace!(?state, "topic tree saved");
        turn.conversation().topics_root = Some(TopicsRootState { state });
        Ok(())
    }
}
