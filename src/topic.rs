//! Topic lifecycle core
//!
//! A topic is one node of the conversation tree: it owns a persisted state
//! record, optional completion handlers, a registry of sub-topic factories,
//! and at most one active child rebuilt lazily from that record.
//!
//! The protocol is "dehydrate on set, rehydrate on read": activating a child
//! writes `{ key, state }` into the parent's slot; reading the child back on
//! a later turn builds a blank instance from the keyed factory and overwrites
//! its state wholesale with the slot contents. Factories therefore must
//! tolerate zero-argument construction purely to obtain an object whose
//! behavior is attached before its data is replaced.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::context::TurnContext;
use crate::error::{TopicError, TopicResult};
use crate::state::{ActiveTopicState, TopicData};

/// Outcome of handing a turn to a topic.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The topic consumed the turn and expects more input.
    Pending,
    /// The topic completed, carrying its serialized result value.
    Success(Value),
    /// The topic gave up, with a reason.
    Failure(String),
}

impl Resolution {
    /// True for `Success` and `Failure`; the parent's cue to clear its
    /// active-topic slot and run its own completion chain.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Resolution::Pending)
    }
}

/// Object-safe surface a parent drives its active child through.
#[async_trait]
pub trait Topic: Send {
    /// Handle the current turn. Called once per turn while this topic is at
    /// the frontier of activity.
    ///
    /// Implementers that delegate must materialize their child through the
    /// active-topic accessor, forward the turn, and clear the slot themselves
    /// when the child resolves; the core never auto-clears.
    async fn on_receive(&mut self, turn: &mut TurnContext<'_>) -> TopicResult<Resolution>;

    /// Snapshot the full persisted state, syncing any live child into its
    /// slot first.
    fn dehydrate(&mut self) -> TopicResult<Value>;

    /// Overwrite the persisted state wholesale from a snapshot.
    fn rehydrate(&mut self, state: Value) -> TopicResult<()>;
}

type TopicFactory = Box<dyn Fn() -> Box<dyn Topic> + Send + Sync>;

/// Registry of named sub-topic factories.
///
/// Keys must stay stable for the lifetime of persisted state: a dehydrated
/// `ActiveTopicState.key` is meaningless once its factory is renamed or
/// removed.
#[derive(Default)]
pub struct SubTopicRegistry {
    entries: HashMap<String, TopicFactory>,
}

impl SubTopicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a zero-argument factory under `key`, builder style.
    #[must_use]
    pub fn with(
        mut self,
        key: impl Into<String>,
        factory: impl Fn() -> Box<dyn Topic> + Send + Sync + 'static,
    ) -> Self {
        self.entries.insert(key.into(), Box::new(factory));
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    fn build(&self, key: &str) -> TopicResult<Box<dyn Topic>> {
        self.entries
            .get(key)
            .map(|factory| factory())
            .ok_or_else(|| TopicError::UnknownSubTopic(key.to_string()))
    }
}

type SuccessHandler<V> = Box<dyn FnMut(&mut TurnContext<'_>, &V) + Send>;
type FailureHandler = Box<dyn FnMut(&mut TurnContext<'_>, &str) + Send>;

/// Reusable core every concrete topic embeds.
///
/// `S` is the topic's persisted state record, `V` the value it produces on
/// successful completion. The core owns the state, the completion handlers,
/// the sub-topic registry, and the memoized active-child cache; concrete
/// topics supply `on_receive` and delegate the trait's dehydrate/rehydrate
/// to it.
pub struct TopicCore<S: TopicData, V: Serialize> {
    state: S,
    on_success: Option<SuccessHandler<V>>,
    on_failure: Option<FailureHandler>,
    sub_topics: SubTopicRegistry,
    /// Active child materialized this turn, if any. Rebuilt at most once per
    /// turn from the state slot.
    active: Option<Box<dyn Topic>>,
}

impl<S: TopicData, V: Serialize> TopicCore<S, V> {
    /// Bind a core to a state record with no sub-topics.
    pub fn new(state: S) -> Self {
        Self::with_sub_topics(state, SubTopicRegistry::new())
    }

    /// Bind a core to a state record and a sub-topic registry.
    pub fn with_sub_topics(state: S, sub_topics: SubTopicRegistry) -> Self {
        Self {
            state,
            on_success: None,
            on_failure: None,
            sub_topics,
            active: None,
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    pub fn sub_topics(&self) -> &SubTopicRegistry {
        &self.sub_topics
    }

    /// Register the success handler, replacing any previous one.
    ///
    /// Handlers are behavior, not data: they are never persisted, and the
    /// code that rebuilds a topic re-attaches them fresh each turn.
    pub fn on_success(
        &mut self,
        handler: impl FnMut(&mut TurnContext<'_>, &V) + Send + 'static,
    ) -> &mut Self {
        self.on_success = Some(Box::new(handler));
        self
    }

    /// Register the failure handler, replacing any previous one.
    pub fn on_failure(
        &mut self,
        handler: impl FnMut(&mut TurnContext<'_>, &str) + Send + 'static,
    ) -> &mut Self {
        self.on_failure = Some(Box::new(handler));
        self
    }

    /// Complete successfully: fire the success handler (if any) and produce
    /// the resolution the parent will observe.
    pub fn resolve_success(
        &mut self,
        turn: &mut TurnContext<'_>,
        value: V,
    ) -> TopicResult<Resolution> {
        if let Some(handler) = self.on_success.as_mut() {
            handler(turn, &value);
        }
        Ok(Resolution::Success(serde_json::to_value(&value)?))
    }

    /// Fail: fire the failure handler (if any) and produce the resolution
    /// the parent will observe.
    pub fn resolve_failure(
        &mut self,
        turn: &mut TurnContext<'_>,
        reason: impl Into<String>,
    ) -> Resolution {
        let reason = reason.into();
        if let Some(handler) = self.on_failure.as_mut() {
            handler(turn, &reason);
        }
        Resolution::Failure(reason)
    }

    /// Activate the sub-topic registered under `key`, replacing any current
    /// active topic without a deactivation hook.
    ///
    /// The new child is dehydrated into the state slot immediately, so the
    /// parent's record is persist-ready from the moment of activation.
    pub fn set_active_topic(&mut self, key: &str) -> TopicResult<&mut dyn Topic> {
        let child = self.sub_topics.build(key)?;
        self.install_active(key, child)
    }

    /// Activate a caller-constructed instance under `key`.
    ///
    /// This is the first-turn path for topics whose constructors take
    /// arguments. `key` must still be registered: later turns rebuild the
    /// topic through the zero-argument factory before overwriting its state.
    pub fn set_active_topic_with(
        &mut self,
        key: &str,
        child: Box<dyn Topic>,
    ) -> TopicResult<&mut dyn Topic> {
        if !self.sub_topics.contains(key) {
            return Err(TopicError::UnknownSubTopic(key.to_string()));
        }
        self.install_active(key, child)
    }

    fn install_active(&mut self, key: &str, mut child: Box<dyn Topic>) -> TopicResult<&mut dyn Topic> {
        let snapshot = child.dehydrate()?;
        *self.state.active_topic_mut() = Some(ActiveTopicState {
            key: key.to_string(),
            state: snapshot,
        });
        tracing::debug!(key, "active sub-topic set");
        Ok(&mut **self.active.insert(child))
    }

    /// The active sub-topic, rehydrating it from the state slot on first
    /// access this turn.
    ///
    /// Returns `Ok(None)` when no sub-topic is active; repeated calls within
    /// a turn return the same instance without reconstructing it.
    pub fn active_topic(&mut self) -> TopicResult<Option<&mut dyn Topic>> {
        let Some(slot) = self.state.active_topic() else {
            return Ok(None);
        };

        if self.active.is_none() {
            let key = slot.key.clone();
            let persisted = slot.state.clone();
            let mut child = self.sub_topics.build(&key)?;
            child.rehydrate(persisted)?;
            self.active = Some(child);
            tracing::debug!(key = %key, "active sub-topic rehydrated");
        }

        Ok(self.active.as_mut().map(|child| &mut **child as &mut dyn Topic))
    }

    /// Whether a sub-topic is currently active.
    pub fn has_active_topic(&self) -> bool {
        self.state.active_topic().is_some()
    }

    /// Abandon the active sub-topic, whether or not it completed. Idempotent.
    pub fn clear_active_topic(&mut self) {
        if self.state.active_topic().is_some() {
            tracing::debug!("active sub-topic cleared");
        }
        *self.state.active_topic_mut() = None;
        self.active = None;
    }

    /// Sync the live child (if any) into the state slot.
    ///
    /// The owned-tree counterpart of shared-by-reference state: mutations a
    /// child made to itself this turn become visible in the parent's record.
    fn sync_active(&mut self) -> TopicResult<()> {
        if let Some(child) = self.active.as_mut() {
            if let Some(slot) = self.state.active_topic_mut().as_mut() {
                slot.state = child.dehydrate()?;
            }
        }
        Ok(())
    }

    /// Snapshot this topic's full persisted state, active child included.
    pub fn dehydrate(&mut self) -> TopicResult<Value> {
        self.sync_active()?;
        Ok(serde_json::to_value(&self.state)?)
    }

    /// Overwrite this topic's state wholesale from a persisted snapshot.
    ///
    /// Invalidates the active-child cache: the next accessor read rebuilds
    /// from the new slot.
    pub fn rehydrate(&mut self, state: Value) -> TopicResult<()> {
        self.state = serde_json::from_value(state)?;
        self.active = None;
        Ok(())
    }
}
