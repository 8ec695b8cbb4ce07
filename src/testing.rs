//! Scripted topics and store helpers for testing
//!
//! These exercise the topic lifecycle without a real transport layer: a few
//! small concrete topics, a delegating root, and a helper that forces state
//! through its serialized form the way a transport does between turns.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::TurnContext;
use crate::error::TopicResult;
use crate::state::{ActiveTopicState, TopicData, TopicState};
use crate::store::ConversationState;
use crate::topic::{Resolution, SubTopicRegistry, Topic, TopicCore};

// ============================================================================
// CountingTopic - smallest possible stateful topic
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountingState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_topic: Option<ActiveTopicState>,
    pub count: u32,
}

impl TopicData for CountingState {
    fn active_topic(&self) -> Option<&ActiveTopicState> {
        self.active_topic.as_ref()
    }

    fn active_topic_mut(&mut self) -> &mut Option<ActiveTopicState> {
        &mut self.active_topic
    }
}

/// Topic that increments a counter every turn and never resolves.
pub struct CountingTopic {
    core: TopicCore<CountingState, u32>,
}

impl CountingTopic {
    pub fn new() -> Self {
        Self {
            core: TopicCore::new(CountingState::default()),
        }
    }

    /// Start the counter somewhere other than zero.
    pub fn starting_at(count: u32) -> Self {
        Self {
            core: TopicCore::new(CountingState {
                active_topic: None,
                count,
            }),
        }
    }

    pub fn count(&self) -> u32 {
        self.core.state().count
    }
}

impl Default for CountingTopic {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Topic for CountingTopic {
    async fn on_receive(&mut self, turn: &mut TurnContext<'_>) -> TopicResult<Resolution> {
        self.core.state_mut().count += 1;
        turn.reply(format!("count is {}", self.core.state().count));
        Ok(Resolution::Pending)
    }

    fn dehydrate(&mut self) -> TopicResult<Value> {
        self.core.dehydrate()
    }

    fn rehydrate(&mut self, state: Value) -> TopicResult<()> {
        self.core.rehydrate(state)
    }
}

// ============================================================================
// GreetingTopic - two-step prompt
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GreetingState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_topic: Option<ActiveTopicState>,
    pub asked: bool,
}

impl TopicData for GreetingState {
    fn active_topic(&self) -> Option<&ActiveTopicState> {
        self.active_topic.as_ref()
    }

    fn active_topic_mut(&mut self) -> &mut Option<ActiveTopicState> {
        &mut self.active_topic
    }
}

/// Topic that asks for a name on its first turn and greets on the second,
/// resolving with the name it heard.
pub struct GreetingTopic {
    core: TopicCore<GreetingState, String>,
}

impl GreetingTopic {
    pub fn new() -> Self {
        Self {
            core: TopicCore::new(GreetingState::default()),
        }
    }

    /// Fluent success-handler registration; replaces any previous handler.
    #[must_use]
    pub fn on_success(
        mut self,
        handler: impl FnMut(&mut TurnContext<'_>, &String) + Send + 'static,
    ) -> Self {
        self.core.on_success(handler);
        self
    }

    /// Fluent failure-handler registration; replaces any previous handler.
    #[must_use]
    pub fn on_failure(
        mut self,
        handler: impl FnMut(&mut TurnContext<'_>, &str) + Send + 'static,
    ) -> Self {
        self.core.on_failure(handler);
        self
    }

    pub fn asked(&self) -> bool {
        self.core.state().asked
    }
}

impl Default for GreetingTopic {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Topic for GreetingTopic {
    async fn on_receive(&mut self, turn: &mut TurnContext<'_>) -> TopicResult<Resolution> {
        if !self.core.state().asked {
            self.core.state_mut().asked = true;
            turn.reply("What is your name?");
            return Ok(Resolution::Pending);
        }

        let name = turn.message().to_string();
        if name.is_empty() {
            return Ok(self.core.resolve_failure(turn, "no name given"));
        }
        turn.reply(format!("Hello, {name}!"));
        self.core.resolve_success(turn, name)
    }

    fn dehydrate(&mut self) -> TopicResult<Value> {
        self.core.dehydrate()
    }

    fn rehydrate(&mut self, state: Value) -> TopicResult<()> {
        self.core.rehydrate(state)
    }
}

// ============================================================================
// ScriptedTopic - records messages, resolves on trigger words
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptedState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_topic: Option<ActiveTopicState>,
    #[serde(default)]
    pub started: bool,
    #[serde(default)]
    pub heard: Vec<String>,
}

impl TopicData for ScriptedState {
    fn active_topic(&self) -> Option<&ActiveTopicState> {
        self.active_topic.as_ref()
    }

    fn active_topic_mut(&mut self) -> &mut Option<ActiveTopicState> {
        &mut self.active_topic
    }
}

/// Topic that records every message; "done" resolves with everything heard,
/// "abort" fails.
pub struct ScriptedTopic {
    core: TopicCore<ScriptedState, Vec<String>>,
}

impl ScriptedTopic {
    pub fn new() -> Self {
        Self {
            core: TopicCore::new(ScriptedState::default()),
        }
    }

    pub fn heard(&self) -> &[String] {
        &self.core.state().heard
    }
}

impl Default for ScriptedTopic {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Topic for ScriptedTopic {
    async fn on_receive(&mut self, turn: &mut TurnContext<'_>) -> TopicResult<Resolution> {
        if !self.core.state().started {
            self.core.state_mut().started = true;
            turn.reply("recording; say 'done' when finished");
            return Ok(Resolution::Pending);
        }

        let message = turn.message().to_string();
        match message.as_str() {
            "done" => {
                let heard = self.core.state().heard.clone();
                self.core.resolve_success(turn, heard)
            }
            "abort" => Ok(self.core.resolve_failure(turn, "aborted by user")),
            _ => {
                self.core.state_mut().heard.push(message);
                turn.reply(format!("heard {} so far", self.core.state().heard.len()));
                Ok(Resolution::Pending)
            }
        }
    }

    fn dehydrate(&mut self) -> TopicResult<Value> {
        self.core.dehydrate()
    }

    fn rehydrate(&mut self, state: Value) -> TopicResult<()> {
        self.core.rehydrate(state)
    }
}

// ============================================================================
// EchoTopic - resolves on the turn it starts
// ============================================================================

/// Topic that echoes one message and resolves immediately with it.
pub struct EchoTopic {
    core: TopicCore<TopicState, String>,
}

impl EchoTopic {
    pub fn new() -> Self {
        Self {
            core: TopicCore::new(TopicState::new()),
        }
    }
}

impl Default for EchoTopic {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Topic for EchoTopic {
    async fn on_receive(&mut self, turn: &mut TurnContext<'_>) -> TopicResult<Resolution> {
        let message = turn.message().to_string();
        turn.reply(format!("you said {message}"));
        self.core.resolve_success(turn, message)
    }

    fn dehydrate(&mut self) -> TopicResult<Value> {
        self.core.dehydrate()
    }

    fn rehydrate(&mut self, state: Value) -> TopicResult<()> {
        self.core.rehydrate(state)
    }
}

// ============================================================================
// RelayTopic - middle layer that only delegates
// ============================================================================

/// Topic whose only job is to sit between a root and a counting grandchild:
/// it starts the child on its first turn and forwards every turn after that.
pub struct RelayTopic {
    core: TopicCore<TopicState, ()>,
}

impl RelayTopic {
    pub fn new() -> Self {
        let registry = SubTopicRegistry::new()
            .with("counting", || Box::new(CountingTopic::new()) as Box<dyn Topic>);
        Self {
            core: TopicCore::with_sub_topics(TopicState::new(), registry),
        }
    }
}

impl Default for RelayTopic {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Topic for RelayTopic {
    async fn on_receive(&mut self, turn: &mut TurnContext<'_>) -> TopicResult<Resolution> {
        if let Some(child) = self.core.active_topic()? {
            child.on_receive(turn).await?;
        } else {
            let child = self.core.set_active_topic("counting")?;
            child.on_receive(turn).await?;
        }
        Ok(Resolution::Pending)
    }

    fn dehydrate(&mut self) -> TopicResult<Value> {
        self.core.dehydrate()
    }

    fn rehydrate(&mut self, state: Value) -> TopicResult<()> {
        self.core.rehydrate(state)
    }
}

// ============================================================================
// LobbyTopic - delegating root
// ============================================================================

/// Root topic that routes turns: with an active child it delegates, clearing
/// the slot when the child resolves; without one it starts the sub-topic the
/// message names.
pub struct LobbyTopic {
    core: TopicCore<TopicState, ()>,
}

impl LobbyTopic {
    pub fn new(state: TopicState) -> Self {
        let registry = SubTopicRegistry::new()
            .with("greeting", || Box::new(GreetingTopic::new()) as Box<dyn Topic>)
            .with("script", || Box::new(ScriptedTopic::new()) as Box<dyn Topic>)
            .with("counting", || Box::new(CountingTopic::new()) as Box<dyn Topic>)
            .with("relay", || Box::new(RelayTopic::new()) as Box<dyn Topic>)
            .with("echo", || Box::new(EchoTopic::new()) as Box<dyn Topic>);
        Self {
            core: TopicCore::with_sub_topics(state, registry),
        }
    }

    pub fn core(&self) -> &TopicCore<TopicState, ()> {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut TopicCore<TopicState, ()> {
        &mut self.core
    }
}

#[async_trait]
impl Topic for LobbyTopic {
    async fn on_receive(&mut self, turn: &mut TurnContext<'_>) -> TopicResult<Resolution> {
        // Delegate to the active child, or start the sub-topic the message
        // names and let it handle the same turn.
        let outcome = if let Some(child) = self.core.active_topic()? {
            Some(child.on_receive(turn).await?)
        } else {
            let message = turn.message().to_string();
            if self.core.sub_topics().contains(&message) {
                let child = self.core.set_active_topic(&message)?;
                Some(child.on_receive(turn).await?)
            } else {
                let mut known: Vec<&str> = self.core.sub_topics().keys().collect();
                known.sort_unstable();
                turn.reply(format!("try one of: {}", known.join(", ")));
                None
            }
        };

        // The parent, not the core, decides that resolution ends the
        // delegation. A child may resolve on the very turn it was started.
        if let Some(outcome) = outcome {
            if outcome.is_resolved() {
                self.core.clear_active_topic();
                match outcome {
                    Resolution::Success(_) => turn.reply("anything else?"),
                    Resolution::Failure(reason) => {
                        turn.reply(format!("that didn't work out ({reason})"));
                    }
                    Resolution::Pending => {}
                }
            }
        }
        Ok(Resolution::Pending)
    }

    fn dehydrate(&mut self) -> TopicResult<Value> {
        self.core.dehydrate()
    }

    fn rehydrate(&mut self, state: Value) -> TopicResult<()> {
        self.core.rehydrate(state)
    }
}

// ============================================================================
// Store helpers
// ============================================================================

/// Force conversation state through its serialized form, as a transport does
/// at a turn boundary. Discards every in-memory topic along the way.
pub fn reload(store: &ConversationState) -> ConversationState {
    let raw = serde_json::to_string(store).unwrap();
    serde_json::from_str(&raw).unwrap()
}
