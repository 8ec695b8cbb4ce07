//! Per-turn context
//!
//! One [`TurnContext`] exists for the span of a single turn. It carries the
//! incoming message, a buffer for outgoing replies, and a mutable handle to
//! the conversation's durable state. Topics never outlive it; whatever they
//! need across turns goes through their persisted state instead.

use crate::store::ConversationState;

/// Context handed to every topic's `on_receive` for the current turn.
pub struct TurnContext<'a> {
    conversation: &'a mut ConversationState,
    message: String,
    replies: Vec<String>,
}

impl<'a> TurnContext<'a> {
    pub fn new(conversation: &'a mut ConversationState, message: impl Into<String>) -> Self {
        Self {
            conversation,
            message: message.into(),
            replies: Vec::new(),
        }
    }

    /// The incoming message text for this turn.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Queue a reply for the transport layer to deliver.
    pub fn reply(&mut self, text: impl Into<String>) {
        self.replies.push(text.into());
    }

    /// Replies queued so far this turn.
    pub fn replies(&self) -> &[String] {
        &self.replies
    }

    /// Mutable access to the conversation's durable state.
    pub fn conversation(&mut self) -> &mut ConversationState {
        self.conversation
    }

    /// Read-only view of the conversation's durable state.
    pub fn conversation_ref(&self) -> &ConversationState {
        self.conversation
    }
}
