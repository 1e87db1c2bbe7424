//! Realtime events emitted after messages are durably stored.

use serde::{Deserialize, Serialize};

use crate::conversation::ConversationId;
use crate::message::Message;

/// A finalized message delivery for live clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    /// A completed turn: the human message and the persona reply.
    TurnCompleted {
        conversation_id: ConversationId,
        human_message: Message,
        assistant_message: Message,
    },

    /// A plain message sent without an AI turn.
    MessagePosted {
        conversation_id: ConversationId,
        message: Message,
    },
}

impl TurnEvent {
    pub fn conversation_id(&self) -> ConversationId {
        match self {
            TurnEvent::TurnCompleted { conversation_id, .. } => *conversation_id,
            TurnEvent::MessagePosted { conversation_id, .. } => *conversation_id,
        }
    }

    /// Fan-out channel name for the event's conversation.
    pub fn channel(&self) -> String {
        channel_name(&self.conversation_id())
    }
}

/// Channel name used by live transports for a conversation.
pub fn channel_name(conversation_id: &ConversationId) -> String {
    format!("conversation-{conversation_id}")
}
