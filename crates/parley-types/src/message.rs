//! Message types.
//!
//! Messages reference their conversation and sender by identity only; display
//! names are never denormalized into a message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use crate::generation::{ContextEntry, MessageRole};
pub use crate::id::MessageId;
use crate::account::AccountId;
use crate::conversation::ConversationId;

/// One utterance within a conversation.
///
/// Messages are totally ordered by `(created_at, seq)` within a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: AccountId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Store-assigned insertion sequence; breaks timestamp ties.
    pub seq: i64,
}

/// A message before the store has assigned its sequence number.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: AccountId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl NewMessage {
    pub fn new(conversation_id: ConversationId, sender_id: AccountId, content: String) -> Self {
        Self {
            id: MessageId::new(),
            conversation_id,
            sender_id,
            content,
            created_at: Utc::now(),
        }
    }

    /// Finalize with the store-assigned sequence and (possibly clamped) timestamp.
    pub fn into_message(self, seq: i64, created_at: DateTime<Utc>) -> Message {
        Message {
            id: self.id,
            conversation_id: self.conversation_id,
            sender_id: self.sender_id,
            content: self.content,
            created_at,
            seq,
        }
    }
}
