//! Message store.
//!
//! Every write is checked against the conversation's membership. Ordering
//! and timestamp clamping are delegated to the repository, which does both
//! atomically with the insert.

use parley_types::account::AccountId;
use parley_types::conversation::ConversationId;
use parley_types::error::{ChatError, RepositoryError};
use parley_types::message::{ContextEntry, Message, MessageId, NewMessage};
use parley_types::participant::Classification;
use tracing::{debug, warn};

use crate::identity::IdentityBridge;
use crate::repository::{
    AccountRepository, ConversationRepository, MessageRepository, PersonaRepository,
};

pub struct MessageStore<M: MessageRepository, C: ConversationRepository> {
    messages: M,
    conversations: C,
}

impl<M: MessageRepository, C: ConversationRepository> MessageStore<M, C> {
    pub fn new(messages: M, conversations: C) -> Self {
        Self {
            messages,
            conversations,
        }
    }

    pub fn repo(&self) -> &M {
        &self.messages
    }

    /// Append a message from `sender`. Content is stored as given; blank
    /// content is rejected.
    pub async fn append(
        &self,
        conversation_id: &ConversationId,
        sender: &AccountId,
        content: &str,
    ) -> Result<Message, ChatError> {
        let conversation = self
            .conversations
            .get_by_id(conversation_id)
            .await?
            .ok_or(ChatError::ConversationNotFound)?;
        if !conversation.has_participant(sender) {
            return Err(ChatError::AccessDenied);
        }
        if content.trim().is_empty() {
            return Err(ChatError::Validation("message content is empty".to_string()));
        }

        let message = self
            .messages
            .append(NewMessage::new(*conversation_id, *sender, content.to_string()))
            .await?;
        debug!(
            conversation_id = %conversation_id,
            message_id = %message.id,
            seq = message.seq,
            "Message appended"
        );
        Ok(message)
    }

    /// Up to `limit` most recent messages, newest first.
    pub async fn history(
        &self,
        conversation_id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<Message>, ChatError> {
        Ok(self.messages.recent(conversation_id, limit).await?)
    }

    /// All messages, oldest first.
    pub async fn list(&self, conversation_id: &ConversationId) -> Result<Vec<Message>, ChatError> {
        Ok(self.messages.list(conversation_id).await?)
    }

    /// Build the role-tagged context for a generation request.
    ///
    /// Reads the `history_cap` most recent messages, tags persona senders as
    /// `assistant` and humans as `user`, and keeps the `model_cap` most
    /// recent entries in chronological order. Messages from senders that no
    /// longer resolve are skipped.
    pub async fn build_context_window<A, P>(
        &self,
        conversation_id: &ConversationId,
        bridge: &IdentityBridge<A, P>,
        history_cap: usize,
        model_cap: usize,
    ) -> Result<Vec<ContextEntry>, ChatError>
    where
        A: AccountRepository,
        P: PersonaRepository,
    {
        let recent = self.messages.recent(conversation_id, history_cap).await?;

        let mut window = Vec::with_capacity(recent.len());
        for message in recent.into_iter().rev() {
            match bridge.classify(&message.sender_id).await? {
                Some(Classification::Persona(_)) => {
                    window.push(ContextEntry::assistant(message.content));
                }
                Some(Classification::Human) => window.push(ContextEntry::user(message.content)),
                None => {
                    warn!(
                        conversation_id = %conversation_id,
                        message_id = %message.id,
                        sender_id = %message.sender_id,
                        "Dropping message from unknown sender"
                    );
                }
            }
        }

        if window.len() > model_cap {
            window.drain(..window.len() - model_cap);
        }
        Ok(window)
    }

    /// Delete a message. Only its sender may do so.
    pub async fn delete(&self, message_id: &MessageId, requester: &AccountId) -> Result<(), ChatError> {
        let message = self
            .messages
            .get_by_id(message_id)
            .await?
            .ok_or(ChatError::MessageNotFound)?;
        if message.sender_id != *requester {
            return Err(ChatError::AccessDenied);
        }

        match self.messages.delete(message_id).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(ChatError::MessageNotFound),
            Err(e) => Err(e.into()),
        }
    }
}
