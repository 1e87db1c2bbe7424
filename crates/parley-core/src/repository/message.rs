//! Message repository trait definition.

use parley_types::conversation::ConversationId;
use parley_types::error::RepositoryError;
use parley_types::message::{Message, MessageId, NewMessage};

/// Repository trait for message persistence.
pub trait MessageRepository: Send + Sync {
    /// Append a message to its conversation.
    ///
    /// The implementation assigns `seq` and clamps `created_at` so it never
    /// precedes the conversation's latest message. Both happen atomically
    /// with the insert.
    fn append(
        &self,
        message: NewMessage,
    ) -> impl std::future::Future<Output = Result<Message, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: &MessageId,
    ) -> impl std::future::Future<Output = Result<Option<Message>, RepositoryError>> + Send;

    /// Up to `limit` most recent messages, newest first.
    fn recent(
        &self,
        conversation_id: &ConversationId,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// All messages, oldest first.
    fn list(
        &self,
        conversation_id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// Delete one message. Returns `NotFound` if it does not exist.
    fn delete(
        &self,
        id: &MessageId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
