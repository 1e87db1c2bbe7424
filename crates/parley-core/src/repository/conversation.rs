//! Conversation repository trait definition.

use parley_types::account::AccountId;
use parley_types::conversation::{Conversation, ConversationId};
use parley_types::error::RepositoryError;

/// Repository trait for conversation persistence.
pub trait ConversationRepository: Send + Sync {
    /// Insert a conversation and its participants.
    ///
    /// Direct conversations carry a pair key; inserting a second one for the
    /// same pair fails with `RepositoryError::Conflict`.
    fn create(
        &self,
        conversation: &Conversation,
    ) -> impl std::future::Future<Output = Result<Conversation, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// Find the direct conversation for a normalized pair key.
    fn get_by_pair_key(
        &self,
        pair_key: &str,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// Every conversation that includes `participant`.
    fn list_for_participant(
        &self,
        participant: &AccountId,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, RepositoryError>> + Send;
}
