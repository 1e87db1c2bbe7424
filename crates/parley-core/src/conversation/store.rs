//! Conversation store.
//!
//! Direct conversations are deduplicated by their normalized pair key. The
//! unique index on that key is what settles races between concurrent
//! creators; the loser re-reads and returns the winner.

use std::cmp::Ordering;

use parley_types::account::AccountId;
use parley_types::conversation::{Conversation, ConversationId, ConversationSummary, pair_key};
use parley_types::error::{ChatError, RepositoryError};
use tracing::{debug, info};

use crate::repository::{ConversationRepository, MessageRepository};

/// Attempts at inserting a direct conversation before giving up.
const CREATE_ATTEMPTS: usize = 3;

pub struct ConversationStore<C: ConversationRepository> {
    repo: C,
}

impl<C: ConversationRepository> ConversationStore<C> {
    pub fn new(repo: C) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &C {
        &self.repo
    }

    /// Return the direct conversation between `a` and `b`, creating it if
    /// none exists. Repeated calls with the same pair, in either order,
    /// return the same conversation.
    pub async fn find_or_create_direct(
        &self,
        a: &AccountId,
        b: &AccountId,
        created_by: &AccountId,
    ) -> Result<Conversation, ChatError> {
        if a == b {
            return Err(ChatError::Validation(
                "cannot start a conversation with yourself".to_string(),
            ));
        }
        let key = pair_key(a, b);

        for attempt in 1..=CREATE_ATTEMPTS {
            if let Some(existing) = self.repo.get_by_pair_key(&key).await? {
                return Ok(existing);
            }

            let conversation = Conversation::direct(*a, *b, *created_by);
            conversation.validate()?;

            match self.repo.create(&conversation).await {
                Ok(created) => {
                    info!(conversation_id = %created.id, "Direct conversation created");
                    return Ok(created);
                }
                Err(RepositoryError::Conflict(_)) => {
                    debug!(attempt, pair_key = %key, "Lost conversation create race, re-reading");
                }
                Err(e) => return Err(e.into()),
            }
        }

        // Every attempt conflicted; the winner must be readable by now.
        self.repo
            .get_by_pair_key(&key)
            .await?
            .ok_or_else(|| ChatError::Storage(format!("conversation for pair {key} conflicted but is missing")))
    }

    /// Create a group conversation. The creator is always a member.
    ///
    /// A member set of exactly two accounts is a direct conversation, so it
    /// goes through [`Self::find_or_create_direct`] and the name is ignored.
    pub async fn create_group(
        &self,
        participants: Vec<AccountId>,
        name: Option<String>,
        created_by: &AccountId,
    ) -> Result<Conversation, ChatError> {
        let mut members = vec![*created_by];
        members.extend(participants);
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let conversation = Conversation::group(members, name, *created_by);
        if let [a, b] = conversation.participants.as_slice() {
            return self.find_or_create_direct(a, b, created_by).await;
        }
        conversation.validate()?;

        let created = self.repo.create(&conversation).await?;
        info!(
            conversation_id = %created.id,
            participants = created.participants.len(),
            "Group conversation created"
        );
        Ok(created)
    }

    /// Fetch a conversation on behalf of `requester`.
    pub async fn get(
        &self,
        conversation_id: &ConversationId,
        requester: &AccountId,
    ) -> Result<Conversation, ChatError> {
        let conversation = self
            .repo
            .get_by_id(conversation_id)
            .await?
            .ok_or(ChatError::ConversationNotFound)?;
        if !conversation.has_participant(requester) {
            return Err(ChatError::AccessDenied);
        }
        Ok(conversation)
    }

    /// Every conversation `participant` belongs to with its latest message.
    ///
    /// Most recently active first; conversations without messages come last,
    /// newest first.
    pub async fn list_for<M: MessageRepository>(
        &self,
        participant: &AccountId,
        messages: &M,
    ) -> Result<Vec<ConversationSummary>, ChatError> {
        let conversations = self.repo.list_for_participant(participant).await?;

        let mut summaries = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let last_message = messages.recent(&conversation.id, 1).await?.pop();
            summaries.push(ConversationSummary {
                conversation,
                last_message,
            });
        }

        summaries.sort_by(|x, y| match (x.last_activity(), y.last_activity()) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => y.conversation.created_at.cmp(&x.conversation.created_at),
        });
        Ok(summaries)
    }
}
