//! Conversation types.
//!
//! A conversation is a fixed set of at least two distinct accounts. Direct
//! (non-group) conversations carry a normalized pair key so the store can
//! enforce "one conversation per unordered pair" with a unique index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use crate::id::ConversationId;
use crate::account::AccountId;
use crate::error::ChatError;
use crate::message::Message;

/// Minimum number of distinct participants in any conversation.
pub const MIN_PARTICIPANTS: usize = 2;

/// A chat between two or more participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    /// Distinct participant identities, in join order.
    pub participants: Vec<AccountId>,
    pub is_group: bool,
    pub group_name: Option<String>,
    pub created_by: AccountId,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Build a direct (two-party) conversation.
    pub fn direct(a: AccountId, b: AccountId, created_by: AccountId) -> Self {
        Self {
            id: ConversationId::new(),
            participants: vec![a, b],
            is_group: false,
            group_name: None,
            created_by,
            created_at: Utc::now(),
        }
    }

    /// Build a group conversation. Duplicate participants are collapsed.
    pub fn group(participants: Vec<AccountId>, name: Option<String>, created_by: AccountId) -> Self {
        let mut distinct = Vec::with_capacity(participants.len());
        for p in participants {
            if !distinct.contains(&p) {
                distinct.push(p);
            }
        }
        Self {
            id: ConversationId::new(),
            participants: distinct,
            is_group: true,
            group_name: name,
            created_by,
            created_at: Utc::now(),
        }
    }

    /// Whether `account` is a member of this conversation.
    pub fn has_participant(&self, account: &AccountId) -> bool {
        self.participants.contains(account)
    }

    /// Normalized pair key for direct conversations, `None` for groups.
    pub fn pair_key(&self) -> Option<String> {
        match (self.is_group, self.participants.as_slice()) {
            (false, [a, b]) => Some(pair_key(a, b)),
            _ => None,
        }
    }

    /// Check the membership invariants before the conversation is stored.
    pub fn validate(&self) -> Result<(), ChatError> {
        let mut seen = Vec::with_capacity(self.participants.len());
        for p in &self.participants {
            if seen.contains(p) {
                return Err(ChatError::Validation(format!(
                    "participant {p} appears more than once"
                )));
            }
            seen.push(*p);
        }
        if seen.len() < MIN_PARTICIPANTS {
            return Err(ChatError::Validation(format!(
                "a conversation needs at least {MIN_PARTICIPANTS} distinct participants"
            )));
        }
        if !self.is_group && seen.len() != 2 {
            return Err(ChatError::Validation(
                "a direct conversation has exactly 2 participants".to_string(),
            ));
        }
        Ok(())
    }
}

/// Order-independent key for an unordered participant pair.
pub fn pair_key(a: &AccountId, b: &AccountId) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("{lo}:{hi}")
}

/// A conversation together with its most recent message, for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation: Conversation,
    pub last_message: Option<Message>,
}

impl ConversationSummary {
    /// Timestamp used to order listings: the last message time, if any.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_message.as_ref().map(|m| m.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_is_order_independent() {
        let a = AccountId::new();
        let b = AccountId::new();
        assert_eq!(pair_key(&a, &b), pair_key(&b, &a));
    }

    #[test]
    fn test_direct_conversation_pair_key() {
        let a = AccountId::new();
        let b = AccountId::new();
        let conv = Conversation::direct(b, a, b);
        assert_eq!(conv.pair_key(), Some(pair_key(&a, &b)));
        assert!(conv.validate().is_ok());
    }

    #[test]
    fn test_self_conversation_rejected() {
        let a = AccountId::new();
        let conv = Conversation::direct(a, a, a);
        assert!(matches!(conv.validate(), Err(ChatError::Validation(_))));
    }

    #[test]
    fn test_group_collapses_duplicates() {
        let a = AccountId::new();
        let b = AccountId::new();
        let conv = Conversation::group(vec![a, b, a], Some("crew".into()), a);
        assert_eq!(conv.participants.len(), 2);
        assert!(conv.pair_key().is_none());
        assert!(conv.validate().is_ok());
    }

    #[test]
    fn test_group_of_one_rejected() {
        let a = AccountId::new();
        let conv = Conversation::group(vec![a, a], None, a);
        assert!(conv.validate().is_err());
    }
}
