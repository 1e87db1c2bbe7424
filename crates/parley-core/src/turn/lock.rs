//! Per-conversation mutual exclusion.
//!
//! Turns on the same conversation run one at a time in arrival order
//! (tokio mutexes are fair). Turns on different conversations never wait on
//! each other.

use std::sync::Arc;

use dashmap::DashMap;
use parley_types::conversation::ConversationId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lazily created mutex per conversation id.
#[derive(Debug, Default)]
pub struct ConversationLocks {
    locks: DashMap<ConversationId, Arc<Mutex<()>>>,
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `conversation_id`.
    pub async fn acquire(&self, conversation_id: ConversationId) -> OwnedMutexGuard<()> {
        // Clone the Arc so the map shard is not held across the await.
        let lock = self.locks.entry(conversation_id).or_default().clone();
        lock.lock_owned().await
    }

    /// Drop the entry for `conversation_id` if nobody holds or awaits it.
    pub fn prune(&self, conversation_id: &ConversationId) {
        self.locks
            .remove_if(conversation_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Number of conversations with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_conversation_is_exclusive() {
        let locks = Arc::new(ConversationLocks::new());
        let id = ConversationId::new();

        let guard = locks.acquire(id).await;
        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.acquire(id).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn different_conversations_do_not_block() {
        let locks = ConversationLocks::new();
        let _a = locks.acquire(ConversationId::new()).await;
        let b = tokio::time::timeout(
            Duration::from_millis(50),
            locks.acquire(ConversationId::new()),
        )
        .await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn prune_keeps_held_locks() {
        let locks = ConversationLocks::new();
        let id = ConversationId::new();

        let guard = locks.acquire(id).await;
        locks.prune(&id);
        assert_eq!(locks.len(), 1);

        drop(guard);
        locks.prune(&id);
        assert!(locks.is_empty());
    }
}
