//! Broadcast event bus for distributing `TurnEvent` to live subscribers.
//!
//! Publishing with no active subscribers is a no-op. Subscribers filter by
//! [`TurnEvent::channel`] to follow a single conversation.

use parley_types::event::TurnEvent;
use tokio::sync::broadcast;

/// Fire-and-forget delivery of finalized messages.
///
/// Publishing happens after the messages are durably stored, so a failed
/// delivery never affects the outcome of a turn.
pub trait RealtimePublisher: Send + Sync {
    fn publish(&self, event: TurnEvent);
}

/// Multi-consumer event bus for conversation events.
///
/// Wraps a `tokio::sync::broadcast` channel. Cloning the bus clones the
/// sender, allowing multiple producers and consumers.
pub struct EventBus {
    sender: broadcast::Sender<TurnEvent>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a new subscriber that will receive all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<TurnEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl RealtimePublisher for EventBus {
    /// If there are no subscribers, the event is silently dropped.
    fn publish(&self, event: TurnEvent) {
        let _ = self.sender.send(event);
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("receiver_count", &self.sender.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parley_types::account::AccountId;
    use parley_types::conversation::ConversationId;
    use parley_types::message::{Message, MessageId};

    fn posted(conversation_id: ConversationId) -> TurnEvent {
        TurnEvent::MessagePosted {
            conversation_id,
            message: Message {
                id: MessageId::new(),
                conversation_id,
                sender_id: AccountId::new(),
                content: "hello".to_string(),
                created_at: Utc::now(),
                seq: 1,
            },
        }
    }

    #[tokio::test]
    async fn publish_and_subscribe_delivers_event() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let conv = ConversationId::new();

        bus.publish(posted(conv));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.conversation_id(), conv);
        assert_eq!(received.channel(), format!("conversation-{conv}"));
    }

    #[tokio::test]
    async fn multiple_subscribers_each_receive_event() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(posted(ConversationId::new()));

        assert!(matches!(rx1.recv().await.unwrap(), TurnEvent::MessagePosted { .. }));
        assert!(matches!(rx2.recv().await.unwrap(), TurnEvent::MessagePosted { .. }));
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::new(16);
        bus.publish(posted(ConversationId::new()));
        assert_eq!(bus.receiver_count(), 0);
    }

    #[test]
    fn clone_shares_channel() {
        let bus = EventBus::new(16);
        let bus2 = bus.clone();
        let mut rx = bus.subscribe();

        bus2.publish(posted(ConversationId::new()));

        assert!(rx.try_recv().is_ok());
    }
}
