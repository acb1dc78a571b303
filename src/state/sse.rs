use tokio::sync::broadcast;

use crate::{dto::sse::ServerEvent, state::quiz::ChatId};

/// Event addressed to the subscribers of a single chat.
#[derive(Clone, Debug)]
pub struct ChatEvent {
    pub chat_id: ChatId,
    pub event: ServerEvent,
}

/// Broadcast hub wrapper shared by every chat stream. Subscribers filter on `chat_id`.
#[derive(Clone)]
pub struct SseHub {
    sender: broadcast::Sender<ChatEvent>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, returning how many received it.
    /// Having no subscriber is not an error: the chat is simply not being watched.
    pub fn broadcast(&self, event: ChatEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_events_after_subscribing() {
        let hub = SseHub::new(4);
        assert_eq!(
            hub.broadcast(ChatEvent {
                chat_id: 1,
                event: ServerEvent::new(Some("message".into()), "lost".into()),
            }),
            0
        );

        let mut receiver = hub.subscribe();
        hub.broadcast(ChatEvent {
            chat_id: 2,
            event: ServerEvent::new(Some("message".into()), "hello".into()),
        });

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.chat_id, 2);
        assert_eq!(received.event.data, "hello");
    }
}
