use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::models::ChatMessage;

const TOPIC_CAPACITY: usize = 64;

/// Publish/subscribe registry for the chat relay. Topics are keyed by the
/// applicant's email; a topic exists only while sockets are subscribed to it.
/// Delivery is fire-and-forget to whoever is subscribed at publish time;
/// history lives in the message store.
#[derive(Default)]
pub struct ChatHub {
    topics: DashMap<String, broadcast::Sender<ChatMessage>>,
}

impl ChatHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, applier_email: &str) -> broadcast::Receiver<ChatMessage> {
        self.topics
            .entry(applier_email.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .subscribe()
    }

    /// Broadcasts to the topic named by the message's applier email and
    /// returns how many subscribers received it. Topics nobody listens to
    /// any more are dropped on the way out.
    pub fn publish(&self, message: &ChatMessage) -> usize {
        let delivered = match self.topics.get(&message.applier_email) {
            Some(sender) => sender.send(message.clone()).unwrap_or(0),
            None => 0,
        };

        if delivered == 0 {
            self.topics
                .remove_if(&message.applier_email, |_, sender| {
                    sender.receiver_count() == 0
                });
        }

        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn message(applier_email: &str, text: &str) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4(),
            text: text.to_string(),
            applier_email: applier_email.to_string(),
            sender_email: "publisher@x.com".to_string(),
            sender: "Publisher".to_string(),
            created_at: Utc::now().naive_utc(),
        }
    }

    #[tokio::test]
    async fn delivers_to_current_subscribers_of_the_topic() {
        let hub = ChatHub::new();
        let mut rx = hub.subscribe("a@x.com");

        let sent = message("a@x.com", "hello");
        assert_eq!(hub.publish(&sent), 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.text, "hello");
        assert_eq!(received.applier_email, "a@x.com");
    }

    #[tokio::test]
    async fn other_topics_do_not_receive_the_message() {
        let hub = ChatHub::new();
        let mut other = hub.subscribe("b@x.com");

        hub.publish(&message("a@x.com", "hello"));
        assert!(other.try_recv().is_err());
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_broadcasts() {
        let hub = ChatHub::new();
        assert_eq!(hub.publish(&message("a@x.com", "early")), 0);

        let mut rx = hub.subscribe("a@x.com");
        assert!(rx.try_recv().is_err());
    }
}
