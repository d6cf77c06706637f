/**
 * Room Broadcast Registry
 *
 * Manages per-book broadcast channels for real-time message delivery.
 * Each discussion room gets its own channel to prevent cross-talk between
 * rooms; channels are created lazily on first join and pruned once nobody
 * is subscribed.
 */
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::chat::ws::RoomEvent;

const ROOM_CHANNEL_CAPACITY: usize = 100;

/// Per-room broadcast channels keyed by book id.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    channels: Arc<Mutex<HashMap<Uuid, broadcast::Sender<RoomEvent>>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the broadcast sender for a room.
    pub fn sender(&self, book_id: Uuid) -> broadcast::Sender<RoomEvent> {
        let mut channels = self.channels.lock().expect("room registry lock poisoned");
        channels
            .entry(book_id)
            .or_insert_with(|| broadcast::channel(ROOM_CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Broadcast an event to everyone currently in the room.
    ///
    /// Returns the number of connections that received it; a room with no
    /// subscribers swallows the event.
    pub fn broadcast(&self, book_id: Uuid, event: RoomEvent) -> usize {
        let sender = {
            let channels = self.channels.lock().expect("room registry lock poisoned");
            channels.get(&book_id).cloned()
        };
        match sender {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        }
    }

    /// Drop channels nobody is subscribed to.
    pub fn cleanup_inactive_channels(&self) {
        self.channels
            .lock()
            .expect("room registry lock poisoned")
            .retain(|_, sender| sender.receiver_count() > 0);
    }

    /// Subscriber count for a room.
    pub fn subscriber_count(&self, book_id: Uuid) -> usize {
        self.channels
            .lock()
            .expect("room registry lock poisoned")
            .get(&book_id)
            .map(broadcast::Sender::receiver_count)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ws::RoomEvent;

    fn joined_event() -> RoomEvent {
        RoomEvent::UserJoined {
            book_id: Uuid::new_v4(),
            member_id: Uuid::new_v4(),
            name: "reader".into(),
        }
    }

    #[tokio::test]
    async fn test_broadcast_reaches_room_subscribers() {
        let rooms = RoomRegistry::new();
        let book = Uuid::new_v4();

        let mut rx = rooms.sender(book).subscribe();
        let delivered = rooms.broadcast(book, joined_event());
        assert_eq!(delivered, 1);
        assert!(rx.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_broadcast_does_not_cross_rooms() {
        let rooms = RoomRegistry::new();
        let book_a = Uuid::new_v4();
        let book_b = Uuid::new_v4();

        let _rx_a = rooms.sender(book_a).subscribe();
        let delivered = rooms.broadcast(book_b, joined_event());
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_cleanup_prunes_empty_rooms() {
        let rooms = RoomRegistry::new();
        let book = Uuid::new_v4();

        let rx = rooms.sender(book).subscribe();
        assert_eq!(rooms.subscriber_count(book), 1);

        drop(rx);
        rooms.cleanup_inactive_channels();
        assert_eq!(rooms.subscriber_count(book), 0);
    }
}
