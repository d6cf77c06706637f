/**
 * Chat Room Scenario Tests
 *
 * Exercises the in-memory chat layer end to end (presence + room
 * channels) without a running server: joining, fan-out, duplicate
 * joins under contention, and disconnect cleanup.
 */
use libris::chat::presence::PresenceTracker;
use libris::chat::rooms::RoomRegistry;
use libris::chat::ws::RoomEvent;
use libris::error::AppError;
use uuid::Uuid;

fn message_event(book_id: Uuid) -> RoomEvent {
    RoomEvent::UserJoined {
        book_id,
        member_id: Uuid::new_v4(),
        name: "reader".into(),
    }
}

#[tokio::test]
async fn two_members_in_a_room_both_receive_broadcasts() {
    let presence = PresenceTracker::new();
    let rooms = RoomRegistry::new();
    let book = Uuid::new_v4();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    presence.join(alice, book).unwrap();
    let mut alice_rx = rooms.sender(book).subscribe();
    presence.join(bob, book).unwrap();
    let mut bob_rx = rooms.sender(book).subscribe();

    let delivered = rooms.broadcast(book, message_event(book));
    assert_eq!(delivered, 2);
    assert!(alice_rx.recv().await.is_ok());
    assert!(bob_rx.recv().await.is_ok());
}

#[tokio::test]
async fn events_do_not_leak_into_other_rooms() {
    let presence = PresenceTracker::new();
    let rooms = RoomRegistry::new();
    let fiction = Uuid::new_v4();
    let history = Uuid::new_v4();
    let member = Uuid::new_v4();

    presence.join(member, fiction).unwrap();
    let mut fiction_rx = rooms.sender(fiction).subscribe();
    let _history_rx = rooms.sender(history).subscribe();

    rooms.broadcast(fiction, message_event(fiction));
    let event = fiction_rx.recv().await.unwrap();
    match event {
        RoomEvent::UserJoined { book_id, .. } => assert_eq!(book_id, fiction),
        other => panic!("unexpected event: {other:?}"),
    }

    // The other room saw nothing.
    assert_eq!(rooms.broadcast(history, message_event(history)), 1);
}

#[tokio::test]
async fn concurrent_duplicate_joins_admit_exactly_one() {
    let presence = PresenceTracker::new();
    let book = Uuid::new_v4();
    let member = Uuid::new_v4();

    let mut handles = Vec::new();
    for _ in 0..32 {
        let presence = presence.clone();
        handles.push(tokio::spawn(async move { presence.join(member, book) }));
    }

    let mut admitted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => admitted += 1,
            Err(AppError::AlreadyInRoom) => rejected += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(admitted, 1);
    assert_eq!(rejected, 31);
    assert!(presence.is_joined(member, book));
}

#[tokio::test]
async fn disconnect_releases_rooms_and_channels_get_pruned() {
    let presence = PresenceTracker::new();
    let rooms = RoomRegistry::new();
    let member = Uuid::new_v4();
    let book_a = Uuid::new_v4();
    let book_b = Uuid::new_v4();

    presence.join(member, book_a).unwrap();
    presence.join(member, book_b).unwrap();
    let rx_a = rooms.sender(book_a).subscribe();
    let rx_b = rooms.sender(book_b).subscribe();

    let released = presence.disconnect(member);
    assert_eq!(released.len(), 2);
    assert!(released.contains(&book_a));
    assert!(released.contains(&book_b));

    // On disconnect the connection drops its receivers; the periodic
    // cleanup then removes the now-empty channels.
    drop(rx_a);
    drop(rx_b);
    rooms.cleanup_inactive_channels();
    assert_eq!(rooms.subscriber_count(book_a), 0);
    assert_eq!(rooms.subscriber_count(book_b), 0);

    // A fresh join after disconnect is not a duplicate.
    presence.join(member, book_a).unwrap();
}
