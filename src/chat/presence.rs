/**
 * Chat Presence Tracker
 *
 * Process-wide, in-memory registry of which member is joined to which
 * book room. Lives only as long as the process: it is rebuilt empty on
 * restart and reconnecting clients must re-join explicitly.
 *
 * One mutex guards the whole map, so join's check-then-set is atomic:
 * two near-simultaneous joins for the same (member, room) pair cannot
 * both succeed.
 */
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Membership registry keyed by member id.
#[derive(Clone, Default)]
pub struct PresenceTracker {
    rooms: Arc<Mutex<HashMap<Uuid, HashSet<Uuid>>>>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a member as joined to a room.
    ///
    /// Rejects with `AlreadyInRoom` if the pair is already joined — a
    /// duplicate join is an error signal, never a silent re-join.
    pub fn join(&self, member_id: Uuid, book_id: Uuid) -> AppResult<()> {
        let mut rooms = self.rooms.lock().expect("presence lock poisoned");
        let joined = rooms.entry(member_id).or_default();
        if !joined.insert(book_id) {
            return Err(AppError::AlreadyInRoom);
        }
        Ok(())
    }

    /// Whether the member currently holds the room.
    pub fn is_joined(&self, member_id: Uuid, book_id: Uuid) -> bool {
        self.rooms
            .lock()
            .expect("presence lock poisoned")
            .get(&member_id)
            .is_some_and(|joined| joined.contains(&book_id))
    }

    /// Explicitly leave one room.
    pub fn leave(&self, member_id: Uuid, book_id: Uuid) -> AppResult<()> {
        let mut rooms = self.rooms.lock().expect("presence lock poisoned");
        let removed = match rooms.get_mut(&member_id) {
            Some(joined) => joined.remove(&book_id),
            None => false,
        };
        if !removed {
            return Err(AppError::NotInRoom);
        }
        if rooms.get(&member_id).is_some_and(HashSet::is_empty) {
            rooms.remove(&member_id);
        }
        Ok(())
    }

    /// Release every room the member holds and return them.
    ///
    /// Called from the disconnect path; after this the member holds no
    /// entries at all.
    pub fn disconnect(&self, member_id: Uuid) -> Vec<Uuid> {
        let mut rooms = self.rooms.lock().expect("presence lock poisoned");
        rooms
            .remove(&member_id)
            .map(|joined| joined.into_iter().collect())
            .unwrap_or_default()
    }

    /// Number of members currently tracked (for logging).
    pub fn tracked_members(&self) -> usize {
        self.rooms.lock().expect("presence lock poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_join_then_duplicate_join_fails() {
        let presence = PresenceTracker::new();
        let member = Uuid::new_v4();
        let book = Uuid::new_v4();

        presence.join(member, book).unwrap();
        assert_matches!(presence.join(member, book), Err(AppError::AlreadyInRoom));
        assert!(presence.is_joined(member, book));
    }

    #[test]
    fn test_send_requires_join() {
        let presence = PresenceTracker::new();
        let member = Uuid::new_v4();
        let book = Uuid::new_v4();

        assert!(!presence.is_joined(member, book));
        presence.join(member, book).unwrap();
        assert!(presence.is_joined(member, book));
    }

    #[test]
    fn test_leave_clears_membership() {
        let presence = PresenceTracker::new();
        let member = Uuid::new_v4();
        let book = Uuid::new_v4();

        presence.join(member, book).unwrap();
        presence.leave(member, book).unwrap();
        assert!(!presence.is_joined(member, book));
        // Leaving twice is a state error, not a no-op.
        assert_matches!(presence.leave(member, book), Err(AppError::NotInRoom));
    }

    #[test]
    fn test_disconnect_releases_all_rooms() {
        let presence = PresenceTracker::new();
        let member = Uuid::new_v4();
        let room_a = Uuid::new_v4();
        let room_b = Uuid::new_v4();

        presence.join(member, room_a).unwrap();
        presence.join(member, room_b).unwrap();

        let mut released = presence.disconnect(member);
        released.sort();
        let mut expected = vec![room_a, room_b];
        expected.sort();
        assert_eq!(released, expected);

        // No leaked entries: the member must re-join before sending.
        assert!(!presence.is_joined(member, room_a));
        assert!(!presence.is_joined(member, room_b));
        assert_eq!(presence.tracked_members(), 0);
    }

    #[test]
    fn test_disconnect_unknown_member_is_empty() {
        let presence = PresenceTracker::new();
        assert!(presence.disconnect(Uuid::new_v4()).is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_joins_exactly_one_wins() {
        let presence = PresenceTracker::new();
        let member = Uuid::new_v4();
        let book = Uuid::new_v4();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let presence = presence.clone();
            handles.push(tokio::spawn(async move { presence.join(member, book) }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }
}
