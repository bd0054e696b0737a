//! A single open room.

use broadside_protocol::{RoomId, RoomSummary, RoomUser, UserId};

/// Seats per room. Battles are always one-on-one.
pub const ROOM_CAPACITY: usize = 2;

/// An open room, waiting for its second player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    /// The room's unique ID.
    pub id: RoomId,
    /// Seated users in the order they sat down. The first is the owner.
    pub users: Vec<RoomUser>,
}

impl Room {
    pub(crate) fn new(id: RoomId, owner: RoomUser) -> Self {
        Self {
            id,
            users: vec![owner],
        }
    }

    /// Returns `true` if the user holds a seat here.
    pub fn is_seated(&self, user: UserId) -> bool {
        self.users.iter().any(|u| u.index == user)
    }

    /// Returns `true` once every seat is taken.
    pub fn is_full(&self) -> bool {
        self.users.len() >= ROOM_CAPACITY
    }

    /// The listing entry for `update_room`.
    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            room_id: self.id,
            room_users: self.users.clone(),
        }
    }
}
