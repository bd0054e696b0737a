//! The lobby: creates rooms, seats players, promotes full rooms.

use std::collections::BTreeMap;

use broadside_protocol::{RoomId, RoomSummary, RoomUser, UserId};

use crate::{Room, RoomError};

/// A room that just filled up and left the lobby.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilledRoom {
    /// The id the room had while open.
    pub room_id: RoomId,
    /// Both players, owner first.
    pub players: [RoomUser; 2],
    /// Other open rooms of either player, closed by the promotion.
    pub closed_rooms: Vec<RoomId>,
}

/// Tracks all open rooms.
///
/// Rooms live in a `BTreeMap` so listings come out oldest first.
/// A room only exists while it has exactly one occupant; filling it
/// removes it (see [`join_room`](Self::join_room)), so ids are never
/// reused for a second match.
#[derive(Debug, Default)]
pub struct Lobby {
    rooms: BTreeMap<RoomId, Room>,
    next_id: u64,
}

impl Lobby {
    /// Creates an empty lobby.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a room owned by `owner`.
    ///
    /// A user waits in at most one room they opened themselves: if they
    /// already have one, that room is returned instead of a new one.
    pub fn create_room(&mut self, owner: RoomUser) -> Room {
        if let Some(existing) = self
            .rooms
            .values()
            .find(|r| r.users.first().is_some_and(|u| u.index == owner.index))
        {
            tracing::debug!(room_id = %existing.id, user = %owner.index, "reusing open room");
            return existing.clone();
        }
        self.create_fresh_room(owner)
    }

    /// Opens a new room for `owner` even if they already wait elsewhere.
    ///
    /// Used for single-player matches, which are filled immediately.
    pub fn create_fresh_room(&mut self, owner: RoomUser) -> Room {
        self.next_id += 1;
        let id = RoomId(self.next_id);
        tracing::info!(room_id = %id, user = %owner.index, "room created");
        let room = Room::new(id, owner);
        self.rooms.insert(id, room.clone());
        room
    }

    /// Seats `user` in a room. The room is now full, so it is promoted:
    /// it leaves the lobby together with every other open room of either
    /// player, and the seated pair is returned.
    ///
    /// # Errors
    /// - [`RoomError::NotFound`]: no open room with this id
    /// - [`RoomError::RoomFull`]: the user is already seated there, or
    ///   there is no free seat
    pub fn join_room(
        &mut self,
        room_id: RoomId,
        user: RoomUser,
    ) -> Result<FilledRoom, RoomError> {
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;
        if room.is_seated(user.index) || room.is_full() {
            return Err(RoomError::RoomFull(room_id));
        }
        room.users.push(user);

        let Some(room) = self.rooms.remove(&room_id) else {
            return Err(RoomError::NotFound(room_id));
        };
        let [owner, guest]: [RoomUser; 2] = room
            .users
            .try_into()
            .map_err(|_| RoomError::RoomFull(room_id))?;

        let mut closed_rooms = self.remove_rooms_of(owner.index);
        closed_rooms.extend(self.remove_rooms_of(guest.index));

        tracing::info!(
            %room_id,
            owner = %owner.index,
            guest = %guest.index,
            "room filled"
        );
        Ok(FilledRoom {
            room_id,
            players: [owner, guest],
            closed_rooms,
        })
    }

    /// Closes every open room the user is seated in. Returns their ids.
    pub fn remove_rooms_of(&mut self, user: UserId) -> Vec<RoomId> {
        let ids: Vec<RoomId> = self
            .rooms
            .values()
            .filter(|r| r.is_seated(user))
            .map(|r| r.id)
            .collect();
        for id in &ids {
            self.rooms.remove(id);
            tracing::debug!(room_id = %id, %user, "room closed");
        }
        ids
    }

    /// The `update_room` listing: rooms with exactly one seated user.
    pub fn open_rooms(&self) -> Vec<RoomSummary> {
        self.rooms
            .values()
            .filter(|r| r.users.len() == 1)
            .map(Room::summary)
            .collect()
    }

    /// Looks up an open room.
    pub fn get(&self, room_id: RoomId) -> Option<&Room> {
        self.rooms.get(&room_id)
    }

    /// Number of open rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: u64) -> RoomUser {
        RoomUser {
            name: format!("user{id}"),
            index: UserId(id),
        }
    }

    #[test]
    fn test_create_room_seats_owner() {
        let mut lobby = Lobby::new();
        let room = lobby.create_room(user(1));
        assert_eq!(room.users, vec![user(1)]);
        assert!(!room.is_full());
        assert_eq!(lobby.room_count(), 1);
    }

    #[test]
    fn test_create_room_twice_returns_same_room() {
        let mut lobby = Lobby::new();
        let a = lobby.create_room(user(1));
        let b = lobby.create_room(user(1));
        assert_eq!(a.id, b.id);
        assert_eq!(lobby.room_count(), 1);
    }

    #[test]
    fn test_create_fresh_room_always_new() {
        let mut lobby = Lobby::new();
        let a = lobby.create_room(user(1));
        let b = lobby.create_fresh_room(user(1));
        assert_ne!(a.id, b.id);
        assert_eq!(lobby.room_count(), 2);
    }

    #[test]
    fn test_join_unknown_room() {
        let mut lobby = Lobby::new();
        let err = lobby.join_room(RoomId(9), user(1)).unwrap_err();
        assert!(matches!(err, RoomError::NotFound(RoomId(9))));
    }

    #[test]
    fn test_join_own_room_is_full_error() {
        let mut lobby = Lobby::new();
        let room = lobby.create_room(user(1));
        let err = lobby.join_room(room.id, user(1)).unwrap_err();
        assert!(matches!(err, RoomError::RoomFull(id) if id == room.id));
        // The failed join leaves the room untouched.
        assert_eq!(lobby.get(room.id).unwrap().users.len(), 1);
    }

    #[test]
    fn test_open_rooms_lists_single_occupant_rooms_in_order() {
        let mut lobby = Lobby::new();
        let a = lobby.create_room(user(1));
        let b = lobby.create_room(user(2));
        let listing = lobby.open_rooms();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].room_id, a.id);
        assert_eq!(listing[1].room_id, b.id);
        assert_eq!(listing[0].room_users, vec![user(1)]);
    }
}
