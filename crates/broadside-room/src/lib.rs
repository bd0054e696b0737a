//! Matchmaking lobby for Broadside.
//!
//! A room is a waiting slot: one player sits down, the second one to join
//! fills it, and at that instant the room is promoted into a battle and
//! disappears from the lobby.
//!
//! # Key types
//!
//! - [`Lobby`]: open rooms, create/join/promote
//! - [`Room`]: one open room
//! - [`FilledRoom`]: what promotion hands over to the battle engine
//! - [`RoomError`]: full / not found

mod error;
mod lobby;
mod room;

pub use error::RoomError;
pub use lobby::{FilledRoom, Lobby};
pub use room::{ROOM_CAPACITY, Room};
