//! The user record.

use broadside_protocol::{RoomUser, UserId};
use broadside_transport::ConnectionId;

/// A registered player.
///
/// Identity is stable across reconnects: logging in again with the same
/// name and password returns the same `User` with the new connection
/// attached.
#[derive(Debug, Clone)]
pub struct User {
    /// Stable identifier, also used as the player index in battles.
    pub id: UserId,

    /// Display name. Unique among human users.
    pub name: String,

    /// Plain-text credential compared on login.
    pub(crate) password: String,

    /// Number of battles won.
    pub wins: u32,

    /// The connection this user is reachable on, if any.
    ///
    /// `None` while the user is disconnected; the record itself stays.
    pub connection: Option<ConnectionId>,

    /// Synthetic opponent created for single-player mode.
    pub is_bot: bool,
}

impl User {
    /// Returns `true` if `password` matches the stored credential.
    pub fn password_matches(&self, password: &str) -> bool {
        self.password == password
    }

    /// The `{name, index}` pair used in room listings.
    pub fn to_room_user(&self) -> RoomUser {
        RoomUser {
            name: self.name.clone(),
            index: self.id,
        }
    }
}
