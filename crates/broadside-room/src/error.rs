//! Error types for the lobby.

use broadside_protocol::RoomId;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist (never did, or was already promoted).
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// No seat is available to this user: either the room is full or the
    /// user is already seated in it.
    #[error("room {0} is full")]
    RoomFull(RoomId),
}
