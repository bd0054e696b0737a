//! Unified error type for the Broadside server.

use broadside_battle::BattleError;
use broadside_protocol::ProtocolError;
use broadside_room::RoomError;
use broadside_session::SessionError;
use broadside_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
///
/// The server loop itself only ever returns `Transport`. Rejected client
/// messages are logged and dropped; `Session`, `Room` and `Battle` are for
/// code that drives those crates directly.
#[derive(Debug, thiserror::Error)]
pub enum BroadsideError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (malformed envelope, unknown type).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A user directory error (wrong password, unknown user).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A lobby error (room full, not found).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A battle rule violation.
    #[error(transparent)]
    Battle(#[from] BattleError),
}
