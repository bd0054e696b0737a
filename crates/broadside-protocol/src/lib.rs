//! Wire protocol for Broadside.
//!
//! - **Types** ([`Envelope`], [`ClientMessage`], [`ServerMessage`] and
//!   their payloads): what travels on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how frames become bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong on the way.
//!
//! The protocol layer knows nothing about connections, users or battles.
//!
//! ```text
//! Transport (frames) → Protocol (ClientMessage) → Dispatcher
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    AddShipsRequest, AttackFeedback, AttackRequest, AttackStatus, ClientMessage,
    CreateGame, ENVELOPE_ID, Envelope, Finish, GameId, JoinRoomRequest, Position,
    RandomAttackRequest, RegRequest, RegResponse, RoomId, RoomSummary, RoomUser,
    ServerMessage, ShipKind, ShipPlacement, StartGame, Turn, UserId, Winner,
};
