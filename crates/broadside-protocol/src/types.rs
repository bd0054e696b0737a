//! Core protocol types for Broadside's wire format.
//!
//! Every frame on the wire is an [`Envelope`]: a `type` tag, a `data`
//! field holding the JSON-encoded payload *as a string*, and a constant
//! `id` of 0. The payload types below are what lives inside `data`.
//!
//! Field names follow the reference browser client (`camelCase`), so the
//! structs use `#[serde(rename_all = "camelCase")]`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A registered user. Also used as the player index inside a battle.
///
/// Serializes as a plain number (`#[serde(transparent)]`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// An open matchmaking room.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// A battle between two players.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GameId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The value of the envelope `id` field. It carries no meaning and is never
/// read; the reference client simply expects it to be present.
pub const ENVELOPE_ID: u32 = 0;

/// The top-level frame.
///
/// ```text
/// { "type": "attack", "data": "{\"gameId\":1,\"x\":3,\"y\":4}", "id": 0 }
/// ```
///
/// Inbound `data` is read leniently: a missing field becomes `""` and a
/// non-string JSON value is kept in its serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message type tag, e.g. `"reg"` or `"update_room"`.
    #[serde(rename = "type")]
    pub kind: String,

    /// The JSON-encoded payload.
    #[serde(default, deserialize_with = "lenient_data")]
    pub data: String,

    /// Always [`ENVELOPE_ID`].
    #[serde(default)]
    pub id: u32,
}

impl Envelope {
    /// Builds an outbound envelope around an already-encoded payload.
    pub fn new(kind: impl Into<String>, data: String) -> Self {
        Self {
            kind: kind.into(),
            data,
            id: ENVELOPE_ID,
        }
    }

    /// Parses the inner payload.
    ///
    /// Returns `None` when the payload is empty or not valid JSON. Message
    /// types that carry no data (`create_room`, `single_play`) always look
    /// like this, so it is not an error at this level.
    pub fn payload(&self) -> Option<serde_json::Value> {
        match serde_json::from_str::<serde_json::Value>(&self.data) {
            Ok(serde_json::Value::Null) | Err(_) => None,
            Ok(serde_json::Value::String(s)) if s.is_empty() => None,
            Ok(value) => Some(value),
        }
    }
}

fn lenient_data<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Board vocabulary shared by both directions
// ---------------------------------------------------------------------------

/// A board coordinate. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: u8,
    pub y: u8,
}

impl Position {
    pub fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The ship type tag the client attaches to each ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipKind {
    Small,
    Medium,
    Large,
    Huge,
}

impl ShipKind {
    /// The conventional tag for a ship of the given length.
    pub fn for_length(length: u8) -> Self {
        match length {
            0 | 1 => Self::Small,
            2 => Self::Medium,
            3 => Self::Large,
            _ => Self::Huge,
        }
    }
}

/// One ship as placed by a client.
///
/// `direction: true` means the ship extends downwards (vertical) from
/// `position`; `false` means it extends to the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipPlacement {
    pub position: Position,
    pub direction: bool,
    pub length: u8,
    #[serde(rename = "type")]
    pub kind: ShipKind,
}

/// Outcome of a single attacked cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackStatus {
    Miss,
    Shot,
    Killed,
}

impl fmt::Display for AttackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Miss => "miss",
            Self::Shot => "shot",
            Self::Killed => "killed",
        })
    }
}

// ---------------------------------------------------------------------------
// Inbound payloads
// ---------------------------------------------------------------------------

/// `reg`: log in, or create the account on first use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegRequest {
    pub name: String,
    pub password: String,
}

/// `add_user_to_room`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    pub index_room: RoomId,
}

/// `add_ships`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddShipsRequest {
    pub game_id: GameId,
    pub index_player: UserId,
    pub ships: Vec<ShipPlacement>,
}

/// `attack`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackRequest {
    pub game_id: GameId,
    pub index_player: UserId,
    pub x: u8,
    pub y: u8,
}

/// `randomAttack`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomAttackRequest {
    pub game_id: GameId,
    pub index_player: UserId,
}

/// A decoded client → server message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Reg(RegRequest),
    CreateRoom,
    AddUserToRoom(JoinRoomRequest),
    AddShips(AddShipsRequest),
    Attack(AttackRequest),
    RandomAttack(RandomAttackRequest),
    SinglePlay,
}

impl ClientMessage {
    /// The wire `type` tag of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Reg(_) => "reg",
            Self::CreateRoom => "create_room",
            Self::AddUserToRoom(_) => "add_user_to_room",
            Self::AddShips(_) => "add_ships",
            Self::Attack(_) => "attack",
            Self::RandomAttack(_) => "randomAttack",
            Self::SinglePlay => "single_play",
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound payloads
// ---------------------------------------------------------------------------

/// `reg` reply. On failure `index` is `null` and `errorText` says why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegResponse {
    pub name: String,
    pub index: Option<UserId>,
    pub error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_text: Option<String>,
}

/// A seated user inside a room listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomUser {
    pub name: String,
    pub index: UserId,
}

/// One entry of `update_room`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub room_users: Vec<RoomUser>,
}

/// One entry of `update_winners`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    pub name: String,
    pub wins: u32,
}

/// `create_game`, sent to each player with their own id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGame {
    pub id_game: GameId,
    pub id_player: UserId,
}

/// `start_game`, sent to each player with their own fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartGame {
    pub ships: Vec<ShipPlacement>,
    pub current_player_index: UserId,
}

/// `turn`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub current_player: UserId,
}

/// `attack` reply: one attacked (or revealed) cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackFeedback {
    pub current_player: UserId,
    pub status: AttackStatus,
    pub position: Position,
}

/// `finish`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finish {
    pub win_player: UserId,
}

/// A server → client message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    Reg(RegResponse),
    UpdateRoom(Vec<RoomSummary>),
    UpdateWinners(Vec<Winner>),
    CreateGame(CreateGame),
    StartGame(StartGame),
    Turn(Turn),
    Attack(AttackFeedback),
    Finish(Finish),
}

impl ServerMessage {
    /// The wire `type` tag of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Reg(_) => "reg",
            Self::UpdateRoom(_) => "update_room",
            Self::UpdateWinners(_) => "update_winners",
            Self::CreateGame(_) => "create_game",
            Self::StartGame(_) => "start_game",
            Self::Turn(_) => "turn",
            Self::Attack(_) => "attack",
            Self::Finish(_) => "finish",
        }
    }
}
