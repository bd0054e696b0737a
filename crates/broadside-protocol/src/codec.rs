//! Codec trait and the envelope-level encode/decode built on it.
//!
//! A [`Codec`] turns Rust types into bytes and back. The envelope layer on
//! top is fixed by the protocol: the payload is always JSON-encoded into
//! the `data` string (double encoding), whatever the codec does with the
//! outer frame.

use serde::{Serialize, de::DeserializeOwned};

use crate::{ClientMessage, Envelope, ProtocolError, ServerMessage};

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` so one codec can be shared by every connection
/// task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Decodes one inbound frame into a typed client message.
    fn decode_client(&self, data: &[u8]) -> Result<ClientMessage, ProtocolError> {
        let envelope: Envelope = self.decode(data)?;
        ClientMessage::from_envelope(&envelope)
    }

    /// Encodes a server message into one outbound frame.
    fn encode_server(&self, msg: &ServerMessage) -> Result<Vec<u8>, ProtocolError> {
        self.encode(&msg.to_envelope()?)
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`). This is what the browser
/// client speaks.
///
/// ```rust
/// use broadside_protocol::{Codec, JsonCodec, ServerMessage, Turn, UserId};
///
/// let bytes = JsonCodec
///     .encode_server(&ServerMessage::Turn(Turn { current_player: UserId(3) }))
///     .unwrap();
/// let text = String::from_utf8(bytes).unwrap();
/// assert_eq!(text, r#"{"type":"turn","data":"{\"currentPlayer\":3}","id":0}"#);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

// ---------------------------------------------------------------------------
// Envelope <-> message
// ---------------------------------------------------------------------------

impl ClientMessage {
    /// Interprets an envelope as a client message.
    ///
    /// Types without data ignore whatever payload came along. Types with
    /// data fail with [`ProtocolError::InvalidPayload`] if the payload is
    /// empty or malformed.
    pub fn from_envelope(envelope: &Envelope) -> Result<Self, ProtocolError> {
        let kind = envelope.kind.as_str();
        let payload = envelope.payload();
        match kind {
            "reg" => Ok(Self::Reg(parse_payload(kind, payload)?)),
            "create_room" => Ok(Self::CreateRoom),
            "add_user_to_room" => Ok(Self::AddUserToRoom(parse_payload(kind, payload)?)),
            "add_ships" => Ok(Self::AddShips(parse_payload(kind, payload)?)),
            "attack" => Ok(Self::Attack(parse_payload(kind, payload)?)),
            "randomAttack" => Ok(Self::RandomAttack(parse_payload(kind, payload)?)),
            "single_play" => Ok(Self::SinglePlay),
            other => Err(ProtocolError::UnknownType(other.to_string())),
        }
    }
}

fn parse_payload<T: DeserializeOwned>(
    kind: &str,
    payload: Option<serde_json::Value>,
) -> Result<T, ProtocolError> {
    let value = payload.ok_or_else(|| ProtocolError::InvalidPayload {
        kind: kind.to_string(),
        reason: "empty payload".into(),
    })?;
    serde_json::from_value(value).map_err(|e| ProtocolError::InvalidPayload {
        kind: kind.to_string(),
        reason: e.to_string(),
    })
}

impl ServerMessage {
    /// Wraps this message in an envelope, JSON-encoding the payload into
    /// the `data` string.
    pub fn to_envelope(&self) -> Result<Envelope, ProtocolError> {
        let data = match self {
            Self::Reg(p) => serde_json::to_string(p),
            Self::UpdateRoom(p) => serde_json::to_string(p),
            Self::UpdateWinners(p) => serde_json::to_string(p),
            Self::CreateGame(p) => serde_json::to_string(p),
            Self::StartGame(p) => serde_json::to_string(p),
            Self::Turn(p) => serde_json::to_string(p),
            Self::Attack(p) => serde_json::to_string(p),
            Self::Finish(p) => serde_json::to_string(p),
        }
        .map_err(ProtocolError::Encode)?;
        Ok(Envelope::new(self.kind(), data))
    }
}
