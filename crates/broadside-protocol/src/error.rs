//! Error types for the protocol layer.
//!
//! When you see a `ProtocolError`, the problem is in the shape of a frame,
//! not in networking or in game rules.

/// Errors that can occur while encoding or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The outer envelope could not be parsed.
    ///
    /// Common causes: malformed JSON or a missing `type` field.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The envelope names a message type the server does not handle.
    #[error("unknown message type {0:?}")]
    UnknownType(String),

    /// The envelope type is known but its payload is empty or has the
    /// wrong shape for that type.
    #[error("invalid {kind} payload: {reason}")]
    InvalidPayload {
        /// The envelope `type`.
        kind: String,
        /// What was wrong with it.
        reason: String,
    },
}
