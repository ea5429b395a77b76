//! Error types for the protocol layer.
//!
//! Every variant here is fatal to the connection that produced it: the
//! receive loop does not try to resynchronize a stream after a bad frame.

use crate::MessageType;

/// Errors that can occur while framing, encoding or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// JSON serialization of a server message failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// JSON deserialization failed: malformed JSON, missing fields, or
    /// wrong field types for the declared message type.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The header carried a type byte outside the `MessageType` enum.
    #[error("unknown message type {0}")]
    UnknownMessageType(u8),

    /// The header (or an outgoing message) declared more payload bytes than
    /// a frame may carry.
    #[error("payload of {length} bytes exceeds maximum of 65536")]
    PayloadTooLarge {
        /// Declared payload length.
        length: usize,
    },

    /// The payload size does not match what the message type requires.
    #[error("{kind:?} payload must be {expected} bytes, got {actual}")]
    PayloadLength {
        /// Message type named in the frame header.
        kind: MessageType,
        /// Length the binary layout requires.
        expected: usize,
        /// Length actually received.
        actual: usize,
    },

    /// A `Join` name was not valid UTF-8.
    #[error("invalid UTF-8 in name: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// The message is invalid at the protocol level even though its bytes
    /// parsed, e.g. a negative name length or a reserved type.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
