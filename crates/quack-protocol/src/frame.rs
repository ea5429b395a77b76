//! Frame header parsing.
//!
//! ```text
//! byte:  0   1   2   3   4   5 ..
//!       [ length (u32 LE) ][ty][ payload (length bytes) ]
//! ```

use crate::{MessageType, ProtocolError};

/// Size of the fixed frame header in bytes.
pub const HEADER_LEN: usize = 5;

/// Largest payload a single frame may carry.
pub const MAX_PAYLOAD: usize = 65536;

/// The parsed 5-byte header that precedes every payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Number of payload bytes that follow the header.
    pub length: u32,
    /// Which decoder the payload must go through.
    pub kind: MessageType,
}

impl FrameHeader {
    /// Parses a header, rejecting oversized lengths before the type byte is
    /// even looked at, so a hostile length never causes a payload read.
    pub fn parse(bytes: &[u8; HEADER_LEN]) -> Result<Self, ProtocolError> {
        let length = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if length as usize > MAX_PAYLOAD {
            return Err(ProtocolError::PayloadTooLarge {
                length: length as usize,
            });
        }
        let kind = MessageType::try_from(bytes[4])?;
        Ok(Self { length, kind })
    }

    /// Serializes the header into its wire form.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let len = self.length.to_le_bytes();
        [len[0], len[1], len[2], len[3], self.kind as u8]
    }
}
