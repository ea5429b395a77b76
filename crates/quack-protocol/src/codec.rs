//! Encoding and decoding of message payloads.
//!
//! Two strategies live side by side and the frame's type byte alone picks
//! one:
//!
//! - **binary** for `Join` and `ClientInput`, which clients send often and
//!   which have a fixed, tiny shape;
//! - **JSON** (via `serde_json`) for `Welcome`, `UpdateState` and
//!   `Disconnected`, which carry nested arrays and are sent at most ~22 times
//!   per second.

use crate::{
    FrameHeader, InputFlags, Message, MessageType, ProtocolError, HEADER_LEN,
    MAX_PAYLOAD,
};

/// Size of the `i32` length prefix inside a `Join` payload.
const NAME_PREFIX_LEN: usize = 4;

/// Encodes a message into a complete frame (header followed by payload).
///
/// # Errors
/// Returns [`ProtocolError::PayloadTooLarge`] if the payload would exceed
/// [`MAX_PAYLOAD`], or [`ProtocolError::Encode`] if JSON serialization fails.
pub fn encode(message: &Message) -> Result<Vec<u8>, ProtocolError> {
    let payload = match message {
        Message::Join { name } => {
            let mut buf = Vec::with_capacity(NAME_PREFIX_LEN + name.len());
            let len = i32::try_from(name.len()).map_err(|_| {
                ProtocolError::PayloadTooLarge { length: name.len() }
            })?;
            buf.extend_from_slice(&len.to_le_bytes());
            buf.extend_from_slice(name.as_bytes());
            buf
        }
        Message::Input(flags) => vec![flags.to_byte()],
        Message::Welcome(body) => {
            serde_json::to_vec(body).map_err(ProtocolError::Encode)?
        }
        Message::UpdateState(body) => {
            serde_json::to_vec(body).map_err(ProtocolError::Encode)?
        }
        Message::Disconnected(body) => {
            serde_json::to_vec(body).map_err(ProtocolError::Encode)?
        }
    };

    if payload.len() > MAX_PAYLOAD {
        return Err(ProtocolError::PayloadTooLarge {
            length: payload.len(),
        });
    }

    let header = FrameHeader {
        length: payload.len() as u32,
        kind: message.kind(),
    };
    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.extend_from_slice(&header.to_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Decodes a payload whose type was announced by a frame header.
///
/// # Errors
/// Any mismatch between `payload` and the layout `kind` requires is a
/// [`ProtocolError`]; callers treat it as fatal to the connection.
pub fn decode(kind: MessageType, payload: &[u8]) -> Result<Message, ProtocolError> {
    match kind {
        MessageType::Join => decode_join(payload),
        MessageType::ClientInput => {
            if payload.len() != 1 {
                return Err(ProtocolError::PayloadLength {
                    kind,
                    expected: 1,
                    actual: payload.len(),
                });
            }
            Ok(Message::Input(InputFlags::from_byte(payload[0])))
        }
        MessageType::Welcome => serde_json::from_slice(payload)
            .map(Message::Welcome)
            .map_err(ProtocolError::Decode),
        MessageType::UpdateState => serde_json::from_slice(payload)
            .map(Message::UpdateState)
            .map_err(ProtocolError::Decode),
        MessageType::Disconnected => serde_json::from_slice(payload)
            .map(Message::Disconnected)
            .map_err(ProtocolError::Decode),
        MessageType::Empty => Err(ProtocolError::InvalidMessage(
            "message type 0 is reserved".into(),
        )),
    }
}

fn decode_join(payload: &[u8]) -> Result<Message, ProtocolError> {
    let Some((prefix, rest)) = payload.split_first_chunk::<NAME_PREFIX_LEN>() else {
        return Err(ProtocolError::PayloadLength {
            kind: MessageType::Join,
            expected: NAME_PREFIX_LEN,
            actual: payload.len(),
        });
    };

    let declared = i32::from_le_bytes(*prefix);
    let name_len = usize::try_from(declared).map_err(|_| {
        ProtocolError::InvalidMessage(format!("negative name length {declared}"))
    })?;
    if rest.len() != name_len {
        return Err(ProtocolError::PayloadLength {
            kind: MessageType::Join,
            expected: NAME_PREFIX_LEN + name_len,
            actual: payload.len(),
        });
    }

    let name = std::str::from_utf8(rest)?.to_owned();
    Ok(Message::Join { name })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Disconnected, DuckState, FoodEvent, FoodId, PlayerId, UpdateState,
    };

    /// Splits a frame into (header, payload) and checks the declared length.
    fn split(frame: &[u8]) -> (FrameHeader, &[u8]) {
        let header: [u8; HEADER_LEN] = frame[..HEADER_LEN].try_into().unwrap();
        let header = FrameHeader::parse(&header).unwrap();
        let payload = &frame[HEADER_LEN..];
        assert_eq!(header.length as usize, payload.len());
        (header, payload)
    }

    // =====================================================================
    // Binary messages
    // =====================================================================

    #[test]
    fn test_join_quack_encodes_to_literal_bytes() {
        let frame = encode(&Message::Join {
            name: "Quack".into(),
        })
        .unwrap();
        let (header, payload) = split(&frame);
        assert_eq!(header.kind, MessageType::Join);
        assert_eq!(
            payload,
            &[0x05, 0x00, 0x00, 0x00, 0x51, 0x75, 0x61, 0x63, 0x6B]
        );
    }

    #[test]
    fn test_join_frame_header_for_single_letter_name() {
        let frame = encode(&Message::Join { name: "B".into() }).unwrap();
        assert_eq!(&frame[..HEADER_LEN], &[5, 0, 0, 0, 1]);
    }

    #[test]
    fn test_join_decodes_multibyte_utf8_name() {
        let name = "Kačer 🦆".to_string();
        let frame = encode(&Message::Join { name: name.clone() }).unwrap();
        let (header, payload) = split(&frame);
        assert_eq!(decode(header.kind, payload).unwrap(), Message::Join { name });
    }

    #[test]
    fn test_join_truncated_prefix_is_rejected() {
        let err = decode(MessageType::Join, &[5, 0]).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::PayloadLength { expected: 4, actual: 2, .. }
        ));
    }

    #[test]
    fn test_join_short_name_is_rejected() {
        let err = decode(MessageType::Join, &[5, 0, 0, 0, b'Q', b'u']).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::PayloadLength { expected: 9, actual: 6, .. }
        ));
    }

    #[test]
    fn test_join_trailing_bytes_are_rejected() {
        let err = decode(MessageType::Join, &[1, 0, 0, 0, b'A', b'B']).unwrap_err();
        assert!(matches!(err, ProtocolError::PayloadLength { .. }));
    }

    #[test]
    fn test_join_negative_length_is_rejected() {
        let err = decode(MessageType::Join, &[0xFF, 0xFF, 0xFF, 0xFF]).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidMessage(_)));
    }

    #[test]
    fn test_join_invalid_utf8_is_rejected() {
        let err = decode(MessageType::Join, &[2, 0, 0, 0, 0xC3, 0x28]).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidUtf8(_)));
    }

    #[test]
    fn test_input_frame_is_one_byte() {
        let input = InputFlags {
            up: true,
            right: true,
            sprint: true,
            ..Default::default()
        };
        let frame = encode(&Message::Input(input)).unwrap();
        assert_eq!(frame, vec![1, 0, 0, 0, 3, 25]);
    }

    #[test]
    fn test_input_wrong_length_is_rejected() {
        let err = decode(MessageType::ClientInput, &[]).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::PayloadLength { expected: 1, actual: 0, .. }
        ));
        assert!(decode(MessageType::ClientInput, &[1, 2]).is_err());
    }

    // =====================================================================
    // JSON messages
    // =====================================================================

    #[test]
    fn test_update_state_round_trips() {
        let update = UpdateState {
            ducks: vec![DuckState {
                id: PlayerId(3),
                name: "Mallard".into(),
                x: -4.5,
                y: 12.25,
                rotation: 1.5,
                scale: 1.75,
                timestamp: 123_456_789,
            }],
            food_events: vec![
                FoodEvent::consumed(FoodId(1)),
                FoodEvent {
                    kind: crate::FoodEventKind::Spawn,
                    food_id: FoodId(51),
                    x: 10.0,
                    y: -20.0,
                },
            ],
            game_time: 3600.0,
        };
        let msg = Message::UpdateState(update);
        let frame = encode(&msg).unwrap();
        let (header, payload) = split(&frame);
        assert_eq!(header.kind, MessageType::UpdateState);
        assert_eq!(decode(header.kind, payload).unwrap(), msg);
    }

    #[test]
    fn test_decoder_is_chosen_by_type_byte_only() {
        // A valid Disconnected body announced as Welcome must not be
        // accepted as a Disconnected message.
        let body = serde_json::to_vec(&Disconnected {
            player_id: PlayerId(1),
        })
        .unwrap();
        assert!(matches!(
            decode(MessageType::Welcome, &body),
            Err(ProtocolError::Decode(_))
        ));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        assert!(matches!(
            decode(MessageType::Disconnected, b"{\"playerId\":"),
            Err(ProtocolError::Decode(_))
        ));
    }

    #[test]
    fn test_empty_type_never_decodes() {
        assert!(matches!(
            decode(MessageType::Empty, &[]),
            Err(ProtocolError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_oversized_outgoing_payload_is_rejected() {
        let name = "x".repeat(MAX_PAYLOAD);
        let err = encode(&Message::Join { name }).unwrap_err();
        assert!(matches!(err, ProtocolError::PayloadTooLarge { .. }));
    }
}
