//! Core protocol types for Quack's wire format.
//!
//! Everything here is either a frame discriminant ([`MessageType`]) or a
//! structure that ends up inside a frame payload.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ProtocolError;

/// Number of timestamp ticks per second (100 ns resolution).
///
/// `DuckState::timestamp` is expressed in these units; clients divide a
/// timestamp delta by this constant to get an interpolation duration.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player (and the duck that player controls).
///
/// Ids are assigned by the server registry, starting at 1, and are never
/// reused within a server run. `#[serde(transparent)]` keeps the JSON form a
/// plain number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a food item.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FoodId(pub u32);

impl fmt::Display for FoodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// MessageType: the frame's type byte
// ---------------------------------------------------------------------------

/// The one-byte discriminant carried in every frame header.
///
/// Decoding is keyed purely on this byte; payloads are never
/// self-describing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Reserved. Never produced; rejected on decode.
    Empty = 0,
    /// Client → server: binary `[i32 name length][UTF-8 name]`.
    Join = 1,
    /// Server → client: JSON [`Welcome`].
    Welcome = 2,
    /// Client → server: one byte of [`InputFlags`].
    ClientInput = 3,
    /// Server → client: JSON [`UpdateState`].
    UpdateState = 4,
    /// Server → client: JSON [`Disconnected`].
    Disconnected = 5,
}

impl MessageType {
    /// Whether messages of this type travel from client to server.
    pub fn is_client_message(self) -> bool {
        matches!(self, Self::Join | Self::ClientInput)
    }

    /// Whether messages of this type travel from server to client.
    pub fn is_server_message(self) -> bool {
        matches!(self, Self::Welcome | Self::UpdateState | Self::Disconnected)
    }
}

impl TryFrom<u8> for MessageType {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Empty),
            1 => Ok(Self::Join),
            2 => Ok(Self::Welcome),
            3 => Ok(Self::ClientInput),
            4 => Ok(Self::UpdateState),
            5 => Ok(Self::Disconnected),
            other => Err(ProtocolError::UnknownMessageType(other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A player's control state, sent whenever it changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct InputFlags {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub sprint: bool,
}

impl InputFlags {
    pub const UP: u8 = 1 << 0;
    pub const DOWN: u8 = 1 << 1;
    pub const LEFT: u8 = 1 << 2;
    pub const RIGHT: u8 = 1 << 3;
    pub const SPRINT: u8 = 1 << 4;

    /// Packs the flags into the wire byte. Bits 5–7 are always zero.
    pub fn to_byte(self) -> u8 {
        let mut byte = 0;
        if self.up {
            byte |= Self::UP;
        }
        if self.down {
            byte |= Self::DOWN;
        }
        if self.left {
            byte |= Self::LEFT;
        }
        if self.right {
            byte |= Self::RIGHT;
        }
        if self.sprint {
            byte |= Self::SPRINT;
        }
        byte
    }

    /// Unpacks the wire byte, ignoring unused bits.
    pub fn from_byte(byte: u8) -> Self {
        Self {
            up: byte & Self::UP != 0,
            down: byte & Self::DOWN != 0,
            left: byte & Self::LEFT != 0,
            right: byte & Self::RIGHT != 0,
            sprint: byte & Self::SPRINT != 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Entity snapshots
// ---------------------------------------------------------------------------

/// One authoritative snapshot of a duck.
///
/// `timestamp` is the server's monotonic capture time in
/// [`TICKS_PER_SECOND`] units. Clients use it only to pace playback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuckState {
    pub id: PlayerId,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale: f32,
    pub timestamp: i64,
}

/// A food item's position. Food never moves, so this is all a client needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodState {
    pub id: FoodId,
    pub x: f32,
    pub y: f32,
}

/// Whether a food item appeared or was eaten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FoodEventKind {
    Spawn,
    Consumed,
}

/// A change to the food set since the previous `UpdateState`.
///
/// `Consumed` events carry only the id; their coordinates are zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodEvent {
    #[serde(rename = "type")]
    pub kind: FoodEventKind,
    pub food_id: FoodId,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

impl FoodEvent {
    pub fn spawn(food: &FoodState) -> Self {
        Self {
            kind: FoodEventKind::Spawn,
            food_id: food.id,
            x: food.x,
            y: food.y,
        }
    }

    pub fn consumed(food_id: FoodId) -> Self {
        Self {
            kind: FoodEventKind::Consumed,
            food_id,
            x: 0.0,
            y: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// JSON message bodies
// ---------------------------------------------------------------------------

/// Full world state, sent once to a player right after they join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Welcome {
    pub player_id: PlayerId,
    pub ducks: Vec<DuckState>,
    pub food: Vec<FoodState>,
    /// In-game clock, in game seconds.
    pub game_time: f64,
}

/// Periodic delta: every duck's latest snapshot plus food changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateState {
    pub ducks: Vec<DuckState>,
    pub food_events: Vec<FoodEvent>,
    pub game_time: f64,
}

/// Tells remaining players that someone left (or was eaten).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disconnected {
    pub player_id: PlayerId,
}

// ---------------------------------------------------------------------------
// Message: the tagged union
// ---------------------------------------------------------------------------

/// Every message that can travel in a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Join { name: String },
    Input(InputFlags),
    Welcome(Welcome),
    UpdateState(UpdateState),
    Disconnected(Disconnected),
}

impl Message {
    /// The type byte this message is framed with.
    pub fn kind(&self) -> MessageType {
        match self {
            Self::Join { .. } => MessageType::Join,
            Self::Input(_) => MessageType::ClientInput,
            Self::Welcome(_) => MessageType::Welcome,
            Self::UpdateState(_) => MessageType::UpdateState,
            Self::Disconnected(_) => MessageType::Disconnected,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
