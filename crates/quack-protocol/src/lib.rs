//! Wire protocol for Quack.
//!
//! This crate defines the "language" that the game client and server speak:
//!
//! - **Frames** ([`FrameHeader`]): every message travels as a 5-byte header
//!   (`u32` little-endian payload length, `u8` message type) followed by the
//!   payload bytes.
//! - **Types** ([`Message`], [`DuckState`], [`FoodEvent`], etc.): the
//!   structures that travel on the wire.
//! - **Codec** ([`encode`], [`decode`]): how those messages are converted
//!   to/from bytes. High-frequency client messages (`Join`, `ClientInput`) use
//!   a compact binary layout; low-frequency server messages (`Welcome`,
//!   `UpdateState`, `Disconnected`) use JSON.
//! - **Scoreboard** ([`Scoreboard`]): the leaderboard both ends derive
//!   from duck snapshots.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits below the transport's connection type (which
//! reads frames off a socket) and above nothing. It never touches I/O.
//!
//! ```text
//! Transport (socket) → Protocol (FrameHeader, Message) → Session / Simulation
//! ```

mod codec;
mod error;
mod frame;
mod scoreboard;
mod types;

pub use codec::{decode, encode};
pub use error::ProtocolError;
pub use frame::{FrameHeader, HEADER_LEN, MAX_PAYLOAD};
pub use scoreboard::{score_for, ScoreEntry, Scoreboard};
pub use types::{
    Disconnected, DuckState, FoodEvent, FoodEventKind, FoodId, FoodState,
    InputFlags, Message, MessageType, PlayerId, UpdateState, Welcome,
    TICKS_PER_SECOND,
};
