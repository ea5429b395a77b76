//! Client side of Quack.
//!
//! - [`SnapshotBuffer`] smooths each remote duck's jittery snapshot stream
//!   into continuous motion.
//! - [`ClientWorld`] is the client's copy of the pond, rebuilt from
//!   `Welcome` and kept current by `UpdateState` and `Disconnected`.
//! - [`GameClient`] owns the connection and feeds received messages into
//!   the world on the caller's schedule.

mod client;
mod error;
mod snapshot;
mod world;

pub use client::{ClientEvent, GameClient};
pub use error::ClientError;
pub use snapshot::{
    lerp_angle, playback_speed, segment_duration, Pose, SnapshotBuffer, DEFAULT_SEGMENT,
    MAX_BACKLOG,
};
pub use world::{ClientWorld, Relation, PREDATION_RATIO};
