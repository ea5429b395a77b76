//! Player session registry for Quack.
//!
//! This crate answers two questions for the server loop:
//!
//! 1. **Who is connected?**: [`SessionRegistry`] hands out player ids and
//!    keeps the live [`Connection`](quack_transport::Connection) for each.
//! 2. **How do I reach all of them?**: [`SessionRegistry::broadcast`]
//!    encodes a message once and fans it out concurrently.
//!
//! # How it fits in the stack
//!
//! ```text
//! Server loop (above)  ← owns the registry, the only writer
//!     ↕
//! Session Layer (this crate)  ← player ids, connection map, fan-out
//!     ↕
//! Transport Layer (below)  ← framed connections
//! ```

mod broadcast;
mod registry;

pub use broadcast::Broadcast;
pub use registry::{player_for, SessionRegistry};
