//! # Quack
//!
//! Authoritative server for Quack, a multiplayer pond where ducks swim,
//! eat food to grow, and eat each other once they are big enough.
//!
//! The server owns the only copy of the game. Clients connect over TCP,
//! send `Join` and their held keys, and receive a `Welcome` snapshot
//! followed by a stream of `UpdateState` broadcasts.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quack::prelude::*;
//!
//! # async fn run() -> Result<(), QuackError> {
//! let server = QuackServer::builder().bind("0.0.0.0:6700").build().await?;
//! server.run(CancellationToken::new()).await
//! # }
//! ```

mod config;
mod error;
mod game;
mod server;

pub use config::ServerConfig;
pub use error::QuackError;
pub use server::{QuackServer, QuackServerBuilder};

pub mod prelude {
    pub use crate::{QuackError, QuackServer, QuackServerBuilder, ServerConfig};
    pub use quack_protocol::{InputFlags, Message, PlayerId};
    pub use quack_sim::SimConfig;
    pub use quack_tick::TickConfig;
    pub use tokio_util::sync::CancellationToken;
}
