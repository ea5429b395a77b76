//! Unified error type for the Quack server.

use quack_transport::TransportError;

/// Top-level error returned by the server's public API.
///
/// Everything that can stop the server (binding, reading the bound address)
/// happens in the transport layer; per-connection and per-player failures
/// are handled inside the loop and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum QuackError {
    /// A transport-level error (bind, accept, local address).
    #[error(transparent)]
    Transport(#[from] TransportError),
}
