//! Transport layer for Quack.
//!
//! Provides the [`TcpTransport`] listener and the framed [`Connection`] that
//! both the server (one per accepted socket) and the client (one to the
//! server) use. A connection owns its socket, runs an independent receive
//! loop that turns frames into [`Message`](quack_protocol::Message)s, and
//! reports everything it learns through a [`ConnectionEvent`] channel.

mod connection;
mod error;
mod tcp;

pub use connection::{
    Connection, ConnectionEvent, EventReceiver, EventSender, SEND_QUEUE_CAPACITY, WRITE_TIMEOUT,
};
pub use error::TransportError;
pub use tcp::TcpTransport;

use std::fmt;

use quack_protocol::MessageType;

/// Opaque identifier for a connection.
///
/// On the server this is the player id the registry assigned; on the client
/// it is always [`ConnectionId::CLIENT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u32);

impl ConnectionId {
    /// The id a client uses for its single connection to the server.
    pub const CLIENT: ConnectionId = ConnectionId(0);

    /// Creates a new `ConnectionId` from a raw `u32`.
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the underlying `u32` value.
    pub fn into_inner(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Which end of the socket a [`Connection`] lives on.
///
/// Decides which message types the receive loop accepts: a server-side
/// connection only takes client messages and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The server's handle on one client socket.
    Server,
    /// The client's handle on its server socket.
    Client,
}

impl Side {
    /// Whether a frame of `kind` may arrive on this side.
    pub fn accepts(self, kind: MessageType) -> bool {
        match self {
            Side::Server => kind.is_client_message(),
            Side::Client => kind.is_server_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId::new(7).to_string(), "conn-7");
        assert_eq!(ConnectionId::CLIENT.to_string(), "conn-0");
    }

    #[test]
    fn test_server_side_accepts_only_client_messages() {
        assert!(Side::Server.accepts(MessageType::Join));
        assert!(Side::Server.accepts(MessageType::ClientInput));
        assert!(!Side::Server.accepts(MessageType::Welcome));
        assert!(!Side::Server.accepts(MessageType::Empty));
    }

    #[test]
    fn test_client_side_accepts_only_server_messages() {
        assert!(Side::Client.accepts(MessageType::Welcome));
        assert!(Side::Client.accepts(MessageType::UpdateState));
        assert!(Side::Client.accepts(MessageType::Disconnected));
        assert!(!Side::Client.accepts(MessageType::Join));
    }
}
