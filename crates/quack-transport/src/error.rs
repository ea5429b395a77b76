use quack_protocol::{MessageType, ProtocolError};

/// Errors that can occur in the transport layer.
///
/// All of them are terminal for the connection involved; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection was already closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// The peer fell too far behind; the connection was dropped.
    #[error("send queue full: {0}")]
    SendQueueFull(String),

    /// Reading a frame failed part-way through.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding or accepting connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// Connecting to a server failed.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// A frame was malformed or could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A well-formed message arrived on the wrong side of the connection.
    #[error("unexpected {0:?} message for this side")]
    UnexpectedMessage(MessageType),
}
