use quack_transport::TransportError;

/// Errors surfaced by [`GameClient`](crate::GameClient) and the client binary.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server closed the connection (or we were eaten).
    #[error("disconnected from server")]
    Disconnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err: ClientError = TransportError::ConnectionClosed("bye".into()).into();
        assert!(matches!(err, ClientError::Transport(_)));
        assert!(err.to_string().contains("bye"));
    }

    #[test]
    fn test_disconnected_message() {
        assert_eq!(ClientError::Disconnected.to_string(), "disconnected from server");
    }
}
