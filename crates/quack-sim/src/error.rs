use quack_protocol::PlayerId;

/// Errors from world operations.
///
/// These are application errors: the server loop logs them at debug level
/// and carries on; they are never reported to the peer.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SimError {
    /// No duck exists for this player (never joined, left, or was eaten).
    #[error("no duck for player {0}")]
    UnknownPlayer(PlayerId),

    /// The player already has a duck; a second `Join` is ignored.
    #[error("player {0} has already joined")]
    AlreadyJoined(PlayerId),
}
