//! Fan-out of one encoded frame.

use std::sync::Arc;

use quack_transport::Connection;

/// A prepared broadcast: one encoded frame plus a snapshot of its targets.
///
/// Built by [`SessionRegistry::broadcast`](crate::SessionRegistry::broadcast).
/// Nothing is queued until [`send`](Self::send) is called.
#[must_use = "a broadcast does nothing until `send` is called"]
pub struct Broadcast {
    frame: Arc<[u8]>,
    targets: Vec<Arc<Connection>>,
}

impl Broadcast {
    pub(crate) fn new(frame: Vec<u8>, targets: Vec<Arc<Connection>>) -> Self {
        Self {
            frame: frame.into(),
            targets,
        }
    }

    /// Number of connections this broadcast will write to.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Queues the frame on every target without waiting. Returns how many
    /// connections accepted it.
    ///
    /// Every connection has its own writer, so one stuck peer cannot hold
    /// up the rest. A peer whose queue is full disconnects itself.
    pub fn send(self) -> usize {
        let queued = self
            .targets
            .iter()
            .filter(|conn| conn.send_frame(Arc::clone(&self.frame)).is_ok())
            .count();
        if queued < self.targets.len() {
            tracing::debug!(
                queued,
                failed = self.targets.len() - queued,
                "broadcast partially delivered"
            );
        }
        queued
    }
}
