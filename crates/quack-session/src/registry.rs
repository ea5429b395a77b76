//! The session registry: tracks every live player connection.
//!
//! # Concurrency note
//!
//! `SessionRegistry` is NOT thread-safe by itself. It uses a plain
//! `HashMap` and is owned by the server's simulation loop, which is the
//! only task that registers or removes players. Broadcasts copy the target
//! list before any write starts, so the map can change while sends are in
//! flight.

use std::collections::HashMap;
use std::sync::Arc;

use quack_protocol::{Message, PlayerId, ProtocolError};
use quack_transport::{Connection, ConnectionId, EventSender, Side};
use tokio::net::TcpStream;

use crate::Broadcast;

/// Maps the id a server-side connection reports back to its player.
///
/// The registry creates every server-side connection with the player's id
/// as its connection id, so this is a plain conversion.
pub fn player_for(id: ConnectionId) -> PlayerId {
    PlayerId(id.into_inner())
}

/// Registry of connected players.
pub struct SessionRegistry {
    connections: HashMap<PlayerId, Arc<Connection>>,
    /// Next id to hand out. Ids are never reused within a server run.
    next_player_id: u32,
}

impl SessionRegistry {
    /// Creates an empty registry. The first player gets id 1.
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
            next_player_id: 1,
        }
    }

    /// Registers a freshly accepted socket.
    ///
    /// Assigns the next player id and wraps the stream in a server-side
    /// [`Connection`] that reports to `events`. The caller starts its
    /// receive loop.
    pub fn register(
        &mut self,
        stream: TcpStream,
        events: EventSender,
    ) -> (PlayerId, Arc<Connection>) {
        let player_id = PlayerId(self.next_player_id);
        self.next_player_id += 1;

        let conn = Connection::new(ConnectionId::new(player_id.0), stream, Side::Server, events);
        self.connections.insert(player_id, Arc::clone(&conn));

        tracing::info!(%player_id, peer = ?conn.peer_addr(), "player registered");
        (player_id, conn)
    }

    /// Removes a player's connection. Returns whether it was registered.
    pub fn unregister(&mut self, player_id: PlayerId) -> bool {
        let removed = self.connections.remove(&player_id).is_some();
        if removed {
            tracing::info!(%player_id, "player unregistered");
        }
        removed
    }

    /// Looks up a player's connection.
    pub fn get(&self, player_id: PlayerId) -> Option<&Arc<Connection>> {
        self.connections.get(&player_id)
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.connections.contains_key(&player_id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Ids of every registered player, in ascending order.
    pub fn player_ids(&self) -> Vec<PlayerId> {
        let mut ids: Vec<_> = self.connections.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Prepares a broadcast of `message` to every player except `exclude`.
    ///
    /// The message is encoded once here and the target list is copied, so
    /// the returned [`Broadcast`] is independent of later registry changes.
    ///
    /// # Errors
    /// Returns a [`ProtocolError`] if the message cannot be encoded.
    pub fn broadcast(
        &self,
        message: &Message,
        exclude: Option<PlayerId>,
    ) -> Result<Broadcast, ProtocolError> {
        let frame = quack_protocol::encode(message)?;
        let targets = self
            .connections
            .iter()
            .filter(|(id, _)| Some(**id) != exclude)
            .map(|(_, conn)| Arc::clone(conn))
            .collect();
        Ok(Broadcast::new(frame, targets))
    }

    /// Disconnects every registered connection (used on shutdown).
    ///
    /// Entries stay in the map; the `Disconnected` events that follow drive
    /// the normal removal path.
    pub fn disconnect_all(&self) {
        for conn in self.connections.values() {
            conn.disconnect();
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
