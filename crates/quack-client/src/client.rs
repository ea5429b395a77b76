//! The network side of a Quack client.

use std::sync::Arc;

use quack_protocol::{InputFlags, Message, PlayerId};
use quack_transport::{Connection, ConnectionEvent, EventReceiver};
use tokio::net::ToSocketAddrs;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{ClientError, ClientWorld};

/// Something that changed the client's world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    /// The server accepted our Join.
    Welcomed(PlayerId),
    /// A state broadcast was applied.
    Updated,
    /// Another player left or was eaten.
    PlayerLeft(PlayerId),
    /// The connection is gone. No further events follow.
    Disconnected,
}

/// A connected client: the connection plus the world it keeps current.
///
/// Incoming messages are queued by the connection's receive task and only
/// applied to the world when the owner calls [`poll`](Self::poll) or
/// [`next_event`](Self::next_event), so the world is never touched from the
/// network task.
pub struct GameClient {
    conn: Arc<Connection>,
    events: EventReceiver,
    world: ClientWorld,
    last_input: Option<InputFlags>,
    connected: bool,
}

impl GameClient {
    /// Connects and starts receiving. Cancelling `cancel` stops the receive
    /// loop and disconnects.
    pub async fn connect(
        addr: impl ToSocketAddrs,
        cancel: CancellationToken,
    ) -> Result<Self, ClientError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = Connection::connect(addr, tx).await?;
        conn.start_receiving(cancel);
        Ok(Self {
            conn,
            events: rx,
            world: ClientWorld::new(),
            last_input: None,
            connected: true,
        })
    }

    /// Asks the server for a duck. The Welcome arrives as
    /// [`ClientEvent::Welcomed`].
    pub fn join(&self, name: &str) -> Result<(), ClientError> {
        if !self.is_connected() {
            return Err(ClientError::Disconnected);
        }
        self.conn.send(&Message::Join {
            name: name.to_string(),
        })?;
        tracing::debug!(name, "join sent");
        Ok(())
    }

    /// Sends `input` if it differs from the last input sent.
    ///
    /// Returns whether a message went out.
    pub fn set_input(&mut self, input: InputFlags) -> Result<bool, ClientError> {
        if !self.is_connected() {
            return Err(ClientError::Disconnected);
        }
        if self.last_input == Some(input) {
            return Ok(false);
        }
        self.conn.send(&Message::Input(input))?;
        self.last_input = Some(input);
        Ok(true)
    }

    /// Applies every event already received, without waiting.
    pub fn poll(&mut self) -> Vec<ClientEvent> {
        let mut applied = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            if let Some(event) = self.apply(event) {
                applied.push(event);
            }
        }
        applied
    }

    /// Waits for the next event that changes the world and applies it.
    ///
    /// Returns `None` once the connection is gone and every event queued
    /// before it went has been consumed.
    pub async fn next_event(&mut self) -> Option<ClientEvent> {
        loop {
            let event = if self.connected {
                self.events.recv().await?
            } else {
                self.events.try_recv().ok()?
            };
            if let Some(applied) = self.apply(event) {
                return Some(applied);
            }
        }
    }

    fn apply(&mut self, event: ConnectionEvent) -> Option<ClientEvent> {
        match event {
            ConnectionEvent::Message { message, .. } => match message {
                Message::Welcome(welcome) => {
                    let id = welcome.player_id;
                    tracing::info!(player = %id, ducks = welcome.ducks.len(), food = welcome.food.len(), "welcomed");
                    self.world.apply_welcome(welcome);
                    Some(ClientEvent::Welcomed(id))
                }
                Message::UpdateState(update) => {
                    if self.world.apply_update(update) {
                        Some(ClientEvent::Updated)
                    } else {
                        tracing::debug!("update before welcome dropped");
                        None
                    }
                }
                Message::Disconnected(gone) => {
                    self.world.remove_duck(gone.player_id);
                    tracing::debug!(player = %gone.player_id, "player left");
                    Some(ClientEvent::PlayerLeft(gone.player_id))
                }
                other => {
                    tracing::debug!(kind = ?other.kind(), "ignoring unexpected message");
                    None
                }
            },
            ConnectionEvent::Disconnected { .. } => {
                if !self.connected {
                    return None;
                }
                self.connected = false;
                tracing::info!("disconnected from server");
                Some(ClientEvent::Disconnected)
            }
        }
    }

    /// Closes the connection.
    pub fn disconnect(&self) {
        self.conn.disconnect();
    }

    pub fn is_connected(&self) -> bool {
        self.connected && !self.conn.is_disconnected()
    }

    pub fn my_id(&self) -> Option<PlayerId> {
        self.world.my_id()
    }

    pub fn world(&self) -> &ClientWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut ClientWorld {
        &mut self.world
    }
}

impl std::fmt::Debug for GameClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameClient")
            .field("conn", &self.conn)
            .field("my_id", &self.world.my_id())
            .field("connected", &self.connected)
            .finish()
    }
}
