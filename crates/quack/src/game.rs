//! The server's single-owner game loop state.
//!
//! [`GameLoop`] holds the world and the session registry and reacts to the
//! three things that can happen to a server: a socket is accepted, a
//! connection reports an event, or the tick scheduler fires. Every handler
//! is synchronous. Sends only queue frames on each connection's writer, so
//! the loop never waits on a slow peer and every peer sees messages in the
//! order the loop produced them.

use std::net::SocketAddr;

use quack_protocol::{Disconnected, Message, PlayerId};
use quack_session::{player_for, SessionRegistry};
use quack_sim::{Physics, World};
use quack_tick::{Cadence, TickInfo};
use quack_transport::{ConnectionEvent, EventSender};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

use crate::ServerConfig;

pub(crate) struct GameLoop<P: Physics> {
    world: World<P>,
    registry: SessionRegistry,
    events: EventSender,
    /// Parent of every connection's receive-task token.
    cancel: CancellationToken,
    broadcast: Cadence,
    scoreboard: Option<Cadence>,
    /// Set once shutdown starts; suppresses further broadcasts.
    draining: bool,
}

impl<P: Physics> GameLoop<P> {
    pub(crate) fn new(
        world: World<P>,
        events: EventSender,
        cancel: CancellationToken,
        config: &ServerConfig,
    ) -> Self {
        Self {
            world,
            registry: SessionRegistry::new(),
            events,
            cancel,
            broadcast: Cadence::new(config.broadcast_interval),
            scoreboard: config.scoreboard_interval.map(Cadence::new),
            draining: false,
        }
    }

    pub(crate) fn player_count(&self) -> usize {
        self.registry.len()
    }

    /// Registers a new socket and starts reading from it.
    ///
    /// The player gets no duck until it sends `Join`.
    pub(crate) fn handle_accept(&mut self, stream: TcpStream, addr: SocketAddr) {
        let (player_id, conn) = self.registry.register(stream, self.events.clone());
        conn.start_receiving(self.cancel.child_token());
        tracing::debug!(%player_id, %addr, players = self.registry.len(), "connection accepted");
    }

    pub(crate) fn handle_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Message { id, message } => {
                self.handle_message(player_for(id), message);
            }
            ConnectionEvent::Disconnected { id } => self.handle_disconnect(player_for(id)),
        }
    }

    fn handle_message(&mut self, player_id: PlayerId, message: Message) {
        // Messages already queued when a connection was closed (eaten,
        // broken pipe) must not act on the world.
        let Some(conn) = self.registry.get(player_id) else {
            return;
        };
        if conn.is_disconnected() {
            return;
        }

        match message {
            Message::Join { name } => match self.world.join(player_id, name) {
                Ok(welcome) => {
                    if let Err(e) = conn.send(&Message::Welcome(welcome)) {
                        tracing::debug!(%player_id, error = %e, "welcome not delivered");
                    }
                }
                Err(e) => tracing::debug!(%player_id, error = %e, "join ignored"),
            },
            Message::Input(input) => {
                if let Err(e) = self.world.apply_input(player_id, input) {
                    tracing::debug!(%player_id, error = %e, "input ignored");
                }
            }
            other => {
                tracing::debug!(%player_id, kind = ?other.kind(), "ignoring unexpected message");
            }
        }
    }

    fn handle_disconnect(&mut self, player_id: PlayerId) {
        if !self.registry.unregister(player_id) {
            return;
        }
        self.world.leave(player_id);
        tracing::info!(%player_id, players = self.registry.len(), "player disconnected");

        if !self.draining {
            self.broadcast(&Message::Disconnected(Disconnected { player_id }));
        }
    }

    pub(crate) fn handle_tick(&mut self, tick: TickInfo) {
        let outcome = self.world.tick(tick.dt);

        // The prey's duck is already gone; closing the connection leads to
        // the usual Disconnected handling.
        for predation in outcome.eaten {
            if let Some(conn) = self.registry.get(predation.prey) {
                conn.disconnect();
            }
        }

        if self.broadcast.advance(tick.dt) {
            let update = self.world.take_update();
            self.broadcast(&Message::UpdateState(update));
        }

        if let Some(cadence) = &mut self.scoreboard {
            if cadence.advance(tick.dt) && self.world.duck_count() > 0 {
                tracing::info!(
                    game_time = self.world.game_time(),
                    "scoreboard\n{}",
                    self.world.scoreboard()
                );
            }
        }
    }

    /// Closes every connection. Their `Disconnected` events still have to be
    /// fed back through [`handle_event`](Self::handle_event).
    pub(crate) fn disconnect_all(&mut self) {
        self.draining = true;
        self.cancel.cancel();
        self.registry.disconnect_all();
    }

    fn broadcast(&self, message: &Message) {
        match self.registry.broadcast(message, None) {
            Ok(broadcast) => {
                broadcast.send();
            }
            Err(e) => tracing::error!(kind = ?message.kind(), error = %e, "failed to encode broadcast"),
        }
    }
}
