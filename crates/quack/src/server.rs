//! `QuackServer` builder and server loop.
//!
//! This is the entry point for running a Quack server. It ties together
//! all the layers: transport → session → simulation, driven by the tick
//! scheduler.

use std::net::SocketAddr;
use std::time::Duration;

use quack_sim::{ArenaPhysics, SimConfig, World};
use quack_tick::TickScheduler;
use quack_transport::TcpTransport;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::game::GameLoop;
use crate::{QuackError, ServerConfig};

/// Builder for configuring and starting a Quack server.
///
/// # Example
///
/// ```rust,ignore
/// let server = QuackServer::builder()
///     .bind("0.0.0.0:6700")
///     .tick_rate(60)
///     .build()
///     .await?;
/// server.run(shutdown_token).await
/// ```
pub struct QuackServerBuilder {
    config: ServerConfig,
}

impl QuackServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the simulation tick rate in Hz.
    pub fn tick_rate(mut self, hz: u32) -> Self {
        self.config.tick.tick_rate_hz = hz;
        self
    }

    /// Sets how often `UpdateState` is broadcast.
    pub fn broadcast_interval(mut self, interval: Duration) -> Self {
        self.config.broadcast_interval = interval;
        self
    }

    /// Sets the size of the food pool.
    pub fn food_count(mut self, count: usize) -> Self {
        self.config.sim.food_count = count;
        self
    }

    /// Replaces the gameplay tuning.
    pub fn sim_config(mut self, sim: SimConfig) -> Self {
        self.config.sim = sim;
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds the listener. The server does nothing until
    /// [`QuackServer::run`] is awaited.
    pub async fn build(self) -> Result<QuackServer, QuackError> {
        let transport = TcpTransport::bind(&self.config.bind_addr).await?;
        Ok(QuackServer {
            transport,
            config: self.config,
        })
    }
}

impl Default for QuackServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Quack server.
///
/// Call [`run()`](Self::run) to start accepting players.
pub struct QuackServer {
    transport: TcpTransport,
    config: ServerConfig,
}

impl QuackServer {
    /// Creates a new builder.
    pub fn builder() -> QuackServerBuilder {
        QuackServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, QuackError> {
        Ok(self.transport.local_addr()?)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Runs the server until `shutdown` is cancelled.
    ///
    /// A single task owns the world and the session registry. It accepts
    /// sockets, handles connection events, and ticks the simulation, so no
    /// game state is ever shared between tasks. On shutdown every player is
    /// disconnected before this returns.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), QuackError> {
        let physics = ArenaPhysics::new(self.config.arena.clone());
        let world = World::new(self.config.sim.clone(), physics);
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let mut game = GameLoop::new(world, events_tx, shutdown.child_token(), &self.config);
        let mut scheduler = TickScheduler::new(self.config.tick.clone());

        tracing::info!(
            addr = %self.transport.local_addr()?,
            tick_rate = scheduler.tick_rate_hz(),
            broadcast_ms = self.config.broadcast_interval.as_millis() as u64,
            food = self.config.sim.food_count,
            "quack server running"
        );

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                tick = scheduler.wait_for_tick() => {
                    game.handle_tick(tick);
                    scheduler.record_tick_end();
                }

                Some(event) = events_rx.recv() => game.handle_event(event),

                accepted = self.transport.accept() => match accepted {
                    Ok((stream, addr)) => game.handle_accept(stream, addr),
                    Err(e) => tracing::error!(error = %e, "accept failed"),
                },
            }
        }

        tracing::info!(players = game.player_count(), "quack server shutting down");
        game.disconnect_all();
        // `disconnect()` queues its event synchronously, so everything
        // left to clean up is already in the channel.
        while let Ok(event) = events_rx.try_recv() {
            game.handle_event(event);
        }
        tracing::info!(
            ticks = scheduler.tick_count(),
            overruns = scheduler.total_overruns(),
            "quack server stopped"
        );
        Ok(())
    }
}
