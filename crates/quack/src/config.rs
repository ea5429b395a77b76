use std::time::Duration;

use quack_sim::{ArenaConfig, SimConfig};
use quack_tick::TickConfig;

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: String,
    /// Simulation tick rate and overrun handling.
    pub tick: TickConfig,
    /// How often `UpdateState` is broadcast.
    pub broadcast_interval: Duration,
    /// How often the scoreboard is written to the log. `None` disables it.
    pub scoreboard_interval: Option<Duration>,
    pub sim: SimConfig,
    pub arena: ArenaConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:6700".to_string(),
            tick: TickConfig::default(),
            broadcast_interval: Duration::from_millis(45),
            scoreboard_interval: Some(Duration::from_secs(10)),
            sim: SimConfig::default(),
            arena: ArenaConfig::default(),
        }
    }
}
