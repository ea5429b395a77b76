use std::time::Duration;

use clap::Parser;
use quack::prelude::*;
use tracing_subscriber::EnvFilter;

/// Authoritative Quack game server.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:6700")]
    bind: String,
    /// Simulation ticks per second
    #[arg(short, long, default_value_t = 60)]
    tick_rate: u32,
    /// Milliseconds between state broadcasts
    #[arg(long, default_value_t = 45)]
    broadcast_ms: u64,
    /// Number of food items in the pond
    #[arg(long, default_value_t = 50)]
    food: usize,
}

#[tokio::main]
async fn main() -> Result<(), QuackError> {
    // RUST_LOG=quack=debug,quack_transport=debug for per-connection detail
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let server = QuackServer::builder()
        .bind(&args.bind)
        .tick_rate(args.tick_rate)
        .broadcast_interval(Duration::from_millis(args.broadcast_ms))
        .food_count(args.food)
        .build()
        .await?;

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                return;
            }
            tracing::info!("ctrl-c received");
            shutdown.cancel();
        });
    }

    server.run(shutdown).await
}
