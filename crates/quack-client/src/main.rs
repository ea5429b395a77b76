use std::time::Duration;

use clap::Parser;
use quack_client::{ClientError, ClientEvent, GameClient};
use quack_protocol::InputFlags;
use quack_tick::{Cadence, TickScheduler};
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Headless Quack bot: joins a server and paddles around at random.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6700")]
    server: String,
    /// Duck name
    #[arg(short, long, default_value = "bot")]
    name: String,
    /// Stop after this many seconds
    #[arg(short, long)]
    duration: Option<u64>,
    /// Frames per second for local playback
    #[arg(long, default_value_t = 60)]
    fps: u32,
}

/// Mostly forward, with a random turn and the occasional sprint.
fn wander(rng: &mut impl Rng) -> InputFlags {
    let turn = rng.random_range(0..3);
    InputFlags {
        up: true,
        left: turn == 1,
        right: turn == 2,
        sprint: rng.random_range(0..5) == 0,
        ..InputFlags::default()
    }
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

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
    if let Some(secs) = args.duration {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            shutdown.cancel();
        });
    }

    let mut client = GameClient::connect(&args.server, shutdown.child_token()).await?;
    client.join(&args.name)?;

    let mut rng = rand::rng();
    let mut frames = TickScheduler::with_rate(args.fps);
    let mut steer = Cadence::new(Duration::from_secs(1));
    let mut report = Cadence::new(Duration::from_secs(5));

    loop {
        let frame = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            frame = frames.wait_for_tick() => frame,
        };

        for event in client.poll() {
            match event {
                ClientEvent::Welcomed(id) => tracing::info!(player = %id, "joined"),
                ClientEvent::PlayerLeft(id) => tracing::info!(player = %id, "player left"),
                ClientEvent::Disconnected => {
                    tracing::info!("server closed the connection");
                    return Ok(());
                }
                ClientEvent::Updated => {}
            }
        }
        client.world_mut().update(frame.dt);

        if client.world().is_joined() && steer.advance(frame.dt) {
            match client.set_input(wander(&mut rng)) {
                Ok(_) => {}
                // Closed under us; the Disconnected event is still queued.
                Err(ClientError::Disconnected) => continue,
                Err(e) => return Err(e),
            }
        }

        if report.advance(frame.dt) {
            if let Some(pose) = client.world().my_pose() {
                tracing::info!(
                    x = pose.position.x,
                    y = pose.position.y,
                    scale = pose.scale,
                    food = client.world().food_count(),
                    "scoreboard\n{}",
                    client.world().scoreboard()
                );
            }
        }
        frames.record_tick_end();
    }

    client.disconnect();
    Ok(())
}
