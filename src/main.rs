//! Headless bot arena
//!
//! Soaks the full gameplay stack without a renderer: an in-process relay
//! plus a set of bot-driven client sessions that wander, shoot, die, and
//! respawn until ctrl-c.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arena_core::config::Config;
use arena_core::game::input::{Button, InputEvent};
use arena_core::game::session::{GameEvent, GameSession, SessionHandle};
use arena_core::game::world::ArenaWorld;
use arena_core::net::relay::RelayHub;
use arena_core::net::sync::NetSession;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    init_tracing(&config.log_level);

    info!("Starting bot arena");
    info!(bots = config.bot_count, room = %config.room_id, "spawning sessions");

    let hub = RelayHub::new();
    let base_seed = config.sim_seed.unwrap_or(0xa2e4a);

    for index in 0..config.bot_count {
        let bot_config = Config {
            player_name: format!("bot-{index}"),
            sim_seed: Some(base_seed.wrapping_add(index as u64)),
            ..config.clone()
        };

        let conn = hub.connect();
        let net = NetSession::connected(conn.peer_id, conn.outbound_tx);
        let session = GameSession::new(&bot_config, ArenaWorld::arena(), net);
        let handle = session.spawn(conn.inbound_rx);

        tokio::spawn(drive_bot(
            handle.clone(),
            base_seed.wrapping_add(index as u64),
        ));
        tokio::spawn(log_events(handle, bot_config.player_name));
    }

    shutdown_signal().await;

    info!(peers = hub.connected_peers(), "shutting down");
    Ok(())
}

/// Random-walk input driver for one bot session
async fn drive_bot(handle: SessionHandle, seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let input = handle.input_tx.clone();

    if input.send(InputEvent::PointerLock(true)).await.is_err() {
        return;
    }

    let mut tick = tokio::time::interval(Duration::from_millis(150));
    loop {
        tick.tick().await;

        let events = [
            InputEvent::PointerDelta {
                dx: rng.gen_range(-60.0..60.0),
                dy: rng.gen_range(-15.0..15.0),
            },
            toggle(&mut rng, Button::Forward, 0.7),
            toggle(&mut rng, Button::Left, 0.2),
            toggle(&mut rng, Button::Right, 0.2),
            toggle(&mut rng, Button::Jump, 0.1),
            toggle(&mut rng, Button::Fire, 0.4),
        ];

        for event in events {
            if input.send(event).await.is_err() {
                return;
            }
        }
    }
}

fn toggle(rng: &mut ChaCha8Rng, button: Button, hold_chance: f64) -> InputEvent {
    if rng.gen_bool(hold_chance) {
        InputEvent::ButtonDown(button)
    } else {
        InputEvent::ButtonUp(button)
    }
}

/// Log the combat-relevant slice of a session's event stream
async fn log_events(handle: SessionHandle, name: String) {
    let mut events = handle.subscribe();
    loop {
        match events.recv().await {
            Ok(GameEvent::HitReported { target_id, damage }) => {
                info!(bot = %name, target = %target_id, damage, "hit reported");
            }
            Ok(GameEvent::Died { killer_id }) => {
                info!(bot = %name, killer = ?killer_id, "died");
            }
            Ok(GameEvent::Respawned { .. }) => {
                info!(bot = %name, "respawned");
            }
            Ok(GameEvent::ScoreChanged { kills, deaths }) => {
                info!(bot = %name, kills, deaths, "score changed");
            }
            Ok(GameEvent::Disconnected) => {
                warn!(bot = %name, "disconnected");
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(bot = %name, lagged = n, "event stream lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            warn!("failed to install ctrl-c handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received ctrl-c, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
