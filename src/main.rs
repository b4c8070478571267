mod net;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use arcade_vehicle::config::ServerConfig;
use arcade_vehicle::rapier_host::PhysicsWorld;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::net::start_websocket_server;
use crate::state::SharedGameState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("arcade_vehicle=info,vehicle_server=info")),
        )
        .init();

    // optional config path as the only argument
    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => match ServerConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                error!(path = %path.display(), %err, "config load failed");
                return;
            }
        },
        None => ServerConfig::default(),
    };

    info!(bind = %config.bind_addr, tick_hz = config.tick_hz, vehicle = ?config.vehicle, "starting vehicle server");

    let listener = match TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(bind = %config.bind_addr, %err, "failed to bind WebSocket port");
            return;
        }
    };

    let dt = config.tick_dt();
    let mut physics_world = PhysicsWorld::new();
    let mut game_state = SharedGameState::new(config);
    game_state.spawn_ai_vehicles(&mut physics_world);

    let state = Arc::new(Mutex::new(game_state));
    let physics = Arc::new(Mutex::new(physics_world));

    tokio::spawn(start_websocket_server(
        listener,
        Arc::clone(&state),
        Arc::clone(&physics),
    ));

    // Fixed timestep
    let mut ticker = interval(Duration::from_secs_f32(dt));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let mut game = state.lock().await;
        let mut phys = physics.lock().await;
        game.step(&mut phys, dt);
    }
}
