use std::sync::Arc;

use arcade_vehicle::protocol::{self, ClientFrame, TextFrame};
use arcade_vehicle::rapier_host::PhysicsWorld;
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::state::SharedGameState;

/// Accepts WebSocket clients forever. Lock order everywhere: state, then physics.
pub async fn start_websocket_server(
    listener: TcpListener,
    state: Arc<Mutex<SharedGameState>>,
    physics: Arc<Mutex<PhysicsWorld>>,
) {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "WebSocket listening");
    }

    loop {
        let (raw, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(err) => {
                warn!(%err, "accept failed");
                continue;
            }
        };
        let state_clone = Arc::clone(&state);
        let physics_clone = Arc::clone(&physics);

        tokio::spawn(async move {
            if let Err(err) = handle_connection(raw, state_clone, physics_clone).await {
                warn!(%peer, %err, "connection closed with error");
            }
        });
    }
}

async fn handle_connection(
    raw: TcpStream,
    state: Arc<Mutex<SharedGameState>>,
    physics: Arc<Mutex<PhysicsWorld>>,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let ws = accept_async(raw).await?;
    let (mut write, mut read) = ws.split();

    // -------------------------------
    // 1) Outgoing message channel + send loop
    // -------------------------------
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if write.send(msg).await.is_err() {
                break;
            }
        }
    });

    // -------------------------------
    // 2) Player + vehicle
    // -------------------------------
    let player_id = Uuid::new_v4();
    let vehicle_id = {
        let mut game = state.lock().await;
        let mut phys = physics.lock().await;
        game.add_player(&mut phys, player_id, tx.clone())
    };
    let Some(vehicle_id) = vehicle_id else {
        error!(player = %player_id, "could not spawn a vehicle, dropping connection");
        return Ok(());
    };

    info!(player = %player_id, vehicle = %vehicle_id, "player connected");

    match serde_json::to_string(&TextFrame::Welcome { player_id, vehicle_id }) {
        Ok(welcome) => {
            let _ = tx.send(Message::Text(welcome));
        }
        Err(err) => error!(%err, "welcome encoding failed"),
    }

    // -------------------------------
    // 3) Receive loop
    // -------------------------------
    while let Some(msg) = read.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(_) => break,
        };

        let bytes = match msg {
            Message::Binary(bytes) => bytes,
            Message::Close(_) => break,
            _ => continue,
        };

        let frame: ClientFrame = match protocol::decode(&bytes) {
            Ok(frame) => frame,
            Err(err) => {
                error!(player = %player_id, %err, "bad client frame");
                continue;
            }
        };

        let mut game = state.lock().await;
        let mut phys = physics.lock().await;
        game.handle_client_frame(&mut phys, &player_id, frame);
    }

    info!(player = %player_id, "player disconnected");
    let mut game = state.lock().await;
    let mut phys = physics.lock().await;
    game.remove_player(&mut phys, &player_id);
    Ok(())
}
