//! `WebSocket` handler streaming delta batches to viewers.
//!
//! A client connecting to `GET /` first receives a snapshot of every
//! active cell, then one [`WireBatch`] per tick. Text frames from the
//! client are parsed as `INJECT_STATE` commands and queued for the next
//! tick. If a client falls behind, lagged batches are skipped.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use gridsync_types::{Command, WireBatch, WireCommand};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::state::EngineState;

/// Upgrade an HTTP request to the batch stream.
///
/// # Route
///
/// `GET /`
pub async fn ws_stream(
    ws: WebSocketUpgrade,
    State(state): State<Arc<EngineState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

async fn handle_ws(mut socket: WebSocket, state: Arc<EngineState>) {
    let (snapshot, mut rx) = state.join().await;
    info!(
        tick = snapshot.tick,
        active_cells = snapshot.cells.len(),
        "viewer connected"
    );
    if !send_batch(&mut socket, &snapshot).await {
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(batch) => {
                        if !send_batch(&mut socket, &batch).await {
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(skipped = n, "viewer lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!("broadcast channel closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => handle_command(&state, text.as_str()).await,
                    Some(Ok(Message::Close(_))) | None => {
                        info!("viewer disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("viewer disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {
                        // Binary and pong frames carry no commands.
                    }
                }
            }
        }
    }
}

/// Serialize and send one batch. Returns `false` once the client is gone.
async fn send_batch(socket: &mut WebSocket, batch: &WireBatch) -> bool {
    let json = match serde_json::to_string(batch) {
        Ok(j) => j,
        Err(e) => {
            warn!("failed to serialize batch: {e}");
            return true;
        }
    };
    if socket.send(Message::Text(json.into())).await.is_err() {
        debug!("viewer disconnected (send failed)");
        return false;
    }
    true
}

async fn handle_command(state: &EngineState, raw: &str) {
    let command = match serde_json::from_str::<WireCommand>(raw) {
        Ok(wire) => Command::try_from(wire),
        Err(e) => {
            warn!(error = %e, "ignoring unparseable command");
            return;
        }
    };
    match command {
        Ok(command) => match state.inject(command).await {
            Ok(()) => debug!(coord = %command.coord(), "command queued for next tick"),
            Err(e) => warn!(error = %e, "ignoring out-of-bounds command"),
        },
        Err(e) => warn!(error = %e, "ignoring invalid command"),
    }
}
