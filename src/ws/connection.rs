//! Per-connection WebSocket task.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use crate::app_state::AppState;
use crate::domain::Room;
use crate::session::Role;
use crate::ws::messages::{WsCommand, error_frame, reply};
use crate::domain::ClientId;

/// Drives one WebSocket connection until either side closes.
///
/// Outbound traffic (the registry queue) and inbound client frames are
/// multiplexed with `select!`; the connection is deregistered on exit
/// regardless of which side terminated first.
pub async fn run_connection(socket: WebSocket, state: AppState) {
    let (client_id, mut outbound) = state.registry.register().await;
    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            queued = outbound.recv() => {
                let Some(payload) = queued else { break };
                let text = match serde_json::to_string(&payload) {
                    Ok(text) => text,
                    Err(error) => {
                        tracing::warn!(%client_id, %error, "dropping unserializable frame");
                        continue;
                    }
                };
                if ws_tx.send(Message::text(text)).await.is_err() {
                    break;
                }
            }
            frame = ws_rx.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(response) = handle_text(&text, client_id, &state).await
                            && let Ok(text) = serde_json::to_string(&response)
                            && ws_tx.send(Message::text(text)).await.is_err()
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {} // Binary and control frames are ignored.
                }
            }
        }
    }

    state.registry.disconnect(client_id).await;
}

/// Handles one inbound text frame, returning the reply to send, if any.
async fn handle_text(
    text: &str,
    client_id: ClientId,
    state: &AppState,
) -> Option<serde_json::Value> {
    let command = match serde_json::from_str::<WsCommand>(text) {
        Ok(command) => command,
        Err(_) => return Some(error_frame("unrecognized command")),
    };

    match command {
        WsCommand::JoinRoom { room, token } => {
            let Some(room) = Room::parse(&room) else {
                return Some(error_frame("unknown room"));
            };
            if room == Room::Admin && !is_admin(state, token.as_deref()).await {
                return Some(error_frame("admin room requires an admin session"));
            }
            state.registry.join_room(client_id, room).await;
            Some(reply("room_joined", serde_json::json!({ "room": room })))
        }
        WsCommand::LeaveRoom { room } => {
            let Some(room) = Room::parse(&room) else {
                return Some(error_frame("unknown room"));
            };
            state.registry.leave_room(client_id, room).await;
            Some(reply("room_left", serde_json::json!({ "room": room })))
        }
        WsCommand::Ping => Some(reply("pong", serde_json::json!({}))),
    }
}

async fn is_admin(state: &AppState, token: Option<&str>) -> bool {
    let Some(token) = token else { return false };
    state
        .sessions
        .verify_session(token)
        .await
        .is_some_and(|info| info.role == Role::Admin)
}
