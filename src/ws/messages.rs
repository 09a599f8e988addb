//! Wire format for client-to-server WebSocket commands and the
//! server's reply envelopes.

use serde::Deserialize;

/// Commands a connected client may send as JSON text frames.
///
/// Unknown `command` values fail deserialization and produce an error
/// frame rather than closing the connection.
#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Join a room. The admin room additionally requires a valid admin
    /// session token.
    JoinRoom {
        /// Room name (`public` or `admin`).
        room: String,
        /// Session token, required for the admin room.
        #[serde(default)]
        token: Option<String>,
    },
    /// Leave a room.
    LeaveRoom {
        /// Room name.
        room: String,
    },
    /// Liveness probe; answered with a `pong` frame.
    Ping,
}

/// Builds a server reply frame with a `type` tag and timestamp.
#[must_use]
pub fn reply(event_type: &str, mut payload: serde_json::Value) -> serde_json::Value {
    if let Some(map) = payload.as_object_mut() {
        map.insert("type".to_owned(), serde_json::json!(event_type));
        map.insert("timestamp".to_owned(), serde_json::json!(chrono::Utc::now()));
        payload
    } else {
        serde_json::json!({
            "type": event_type,
            "timestamp": chrono::Utc::now(),
            "payload": payload,
        })
    }
}

/// Builds an error frame. The connection stays open.
#[must_use]
pub fn error_frame(message: &str) -> serde_json::Value {
    reply("error", serde_json::json!({ "message": message }))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn join_room_command_parses() {
        let text = r#"{"command":"join_room","room":"admin","token":"abc"}"#;
        let Ok(WsCommand::JoinRoom { room, token }) = serde_json::from_str::<WsCommand>(text)
        else {
            panic!("expected join_room");
        };
        assert_eq!(room, "admin");
        assert_eq!(token.as_deref(), Some("abc"));
    }

    #[test]
    fn unknown_command_is_rejected() {
        let text = r#"{"command":"self_destruct"}"#;
        assert!(serde_json::from_str::<WsCommand>(text).is_err());
    }

    #[test]
    fn reply_injects_type_and_timestamp() {
        let frame = reply("pong", serde_json::json!({}));
        assert_eq!(frame.get("type").and_then(|v| v.as_str()), Some("pong"));
        assert!(frame.get("timestamp").is_some());
    }
}
