//! Chat handlers: history and posting.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{ChatHistoryParams, PostChatRequest};
use crate::app_state::AppState;
use crate::domain::FanEvent;
use crate::domain::content::ChatMessage;
use crate::error::{ErrorResponse, FanstageError};
use crate::session::AuthSession;

/// Longest accepted chat message body.
const MAX_CHAT_BODY_CHARS: usize = 500;

/// `GET /chat/messages` — Recent chat history, oldest first.
pub async fn chat_history(
    State(state): State<AppState>,
    Query(params): Query<ChatHistoryParams>,
) -> impl IntoResponse {
    let limit = params.limit.clamp(1, 200);
    Json(state.content.recent_chat(limit).await)
}

/// `POST /chat/messages` — Post a chat message.
///
/// Thin controller: append to the history ring, then broadcast. The
/// response echoes the stored message.
///
/// # Errors
///
/// Returns [`FanstageError::InvalidRequest`] for an empty or oversized
/// body.
#[utoipa::path(
    post,
    path = "/api/v1/chat/messages",
    tag = "Chat",
    summary = "Post a chat message",
    description = "Appends the message to the bounded history ring and broadcasts it to the public room.",
    request_body = PostChatRequest,
    responses(
        (status = 201, description = "Stored message", body = serde_json::Value),
        (status = 400, description = "Empty or oversized body", body = ErrorResponse),
        (status = 401, description = "No live session", body = ErrorResponse),
    )
)]
pub async fn post_chat(
    State(state): State<AppState>,
    AuthSession(info): AuthSession,
    Json(req): Json<PostChatRequest>,
) -> Result<impl IntoResponse, FanstageError> {
    let body = req.body.trim();
    if body.is_empty() {
        return Err(FanstageError::InvalidRequest(
            "message body must not be empty".to_string(),
        ));
    }
    if body.chars().count() > MAX_CHAT_BODY_CHARS {
        return Err(FanstageError::InvalidRequest(format!(
            "message body exceeds {MAX_CHAT_BODY_CHARS} characters"
        )));
    }

    let message = ChatMessage {
        id: uuid::Uuid::new_v4(),
        user_id: info.user_id,
        username: info.username,
        body: body.to_string(),
        sent_at: Utc::now(),
    };
    state.content.push_chat(message.clone()).await;

    let _ = state.event_bus.publish(FanEvent::ChatPosted {
        message: message.clone(),
        timestamp: Utc::now(),
    });

    Ok((StatusCode::CREATED, Json(message)))
}

/// Chat routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/chat/messages", get(chat_history).post(post_chat))
}
