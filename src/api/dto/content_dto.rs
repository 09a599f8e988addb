//! DTOs for chat, schedule, and theme endpoints.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

/// Request body for `POST /chat/messages`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PostChatRequest {
    /// Message body; trimmed, must be non-empty, capped at 500 chars.
    pub body: String,
}

/// Query parameters for `GET /chat/messages`.
#[derive(Debug, Deserialize)]
pub struct ChatHistoryParams {
    /// Number of most recent messages to return (max 200). Defaults
    /// to 50.
    #[serde(default = "default_chat_limit")]
    pub limit: usize,
}

fn default_chat_limit() -> usize {
    50
}

/// Request body for `PUT /schedule/entries` (admin).
///
/// Sending an `id` that already exists replaces that entry.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertScheduleRequest {
    /// Entry id; omitted for new entries.
    #[serde(default)]
    pub id: Option<uuid::Uuid>,
    /// Stream title.
    pub title: String,
    /// Scheduled start time.
    pub starts_at: DateTime<Utc>,
    /// Optional blurb.
    #[serde(default)]
    pub description: Option<String>,
}

/// Request body for `PUT /theme` (admin).
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetThemeRequest {
    /// Preset name; must be one of the known presets.
    pub theme: String,
}
