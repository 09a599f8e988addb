//! Site content state: stream schedule, active theme, chat history.
//!
//! The thin broadcast-triggering controllers mutate this registry and
//! then push a notification through the event bus. None of it is
//! authoritative beyond the current process; it is presentation state.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::FanstageError;

/// Theme presets the site can switch between. The payloads themselves
/// (HTML/CSS) live in the frontend; the backend only tracks the name.
pub const THEME_PRESETS: [&str; 5] = ["midnight", "neon", "retro", "cozy", "tournament"];

/// One entry in the stream schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Entry identifier.
    pub id: uuid::Uuid,
    /// Stream title.
    pub title: String,
    /// Scheduled start time.
    pub starts_at: DateTime<Utc>,
    /// Optional blurb (game, guests, format).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A chat message as stored in the history ring and broadcast to rooms.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Message identifier.
    pub id: uuid::Uuid,
    /// Author's user id.
    pub user_id: String,
    /// Author's display name.
    pub username: String,
    /// Message body.
    pub body: String,
    /// Server receive timestamp.
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug)]
struct ContentState {
    schedule: Vec<ScheduleEntry>,
    theme: String,
    chat: VecDeque<ChatMessage>,
    chat_limit: usize,
}

/// Shared registry for schedule, theme, and recent chat.
#[derive(Debug)]
pub struct ContentRegistry {
    inner: RwLock<ContentState>,
}

impl ContentRegistry {
    /// Creates a registry with the default theme and an empty schedule.
    #[must_use]
    pub fn new(chat_limit: usize) -> Self {
        Self {
            inner: RwLock::new(ContentState {
                schedule: Vec::new(),
                theme: THEME_PRESETS.first().map_or("midnight", |t| t).to_string(),
                chat: VecDeque::new(),
                chat_limit: chat_limit.max(1),
            }),
        }
    }

    /// Inserts or replaces a schedule entry (matched by id), returning
    /// the full schedule sorted by start time.
    pub async fn upsert_schedule_entry(&self, entry: ScheduleEntry) -> Vec<ScheduleEntry> {
        let mut state = self.inner.write().await;
        state.schedule.retain(|e| e.id != entry.id);
        state.schedule.push(entry);
        state.schedule.sort_by_key(|e| e.starts_at);
        state.schedule.clone()
    }

    /// Removes a schedule entry, returning the remaining schedule.
    ///
    /// # Errors
    ///
    /// Returns [`FanstageError::NotFound`] if no entry has the given id.
    pub async fn remove_schedule_entry(
        &self,
        id: uuid::Uuid,
    ) -> Result<Vec<ScheduleEntry>, FanstageError> {
        let mut state = self.inner.write().await;
        let before = state.schedule.len();
        state.schedule.retain(|e| e.id != id);
        if state.schedule.len() == before {
            return Err(FanstageError::NotFound(format!("schedule entry {id}")));
        }
        Ok(state.schedule.clone())
    }

    /// Current schedule, sorted by start time.
    pub async fn schedule(&self) -> Vec<ScheduleEntry> {
        self.inner.read().await.schedule.clone()
    }

    /// Switches the active theme to a known preset.
    ///
    /// # Errors
    ///
    /// Returns [`FanstageError::InvalidRequest`] for an unknown preset
    /// name.
    pub async fn set_theme(&self, name: &str) -> Result<String, FanstageError> {
        if !THEME_PRESETS.contains(&name) {
            return Err(FanstageError::InvalidRequest(format!(
                "unknown theme preset: {name}"
            )));
        }
        let mut state = self.inner.write().await;
        state.theme = name.to_string();
        Ok(state.theme.clone())
    }

    /// Currently active theme name.
    pub async fn theme(&self) -> String {
        self.inner.read().await.theme.clone()
    }

    /// Appends a chat message, evicting the oldest once the ring is
    /// full.
    pub async fn push_chat(&self, message: ChatMessage) {
        let mut state = self.inner.write().await;
        if state.chat.len() >= state.chat_limit {
            state.chat.pop_front();
        }
        state.chat.push_back(message);
    }

    /// Most recent chat messages, oldest first, capped at `limit`.
    pub async fn recent_chat(&self, limit: usize) -> Vec<ChatMessage> {
        let state = self.inner.read().await;
        let skip = state.chat.len().saturating_sub(limit);
        state.chat.iter().skip(skip).cloned().collect()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn entry(title: &str, offset_hours: i64) -> ScheduleEntry {
        ScheduleEntry {
            id: uuid::Uuid::new_v4(),
            title: title.to_string(),
            starts_at: Utc::now() + chrono::Duration::hours(offset_hours),
            description: None,
        }
    }

    #[tokio::test]
    async fn schedule_upsert_replaces_by_id() {
        let registry = ContentRegistry::new(10);
        let mut e = entry("friday stream", 24);
        let _ = registry.upsert_schedule_entry(e.clone()).await;

        e.title = "friday stream (moved)".to_string();
        let schedule = registry.upsert_schedule_entry(e).await;
        assert_eq!(schedule.len(), 1);
        assert_eq!(
            schedule.first().map(|e| e.title.as_str()),
            Some("friday stream (moved)")
        );
    }

    #[tokio::test]
    async fn schedule_is_sorted_by_start() {
        let registry = ContentRegistry::new(10);
        let _ = registry.upsert_schedule_entry(entry("later", 48)).await;
        let schedule = registry.upsert_schedule_entry(entry("sooner", 2)).await;
        let titles: Vec<&str> = schedule.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["sooner", "later"]);
    }

    #[tokio::test]
    async fn remove_unknown_entry_errors() {
        let registry = ContentRegistry::new(10);
        let result = registry.remove_schedule_entry(uuid::Uuid::new_v4()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn theme_rejects_unknown_preset() {
        let registry = ContentRegistry::new(10);
        assert!(registry.set_theme("neon").await.is_ok());
        assert!(registry.set_theme("brutalist").await.is_err());
        assert_eq!(registry.theme().await, "neon");
    }

    #[tokio::test]
    async fn chat_ring_evicts_oldest() {
        let registry = ContentRegistry::new(2);
        for i in 0..3 {
            registry
                .push_chat(ChatMessage {
                    id: uuid::Uuid::new_v4(),
                    user_id: "user-a".to_string(),
                    username: "ada".to_string(),
                    body: format!("msg {i}"),
                    sent_at: Utc::now(),
                })
                .await;
        }
        let recent = registry.recent_chat(10).await;
        let bodies: Vec<&str> = recent.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["msg 1", "msg 2"]);
    }
}
