//! Stream schedule handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, put};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::UpsertScheduleRequest;
use crate::app_state::AppState;
use crate::domain::FanEvent;
use crate::domain::content::ScheduleEntry;
use crate::error::{ErrorResponse, FanstageError};
use crate::session::AdminSession;

/// `GET /schedule` — Upcoming schedule, sorted by start time.
pub async fn get_schedule(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.content.schedule().await)
}

/// `PUT /schedule/entries` — Insert or replace a schedule entry (admin).
///
/// Thin controller: mutate the schedule, then broadcast the full new
/// schedule.
///
/// # Errors
///
/// Returns [`FanstageError::InvalidRequest`] for an empty title.
#[utoipa::path(
    put,
    path = "/api/v1/schedule/entries",
    tag = "Schedule",
    summary = "Upsert a schedule entry",
    description = "Inserts a new entry, or replaces an existing one when the id matches. Broadcasts the full updated schedule. Admin only.",
    request_body = UpsertScheduleRequest,
    responses(
        (status = 200, description = "Full schedule after the change", body = serde_json::Value),
        (status = 400, description = "Empty title", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
    )
)]
pub async fn upsert_schedule_entry(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Json(req): Json<UpsertScheduleRequest>,
) -> Result<impl IntoResponse, FanstageError> {
    if req.title.trim().is_empty() {
        return Err(FanstageError::InvalidRequest(
            "schedule entry title must not be empty".to_string(),
        ));
    }

    let entry = ScheduleEntry {
        id: req.id.unwrap_or_else(uuid::Uuid::new_v4),
        title: req.title,
        starts_at: req.starts_at,
        description: req.description,
    };
    let entries = state.content.upsert_schedule_entry(entry).await;

    let _ = state.event_bus.publish(FanEvent::ScheduleUpdated {
        entries: entries.clone(),
        timestamp: Utc::now(),
    });
    Ok(Json(entries))
}

/// `DELETE /schedule/entries/:id` — Remove a schedule entry (admin).
///
/// # Errors
///
/// Returns [`FanstageError::NotFound`] for an unknown entry.
pub async fn delete_schedule_entry(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, FanstageError> {
    let entries = state.content.remove_schedule_entry(id).await?;

    let _ = state.event_bus.publish(FanEvent::ScheduleUpdated {
        entries,
        timestamp: Utc::now(),
    });
    Ok(StatusCode::NO_CONTENT)
}

/// Schedule routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/schedule/entries", put(upsert_schedule_entry))
        .route("/schedule/entries/{id}", delete(delete_schedule_entry))
        .route("/schedule", get(get_schedule))
}
