//! Theme handlers: read and switch the active preset.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::SetThemeRequest;
use crate::app_state::AppState;
use crate::domain::FanEvent;
use crate::error::{ErrorResponse, FanstageError};
use crate::session::AdminSession;

/// `GET /theme` — Currently active theme preset.
pub async fn get_theme(State(state): State<AppState>) -> impl IntoResponse {
    let theme = state.content.theme().await;
    Json(serde_json::json!({ "theme": theme }))
}

/// `PUT /theme` — Switch the active theme (admin).
///
/// Thin controller: validate against the preset catalog, store, then
/// broadcast.
///
/// # Errors
///
/// Returns [`FanstageError::InvalidRequest`] for an unknown preset.
#[utoipa::path(
    put,
    path = "/api/v1/theme",
    tag = "Theme",
    summary = "Switch the active theme",
    description = "Sets the site-wide theme to one of the known presets and broadcasts the change. Admin only.",
    request_body = SetThemeRequest,
    responses(
        (status = 200, description = "The new active theme", body = serde_json::Value),
        (status = 400, description = "Unknown preset", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
    )
)]
pub async fn set_theme(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Json(req): Json<SetThemeRequest>,
) -> Result<impl IntoResponse, FanstageError> {
    let theme = state.content.set_theme(&req.theme).await?;

    let _ = state.event_bus.publish(FanEvent::ThemeChanged {
        theme: theme.clone(),
        timestamp: Utc::now(),
    });
    tracing::info!(theme, "theme switched");
    Ok(Json(serde_json::json!({ "theme": theme })))
}

/// Theme routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/theme", get(get_theme).put(set_theme))
}
