//! System endpoints: health check and the theme preset catalog.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::content::THEME_PRESETS;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: String,
}

/// `GET /health` — Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns the service status, crate version, and current server time.",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            timestamp: Utc::now().to_rfc3339(),
        }),
    )
}

/// `GET /config/themes` — The theme preset catalog.
#[utoipa::path(
    get,
    path = "/config/themes",
    tag = "System",
    summary = "List theme presets",
    description = "Returns the names of every theme preset the site can switch between.",
    responses(
        (status = 200, description = "Theme preset catalog", body = Vec<String>),
    )
)]
pub async fn themes_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(THEME_PRESETS.to_vec()))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/themes", get(themes_handler))
}
