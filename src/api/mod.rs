//! REST API layer: DTOs, route handlers, and router composition.
//!
//! Resource routes are mounted under `/api/v1`; health and the theme
//! catalog sit at the root so probes don't need the version prefix.

pub mod dto;
pub mod handlers;

use axum::Router;

use crate::app_state::AppState;

/// Assembles the full REST router.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}
