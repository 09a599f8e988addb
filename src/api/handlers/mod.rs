//! REST endpoint handlers organized by resource.

pub mod chat;
pub mod engagement;
pub mod items;
pub mod schedule;
pub mod session;
pub mod system;
pub mod theme;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(session::routes())
        .merge(items::routes())
        .merge(engagement::routes())
        .merge(chat::routes())
        .merge(schedule::routes())
        .merge(theme::routes())
}
