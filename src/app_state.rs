//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::FanstageConfig;
use crate::domain::EventBus;
use crate::domain::content::ContentRegistry;
use crate::service::{EngagementService, VotingService};
use crate::session::SessionStore;
use crate::ws::ConnectionRegistry;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Voting service for polls, predictions, and wagers.
    pub voting: Arc<VotingService>,
    /// Engagement service for points, ranks, and referrals.
    pub engagement: Arc<EngagementService>,
    /// Session store consulted by the auth extractors.
    pub sessions: Arc<SessionStore>,
    /// Schedule, theme, and chat history state.
    pub content: Arc<ContentRegistry>,
    /// Live WebSocket connection registry.
    pub registry: Arc<ConnectionRegistry>,
    /// Event bus for broadcast fan-out.
    pub event_bus: EventBus,
    /// Run-time configuration.
    pub config: Arc<FanstageConfig>,
}
