//! fanstage server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use fanstage::api;
use fanstage::app_state::AppState;
use fanstage::config::FanstageConfig;
use fanstage::domain::content::ContentRegistry;
use fanstage::domain::{EngagementLedger, EventBus, VoteLedger};
use fanstage::persistence::PostgresPersistence;
use fanstage::service::{EngagementService, VotingService};
use fanstage::session::SessionStore;
use fanstage::ws::handler::ws_handler;
use fanstage::ws::{ConnectionRegistry, spawn_event_forwarder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Arc::new(FanstageConfig::from_env()?);
    tracing::info!(addr = %config.listen_addr, "starting fanstage");

    // Optional persistence layer
    let persistence = if config.persistence_enabled {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(std::time::Duration::from_secs(
                config.database_connect_timeout_secs,
            ))
            .connect(&config.database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Some(Arc::new(PostgresPersistence::new(pool)))
    } else {
        tracing::info!("persistence disabled; running fully in memory");
        None
    };

    // Build domain layer
    let event_bus = EventBus::new(config.event_bus_capacity);
    let vote_ledger = Arc::new(VoteLedger::new());
    let engagement_ledger = Arc::new(EngagementLedger::new());
    let content = Arc::new(ContentRegistry::new(config.chat_history_limit));

    // Warm start: restore viewer totals before taking traffic.
    if let Some(persistence) = &persistence {
        let rows = persistence.load_viewers().await?;
        let restored = rows.len();
        for row in rows {
            engagement_ledger
                .seed_viewer(&row.user_id, &row.username, row.points)
                .await;
        }
        tracing::info!(restored, "viewer totals restored from persistence");
    }

    // Build service layer
    let engagement = EngagementService::new(
        Arc::clone(&engagement_ledger),
        event_bus.clone(),
        persistence.clone(),
    );
    let voting = Arc::new(VotingService::new(
        Arc::clone(&vote_ledger),
        engagement.clone(),
        event_bus.clone(),
    ));

    let sessions = Arc::new(SessionStore::new(
        &config.session_secret,
        config.session_ttl_days,
        persistence.clone(),
    ));

    // WebSocket fan-out
    let registry = Arc::new(ConnectionRegistry::new());
    let _forwarder = spawn_event_forwarder(&event_bus, Arc::clone(&registry));

    // Append-only event log
    if let Some(persistence) = persistence.clone() {
        let mut events = event_bus.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if let Ok(payload) = serde_json::to_value(&event)
                            && let Err(e) = persistence
                                .save_event(event.event_type_str(), &payload)
                                .await
                        {
                            tracing::warn!(error = %e, "event log write failed");
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event log lagged behind the bus");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    // Periodic session sweep
    let sweep_store = Arc::clone(&sessions);
    let sweep_interval = config.session_sweep_interval_secs;
    tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_secs(sweep_interval.max(1)));
        ticker.tick().await; // First tick fires immediately; skip it.
        loop {
            ticker.tick().await;
            let removed = sweep_store.cleanup_expired().await;
            tracing::debug!(removed, "session sweep finished");
        }
    });

    // Build application state
    let app_state = AppState {
        voting,
        engagement: Arc::new(engagement),
        sessions,
        content,
        registry,
        event_bus,
        config: Arc::clone(&config),
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
