//! # fanstage
//!
//! Backend core for a fan-engagement streaming site: sessions, live
//! voting (polls, predictions, wagers), an engagement point economy
//! with referrals, and room-scoped WebSocket broadcast.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler + ConnectionRegistry (ws/)
//!     │
//!     ├── VotingService / EngagementService (service/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── VoteLedger / EngagementLedger / ContentRegistry (domain/)
//!     ├── SessionStore (session/)
//!     │
//!     └── PostgreSQL Persistence (optional)
//! ```
//!
//! Every state mutation publishes a [`domain::FanEvent`]; a forwarder
//! task routes each event to its room on the connection registry, so
//! REST writes and WebSocket pushes stay decoupled.

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod session;
pub mod ws;
