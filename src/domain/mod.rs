//! Domain layer: core types, ledgers, and the event system.
//!
//! This module contains the server-side domain model: item identity,
//! the voting ledger with per-item vote registries, the engagement
//! ledger for points and referrals, site content state, and the event
//! bus that broadcasts state changes to connected clients.

pub mod client_id;
pub mod content;
pub mod engagement;
pub mod event_bus;
pub mod fan_event;
pub mod item_id;
pub mod room;
pub mod viewer;
pub mod vote_item;
pub mod vote_ledger;

pub use client_id::ClientId;
pub use engagement::EngagementLedger;
pub use event_bus::EventBus;
pub use fan_event::FanEvent;
pub use item_id::ItemId;
pub use room::Room;
pub use vote_item::VoteItem;
pub use vote_ledger::VoteLedger;
