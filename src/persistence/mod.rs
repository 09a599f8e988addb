//! Persistence layer: PostgreSQL write-through and event log.
//!
//! Optional at runtime; the server runs entirely in memory when
//! `PERSISTENCE_ENABLED` is off.

pub mod models;
pub mod postgres;

pub use postgres::PostgresPersistence;
