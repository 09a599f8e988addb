//! Session store and request authentication.
//!
//! Sessions are JWTs bound to server-side records with a 7-day TTL.
//! Verification always consults the live record, so server-side
//! invalidation beats token validity.

pub mod extract;
pub mod store;

pub use extract::{AdminSession, AuthSession};
pub use store::{Role, SESSION_COOKIE, SessionInfo, SessionRecord, SessionStore};
