//! Type-safe voting item identifier.
//!
//! [`ItemId`] is a newtype wrapper around [`uuid::Uuid`] (v4) providing
//! type safety so that item identifiers cannot be confused with other
//! UUIDs (schedule entries, chat messages, connection ids).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a voting item (poll, prediction, or wager).
///
/// Wraps a UUID v4. Generated once at item creation time and immutable
/// thereafter. Used as the dictionary key in [`super::VoteLedger`] and
/// as the event discriminator in broadcast payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(uuid::Uuid);

impl ItemId {
    /// Creates a new random `ItemId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Creates an `ItemId` from an existing [`uuid::Uuid`].
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<uuid::Uuid> for ItemId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}

impl From<ItemId> for uuid::Uuid {
    fn from(id: ItemId) -> Self {
        id.0
    }
}
