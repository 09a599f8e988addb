//! Named broadcast rooms for targeted fan-out.
//!
//! A [`Room`] is a tag grouping live connections for broadcast. Rooms
//! imply no ownership: a connection may belong to any number of rooms.
//! The set of rooms is closed — free-form room strings are rejected at
//! parse time rather than accumulating as garbage in the registry.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Broadcast room a connection can join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Room {
    /// Default room; every connection joins on accept.
    Public,
    /// Admin-only room for moderation and referral milestone events.
    Admin,
}

impl Room {
    /// Returns the wire name of this room.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Admin => "admin",
        }
    }

    /// Parses a wire name into a `Room`. Unknown names yield `None`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "public" => Some(Self::Public),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips() {
        assert_eq!(Room::parse("public"), Some(Room::Public));
        assert_eq!(Room::parse("admin"), Some(Room::Admin));
        assert_eq!(Room::parse(Room::Admin.as_str()), Some(Room::Admin));
    }

    #[test]
    fn unknown_room_is_rejected() {
        assert_eq!(Room::parse("vip"), None);
        assert_eq!(Room::parse(""), None);
    }
}
