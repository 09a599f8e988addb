//! Domain events reflecting site state mutations.
//!
//! Every state change publishes a [`FanEvent`] through the
//! [`super::EventBus`]; a forwarder task routes each event to its
//! target room on the connection registry. The serialized form is the
//! wire envelope delivered to WebSocket clients:
//! `{"type": <event-name>, ...payload, "timestamp": <ISO-8601>}`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Room;
use super::content::{ChatMessage, ScheduleEntry};
use super::engagement::MilestoneAward;
use super::item_id::ItemId;
use super::vote_item::{ItemKind, ItemView, ResolutionSummary};

/// Domain event emitted after every state mutation.
///
/// `item_updated` carries aggregate counts only — individual choices
/// stay private until resolution broadcasts the full breakdown.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FanEvent {
    /// A new poll/prediction/wager opened.
    ItemCreated {
        /// Public aggregate view of the new item.
        item: ItemView,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An item's counters changed (a vote was cast).
    ItemUpdated {
        /// Updated public aggregate view.
        item: ItemView,
        /// Mutation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An item was resolved with a declared result.
    ItemResolved {
        /// Full breakdown including per-option percentages.
        summary: ResolutionSummary,
        /// Resolution timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An item was deleted without resolution.
    ItemDeleted {
        /// Identifier of the removed item.
        item_id: ItemId,
        /// Flavor of the removed item.
        kind: ItemKind,
        /// Deletion timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A viewer's point total changed.
    PointsAwarded {
        /// Affected viewer.
        user_id: String,
        /// Applied delta (negative for debits).
        delta: i64,
        /// New running total.
        total: i64,
        /// Award site (e.g. `"chat"`, `"wager_payout"`).
        reason: String,
        /// Mutation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A chat message was posted.
    ChatPosted {
        /// The message as stored in the history ring.
        message: ChatMessage,
        /// Receive timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The stream schedule changed.
    ScheduleUpdated {
        /// The full schedule after the change, sorted by start time.
        entries: Vec<ScheduleEntry>,
        /// Mutation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The active theme preset changed.
    ThemeChanged {
        /// New theme preset name.
        theme: String,
        /// Mutation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A referral code crossed a milestone threshold. Admin room only.
    ReferralMilestone {
        /// Code owner.
        referrer_id: String,
        /// The triggered award.
        award: MilestoneAward,
        /// Claim timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl FanEvent {
    /// Room this event is broadcast to.
    #[must_use]
    pub const fn room(&self) -> Room {
        match self {
            Self::ReferralMilestone { .. } => Room::Admin,
            _ => Room::Public,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::ItemCreated { .. } => "item_created",
            Self::ItemUpdated { .. } => "item_updated",
            Self::ItemResolved { .. } => "item_resolved",
            Self::ItemDeleted { .. } => "item_deleted",
            Self::PointsAwarded { .. } => "points_awarded",
            Self::ChatPosted { .. } => "chat_posted",
            Self::ScheduleUpdated { .. } => "schedule_updated",
            Self::ThemeChanged { .. } => "theme_changed",
            Self::ReferralMilestone { .. } => "referral_milestone",
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn envelope_has_type_and_timestamp() {
        let event = FanEvent::ThemeChanged {
            theme: "neon".to_string(),
            timestamp: Utc::now(),
        };
        let Ok(json) = serde_json::to_value(&event) else {
            panic!("serialization failed");
        };
        assert_eq!(
            json.get("type").and_then(|v| v.as_str()),
            Some("theme_changed")
        );
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn milestone_events_target_the_admin_room() {
        let event = FanEvent::ReferralMilestone {
            referrer_id: "user-a".to_string(),
            award: MilestoneAward {
                uses: 5,
                bonus_points: 250,
                badge: "recruiter".to_string(),
            },
            timestamp: Utc::now(),
        };
        assert_eq!(event.room(), Room::Admin);

        let public = FanEvent::ThemeChanged {
            theme: "neon".to_string(),
            timestamp: Utc::now(),
        };
        assert_eq!(public.room(), Room::Public);
    }

    #[test]
    fn event_type_matches_serde_tag() {
        let event = FanEvent::PointsAwarded {
            user_id: "user-a".to_string(),
            delta: 10,
            total: 110,
            reason: "chat".to_string(),
            timestamp: Utc::now(),
        };
        let Ok(json) = serde_json::to_value(&event) else {
            panic!("serialization failed");
        };
        assert_eq!(
            json.get("type").and_then(|v| v.as_str()),
            Some(event.event_type_str())
        );
    }
}
