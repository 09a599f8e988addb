//! WebSocket layer: connection handling, room registry, event fan-out.
//!
//! The WebSocket endpoint at `/ws` pushes domain events to connected
//! clients. Every connection starts in the public room; joining the
//! admin room requires an admin session token. A background forwarder
//! task drains the event bus and routes each event to its room through
//! the [`ConnectionRegistry`].

pub mod connection;
pub mod handler;
pub mod messages;
pub mod registry;

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::domain::EventBus;
pub use registry::ConnectionRegistry;

/// Spawns the task that bridges the event bus to live connections.
///
/// Each event is serialized once and broadcast to its target room. A
/// lagged receiver logs and keeps going; the task ends when the bus is
/// dropped.
pub fn spawn_event_forwarder(
    bus: &EventBus,
    registry: Arc<ConnectionRegistry>,
) -> JoinHandle<()> {
    let mut events = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let room = event.room();
                    match serde_json::to_value(&event) {
                        Ok(payload) => {
                            let delivered = registry.broadcast(Some(room), &payload).await;
                            tracing::trace!(
                                event_type = event.event_type_str(),
                                delivered,
                                "event forwarded"
                            );
                        }
                        Err(error) => {
                            tracing::warn!(%error, "failed to serialize event for fan-out");
                        }
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event forwarder lagged behind the bus");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::engagement::MilestoneAward;
    use crate::domain::{FanEvent, Room};
    use chrono::Utc;

    fn milestone(referrer: &str) -> FanEvent {
        FanEvent::ReferralMilestone {
            referrer_id: referrer.to_string(),
            award: MilestoneAward {
                uses: 5,
                bonus_points: 250,
                badge: "recruiter".to_string(),
            },
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn forwarder_routes_events_to_their_room() {
        let bus = EventBus::new(16);
        let registry = Arc::new(ConnectionRegistry::new());
        let handle = spawn_event_forwarder(&bus, Arc::clone(&registry));

        let (_client, mut rx) = registry.register().await;
        let _ = rx.recv().await; // ack

        bus.publish(FanEvent::ThemeChanged {
            theme: "neon".to_string(),
            timestamp: Utc::now(),
        });

        let Some(frame) = rx.recv().await else {
            panic!("expected forwarded event");
        };
        assert_eq!(
            frame.get("type").and_then(|v| v.as_str()),
            Some("theme_changed")
        );

        handle.abort();
    }

    #[tokio::test]
    async fn admin_events_skip_the_public_room() {
        let bus = EventBus::new(16);
        let registry = Arc::new(ConnectionRegistry::new());
        let handle = spawn_event_forwarder(&bus, Arc::clone(&registry));

        let (client, mut rx) = registry.register().await;
        let _ = rx.recv().await;

        let event = milestone("user-a");
        assert_eq!(event.room(), Room::Admin);
        bus.publish(event);

        // Give the forwarder a chance to run, then confirm nothing
        // reached the public-only client.
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());

        registry.join_room(client, Room::Admin).await;
        bus.publish(milestone("user-b"));
        let Some(frame) = rx.recv().await else {
            panic!("admin member should receive");
        };
        assert_eq!(
            frame.get("type").and_then(|v| v.as_str()),
            Some("referral_milestone")
        );

        handle.abort();
    }
}
