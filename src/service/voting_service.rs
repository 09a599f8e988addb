//! Voting service: orchestrates item lifecycle and vote casting.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::vote_item::{ItemKind, ItemStatus, ItemView, ResolutionSummary};
use crate::domain::{EventBus, FanEvent, ItemId, VoteItem, VoteLedger};
use crate::error::FanstageError;
use crate::service::engagement_service::EngagementService;

/// Winners of a resolved wager are paid this multiple of their stake.
const WAGER_PAYOUT_MULTIPLIER: i64 = 2;

/// Orchestration layer for polls, predictions, and wagers.
///
/// Stateless coordinator over the [`VoteLedger`] and the
/// [`EngagementService`]. Every mutation follows the pattern: acquire
/// the per-item lock → validate → mutate → emit events → return.
/// Point movements (stakes, payouts, refunds) go through the
/// engagement service so their events and persistence write-through
/// happen in one place. Lock order is always item first, engagement
/// second.
#[derive(Debug, Clone)]
pub struct VotingService {
    ledger: Arc<VoteLedger>,
    engagement: EngagementService,
    event_bus: EventBus,
}

impl VotingService {
    /// Creates a new `VotingService`.
    #[must_use]
    pub fn new(ledger: Arc<VoteLedger>, engagement: EngagementService, event_bus: EventBus) -> Self {
        Self {
            ledger,
            engagement,
            event_bus,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Opens a new voting item.
    ///
    /// # Errors
    ///
    /// Returns [`FanstageError::InvalidRequest`] for a malformed option
    /// set (fewer than two options, empty or duplicate labels).
    pub async fn create_item(
        &self,
        kind: ItemKind,
        title: String,
        labels: Vec<String>,
    ) -> Result<ItemView, FanstageError> {
        let item = VoteItem::new(kind, title, labels)?;
        let view = item.view();
        let item_id = self.ledger.insert(item).await?;

        let _ = self.event_bus.publish(FanEvent::ItemCreated {
            item: view.clone(),
            timestamp: Utc::now(),
        });
        tracing::info!(%item_id, ?kind, "voting item created");
        Ok(view)
    }

    /// Casts a vote, debiting the stake first for wagers.
    ///
    /// The whole operation runs under the item's write lock: the
    /// duplicate-vote check, the stake debit, and the registry insert
    /// cannot interleave with another cast on the same item, so a
    /// doomed vote never costs points and a racing duplicate is never
    /// double-debited.
    ///
    /// # Errors
    ///
    /// - [`FanstageError::NotFound`] for an unknown item.
    /// - [`FanstageError::ItemNotActive`] once voting ended.
    /// - [`FanstageError::DuplicateVote`] on a second vote by the user.
    /// - [`FanstageError::InvalidChoice`] for an unknown option label.
    /// - [`FanstageError::InvalidRequest`] for a missing/non-positive
    ///   wager stake, or a stake on a non-wager item.
    /// - [`FanstageError::InsufficientBalance`] if the stake exceeds
    ///   the viewer's balance; nothing is registered or debited.
    pub async fn cast_vote(
        &self,
        item_id: ItemId,
        user_id: &str,
        choice: &str,
        stake: Option<i64>,
    ) -> Result<ItemView, FanstageError> {
        let entry = self.ledger.get(item_id).await?;
        let mut item = entry.write().await;

        // Validate everything before any money moves.
        if item.status != ItemStatus::Active {
            return Err(FanstageError::ItemNotActive);
        }
        if item.has_voted(user_id) {
            return Err(FanstageError::DuplicateVote(user_id.to_string()));
        }
        let choice_index = item.option_index(choice)?;

        if item.kind == ItemKind::Wager {
            let stake = stake.ok_or_else(|| {
                FanstageError::InvalidRequest("a wager vote requires a stake".to_string())
            })?;
            self.engagement.debit_stake(user_id, stake).await?;
            if let Err(e) = item.register_vote(user_id, choice_index) {
                // Validation above makes this unreachable, but a stake
                // must never be stranded if it does happen.
                let _ = self.engagement.credit(user_id, stake, "wager_refund").await;
                return Err(e);
            }
            item.record_stake(user_id, stake);
        } else {
            if stake.is_some() {
                return Err(FanstageError::InvalidRequest(
                    "only wagers take a stake".to_string(),
                ));
            }
            item.register_vote(user_id, choice_index)?;
        }

        let view = item.view();
        drop(item);

        let _ = self.event_bus.publish(FanEvent::ItemUpdated {
            item: view.clone(),
            timestamp: Utc::now(),
        });
        Ok(view)
    }

    /// Resolves an item with a declared result and, for wagers, pays
    /// every winner twice their stake.
    ///
    /// # Errors
    ///
    /// - [`FanstageError::NotFound`] for an unknown item.
    /// - [`FanstageError::ItemNotActive`] if it already ended.
    /// - [`FanstageError::InvalidResult`] for a result label not among
    ///   the options.
    pub async fn resolve_item(
        &self,
        item_id: ItemId,
        result: &str,
    ) -> Result<ResolutionSummary, FanstageError> {
        let entry = self.ledger.get(item_id).await?;
        let mut item = entry.write().await;

        let summary = item.resolve(result)?;
        let payouts = if item.kind == ItemKind::Wager {
            item.winning_stakes()
        } else {
            Vec::new()
        };
        drop(item);

        for (user_id, stake) in payouts {
            let payout = stake.saturating_mul(WAGER_PAYOUT_MULTIPLIER);
            let _ = self.engagement.credit(&user_id, payout, "wager_payout").await;
        }

        let _ = self.event_bus.publish(FanEvent::ItemResolved {
            summary: summary.clone(),
            timestamp: Utc::now(),
        });
        tracing::info!(%item_id, result, total_votes = summary.total_votes, "item resolved");
        Ok(summary)
    }

    /// Deletes an item without resolution. Stakes on a still-active
    /// wager are refunded in full.
    ///
    /// # Errors
    ///
    /// Returns [`FanstageError::NotFound`] for an unknown item.
    pub async fn delete_item(&self, item_id: ItemId) -> Result<(), FanstageError> {
        let removed = self.ledger.remove(item_id).await?;

        if removed.kind == ItemKind::Wager && removed.status == ItemStatus::Active {
            for (user_id, stake) in removed.all_stakes() {
                let _ = self.engagement.credit(&user_id, stake, "wager_refund").await;
            }
        }

        let _ = self.event_bus.publish(FanEvent::ItemDeleted {
            item_id,
            kind: removed.kind,
            timestamp: Utc::now(),
        });
        tracing::info!(%item_id, kind = ?removed.kind, "voting item deleted");
        Ok(())
    }

    /// Public aggregate view of one item.
    ///
    /// # Errors
    ///
    /// Returns [`FanstageError::NotFound`] for an unknown item.
    pub async fn get_item(&self, item_id: ItemId) -> Result<ItemView, FanstageError> {
        let entry = self.ledger.get(item_id).await?;
        let item = entry.read().await;
        Ok(item.view())
    }

    /// Lists items, optionally filtered by kind and/or activity.
    pub async fn list_items(&self, kind: Option<ItemKind>, active_only: bool) -> Vec<ItemView> {
        self.ledger.list(kind, active_only).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::EngagementLedger;

    fn make_service() -> VotingService {
        let event_bus = EventBus::new(1000);
        let engagement = EngagementService::new(
            Arc::new(EngagementLedger::new()),
            event_bus.clone(),
            None,
        );
        VotingService::new(Arc::new(VoteLedger::new()), engagement, event_bus)
    }

    fn labels() -> Vec<String> {
        vec!["red".to_string(), "blue".to_string()]
    }

    async fn seed_viewer(service: &VotingService, user_id: &str, points: i64) {
        let _ = service.engagement.register_viewer(user_id, user_id).await;
        if points > 0 {
            let _ = service.engagement.credit(user_id, points, "seed").await;
        }
    }

    #[tokio::test]
    async fn create_item_emits_event() {
        let service = make_service();
        let mut rx = service.event_bus().subscribe();

        let result = service
            .create_item(ItemKind::Poll, "q".to_string(), labels())
            .await;
        assert!(result.is_ok());

        let Ok(event) = rx.recv().await else {
            panic!("expected event");
        };
        assert_eq!(event.event_type_str(), "item_created");
    }

    #[tokio::test]
    async fn cast_vote_emits_aggregate_update() {
        let service = make_service();
        let Ok(view) = service
            .create_item(ItemKind::Poll, "q".to_string(), labels())
            .await
        else {
            panic!("create failed");
        };
        let mut rx = service.event_bus().subscribe();

        let Ok(updated) = service.cast_vote(view.item_id, "user-a", "red", None).await else {
            panic!("vote failed");
        };
        assert_eq!(updated.total_votes, 1);

        let Ok(event) = rx.recv().await else {
            panic!("expected event");
        };
        assert_eq!(event.event_type_str(), "item_updated");
    }

    #[tokio::test]
    async fn poll_vote_rejects_a_stake() {
        let service = make_service();
        let Ok(view) = service
            .create_item(ItemKind::Poll, "q".to_string(), labels())
            .await
        else {
            panic!("create failed");
        };
        let result = service.cast_vote(view.item_id, "user-a", "red", Some(10)).await;
        assert!(matches!(result, Err(FanstageError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn wager_vote_debits_the_stake() {
        let service = make_service();
        seed_viewer(&service, "user-a", 100).await;
        let Ok(view) = service
            .create_item(ItemKind::Wager, "bracket".to_string(), labels())
            .await
        else {
            panic!("create failed");
        };

        let result = service.cast_vote(view.item_id, "user-a", "red", Some(60)).await;
        assert!(result.is_ok());

        let Ok((profile, _)) = service.engagement.profile("user-a").await else {
            panic!("viewer missing");
        };
        assert_eq!(profile.points, 40);
    }

    #[tokio::test]
    async fn insufficient_stake_registers_nothing() {
        let service = make_service();
        seed_viewer(&service, "user-a", 100).await;
        let Ok(view) = service
            .create_item(ItemKind::Wager, "bracket".to_string(), labels())
            .await
        else {
            panic!("create failed");
        };

        let result = service.cast_vote(view.item_id, "user-a", "red", Some(150)).await;
        assert!(matches!(
            result,
            Err(FanstageError::InsufficientBalance { .. })
        ));

        // Neither the vote nor the debit happened.
        let Ok(item) = service.get_item(view.item_id).await else {
            panic!("item missing");
        };
        assert_eq!(item.total_votes, 0);
        let Ok((profile, _)) = service.engagement.profile("user-a").await else {
            panic!("viewer missing");
        };
        assert_eq!(profile.points, 100);
    }

    #[tokio::test]
    async fn duplicate_wager_vote_is_not_double_debited() {
        let service = make_service();
        seed_viewer(&service, "user-a", 100).await;
        let Ok(view) = service
            .create_item(ItemKind::Wager, "bracket".to_string(), labels())
            .await
        else {
            panic!("create failed");
        };

        assert!(service.cast_vote(view.item_id, "user-a", "red", Some(30)).await.is_ok());
        let second = service.cast_vote(view.item_id, "user-a", "blue", Some(30)).await;
        assert!(matches!(second, Err(FanstageError::DuplicateVote(_))));

        let Ok((profile, _)) = service.engagement.profile("user-a").await else {
            panic!("viewer missing");
        };
        assert_eq!(profile.points, 70);
    }

    #[tokio::test]
    async fn resolving_a_wager_pays_winners_double() {
        let service = make_service();
        seed_viewer(&service, "winner", 100).await;
        seed_viewer(&service, "loser", 100).await;
        let Ok(view) = service
            .create_item(ItemKind::Wager, "bracket".to_string(), labels())
            .await
        else {
            panic!("create failed");
        };

        assert!(service.cast_vote(view.item_id, "winner", "red", Some(40)).await.is_ok());
        assert!(service.cast_vote(view.item_id, "loser", "blue", Some(40)).await.is_ok());

        let Ok(summary) = service.resolve_item(view.item_id, "red").await else {
            panic!("resolve failed");
        };
        assert_eq!(summary.result, "red");

        let Ok((winner, _)) = service.engagement.profile("winner").await else {
            panic!("viewer missing");
        };
        // 100 - 40 stake + 80 payout.
        assert_eq!(winner.points, 140);
        let Ok((loser, _)) = service.engagement.profile("loser").await else {
            panic!("viewer missing");
        };
        assert_eq!(loser.points, 60);
    }

    #[tokio::test]
    async fn deleting_an_active_wager_refunds_stakes() {
        let service = make_service();
        seed_viewer(&service, "user-a", 100).await;
        let Ok(view) = service
            .create_item(ItemKind::Wager, "bracket".to_string(), labels())
            .await
        else {
            panic!("create failed");
        };
        assert!(service.cast_vote(view.item_id, "user-a", "red", Some(70)).await.is_ok());

        assert!(service.delete_item(view.item_id).await.is_ok());

        let Ok((profile, _)) = service.engagement.profile("user-a").await else {
            panic!("viewer missing");
        };
        assert_eq!(profile.points, 100);
        assert!(service.get_item(view.item_id).await.is_err());
    }

    #[tokio::test]
    async fn deleting_a_resolved_wager_refunds_nothing() {
        let service = make_service();
        seed_viewer(&service, "user-a", 100).await;
        let Ok(view) = service
            .create_item(ItemKind::Wager, "bracket".to_string(), labels())
            .await
        else {
            panic!("create failed");
        };
        assert!(service.cast_vote(view.item_id, "user-a", "blue", Some(50)).await.is_ok());
        assert!(service.resolve_item(view.item_id, "red").await.is_ok());

        assert!(service.delete_item(view.item_id).await.is_ok());
        let Ok((profile, _)) = service.engagement.profile("user-a").await else {
            panic!("viewer missing");
        };
        // The losing stake stays spent.
        assert_eq!(profile.points, 50);
    }
}
