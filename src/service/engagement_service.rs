//! Engagement service: point awards, ranks, referrals, with events and
//! write-through persistence.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::engagement::ReferralOutcome;
use crate::domain::viewer::ViewerView;
use crate::domain::{EngagementLedger, EventBus, FanEvent};
use crate::error::FanstageError;
use crate::persistence::PostgresPersistence;

/// Orchestration layer over the [`EngagementLedger`].
///
/// Every point mutation follows the pattern: mutate the ledger → emit a
/// `points_awarded` event → write the viewer row through to persistence
/// when enabled. Write-through failures are logged, never surfaced; the
/// in-memory ledger is the authority.
#[derive(Debug, Clone)]
pub struct EngagementService {
    ledger: Arc<EngagementLedger>,
    event_bus: EventBus,
    persistence: Option<Arc<PostgresPersistence>>,
}

impl EngagementService {
    /// Creates a new `EngagementService`.
    #[must_use]
    pub fn new(
        ledger: Arc<EngagementLedger>,
        event_bus: EventBus,
        persistence: Option<Arc<PostgresPersistence>>,
    ) -> Self {
        Self {
            ledger,
            event_bus,
            persistence,
        }
    }

    /// Returns a reference to the inner [`EngagementLedger`].
    #[must_use]
    pub fn ledger(&self) -> &Arc<EngagementLedger> {
        &self.ledger
    }

    /// Returns the viewer, creating a zero-point profile on first sight.
    pub async fn register_viewer(&self, user_id: &str, username: &str) -> ViewerView {
        let view = self.ledger.register_viewer(user_id, username).await;
        self.persist_viewer(user_id).await;
        view
    }

    /// Viewer profile with the derived leaderboard rank.
    ///
    /// # Errors
    ///
    /// Returns [`FanstageError::NotFound`] for an unknown viewer.
    pub async fn profile(&self, user_id: &str) -> Result<(ViewerView, u32), FanstageError> {
        let view = self.ledger.get(user_id).await?;
        let rank = self.ledger.compute_rank(user_id).await?;
        Ok((view, rank))
    }

    /// Top viewers by points, descending.
    pub async fn leaderboard(&self, limit: usize) -> Vec<ViewerView> {
        self.ledger.leaderboard(limit).await
    }

    /// Applies a point delta and broadcasts the new total.
    ///
    /// # Errors
    ///
    /// Returns [`FanstageError::NotFound`] for an unknown viewer, or
    /// [`FanstageError::InsufficientBalance`] for a debit past zero.
    pub async fn award_points(
        &self,
        user_id: &str,
        delta: i64,
        reason: &str,
    ) -> Result<i64, FanstageError> {
        let total = self.ledger.award_points(user_id, delta, reason).await?;
        self.publish_points(user_id, delta, total, reason);
        self.persist_viewer(user_id).await;
        Ok(total)
    }

    /// Debits a wager stake all-or-nothing and broadcasts the new total.
    ///
    /// # Errors
    ///
    /// Propagates the ledger's validation errors; see
    /// [`EngagementLedger::debit_stake`].
    pub async fn debit_stake(&self, user_id: &str, stake: i64) -> Result<i64, FanstageError> {
        let total = self.ledger.debit_stake(user_id, stake).await?;
        self.publish_points(user_id, stake.saturating_neg(), total, "wager_stake");
        self.persist_viewer(user_id).await;
        Ok(total)
    }

    /// Credits points unconditionally (payouts, refunds) and broadcasts
    /// the new total.
    pub async fn credit(&self, user_id: &str, delta: i64, reason: &str) -> i64 {
        let total = self.ledger.credit(user_id, delta).await;
        self.publish_points(user_id, delta, total, reason);
        self.persist_viewer(user_id).await;
        total
    }

    /// Creates (or returns the existing) referral code for a viewer.
    ///
    /// # Errors
    ///
    /// Returns [`FanstageError::NotFound`] for an unknown viewer.
    pub async fn create_referral_code(&self, referrer_id: &str) -> Result<String, FanstageError> {
        self.ledger.create_referral_code(referrer_id).await
    }

    /// Claims a referral code for a newly referred viewer.
    ///
    /// On success both sides' point changes are broadcast; a crossed
    /// milestone additionally emits a `referral_milestone` event into
    /// the admin room.
    ///
    /// # Errors
    ///
    /// Propagates the ledger's validation errors; see
    /// [`EngagementLedger::apply_referral`].
    pub async fn claim_referral(
        &self,
        code: &str,
        referred_user_id: &str,
    ) -> Result<ReferralOutcome, FanstageError> {
        let outcome = self.ledger.apply_referral(code, referred_user_id).await?;

        self.publish_points(
            referred_user_id,
            crate::domain::engagement::REFERRED_REWARD,
            outcome.referred_total,
            "referral_signup",
        );
        let referrer_delta = crate::domain::engagement::REFERRER_REWARD
            + outcome.milestone.as_ref().map_or(0, |m| m.bonus_points);
        self.publish_points(
            &outcome.referrer_id,
            referrer_delta,
            outcome.referrer_total,
            "referral",
        );
        if let Some(award) = &outcome.milestone {
            let _ = self.event_bus.publish(FanEvent::ReferralMilestone {
                referrer_id: outcome.referrer_id.clone(),
                award: award.clone(),
                timestamp: Utc::now(),
            });
            tracing::info!(
                referrer_id = %outcome.referrer_id,
                uses = award.uses,
                badge = %award.badge,
                "referral milestone reached"
            );
        }

        self.persist_viewer(referred_user_id).await;
        self.persist_viewer(&outcome.referrer_id).await;
        Ok(outcome)
    }

    fn publish_points(&self, user_id: &str, delta: i64, total: i64, reason: &str) {
        let _ = self.event_bus.publish(FanEvent::PointsAwarded {
            user_id: user_id.to_string(),
            delta,
            total,
            reason: reason.to_string(),
            timestamp: Utc::now(),
        });
    }

    async fn persist_viewer(&self, user_id: &str) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        let Ok(view) = self.ledger.get(user_id).await else {
            return;
        };
        if let Err(e) = persistence
            .upsert_viewer(&view.user_id, &view.username, view.points, view.level)
            .await
        {
            tracing::warn!(user_id, error = %e, "viewer write-through failed");
        }
    }
}
