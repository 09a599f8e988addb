//! Engagement ledger: point bookkeeping, rank derivation, referrals.
//!
//! All viewer totals and the referral dedup map live behind one
//! `RwLock`, so balance check-then-debit and the one-code-per-referred-
//! user guarantee are single critical sections: of two concurrent
//! claims for the same referred user, exactly one wins.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::viewer::{Viewer, ViewerView};
use crate::error::FanstageError;

/// Points credited to the referrer per successful referral.
pub const REFERRER_REWARD: i64 = 100;
/// Points credited to the newly referred viewer.
pub const REFERRED_REWARD: i64 = 50;

/// Referral-use-count thresholds with their one-time bonus awards.
pub const REFERRAL_MILESTONES: [(u32, i64, &str); 3] = [
    (5, 250, "recruiter"),
    (25, 1_000, "ambassador"),
    (100, 5_000, "legend"),
];

/// A referral code owned by one referrer.
#[derive(Debug, Clone)]
pub struct ReferralCode {
    /// The code string handed out to prospective viewers.
    pub code: String,
    /// Owning viewer.
    pub referrer_id: String,
    /// Number of successful uses so far.
    pub uses: u32,
    /// Inactive codes reject new claims.
    pub active: bool,
}

/// Outcome of a successful referral claim.
#[derive(Debug, Clone)]
pub struct ReferralOutcome {
    /// The code that was consumed.
    pub code: String,
    /// Owning viewer of the code.
    pub referrer_id: String,
    /// Referrer's new point total.
    pub referrer_total: i64,
    /// Referred viewer's new point total.
    pub referred_total: i64,
    /// Use count after this claim.
    pub uses: u32,
    /// Milestone bonus triggered by this claim, if any.
    pub milestone: Option<MilestoneAward>,
}

/// A one-time bonus granted when a code crosses a use-count threshold.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MilestoneAward {
    /// The threshold that was crossed.
    pub uses: u32,
    /// Bonus points credited to the referrer.
    pub bonus_points: i64,
    /// Badge granted to the referrer.
    pub badge: String,
}

#[derive(Debug, Default)]
struct EngagementState {
    viewers: HashMap<String, Viewer>,
    referral_codes: HashMap<String, ReferralCode>,
    /// referred user id → code that consumed them. The dedup key: a
    /// given user can be claimed by at most one code, ever.
    referral_uses: HashMap<String, String>,
}

/// Process-wide point and referral bookkeeping.
#[derive(Debug, Default)]
pub struct EngagementLedger {
    inner: RwLock<EngagementState>,
}

impl EngagementLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the viewer, creating a zero-point profile on first sight.
    pub async fn register_viewer(&self, user_id: &str, username: &str) -> ViewerView {
        let mut state = self.inner.write().await;
        let viewer = state
            .viewers
            .entry(user_id.to_string())
            .or_insert_with(|| Viewer::new(user_id.to_string(), username.to_string()));
        viewer.last_active = chrono::Utc::now();
        viewer.view()
    }

    /// Seeds a viewer with a known point total, used when warm-starting
    /// from persistence. Existing viewers are left untouched.
    pub async fn seed_viewer(&self, user_id: &str, username: &str, points: i64) {
        let mut state = self.inner.write().await;
        state.viewers.entry(user_id.to_string()).or_insert_with(|| {
            let mut viewer = Viewer::new(user_id.to_string(), username.to_string());
            viewer.apply_delta(points);
            viewer
        });
    }

    /// Applies a point delta to a viewer and returns the new total.
    ///
    /// Debits that would take the total below zero are rejected before
    /// any mutation. Wager debits go through [`Self::debit_stake`]
    /// instead, which reports the shortfall.
    ///
    /// # Errors
    ///
    /// - [`FanstageError::NotFound`] if the viewer is unknown.
    /// - [`FanstageError::InsufficientBalance`] if the debit would
    ///   breach the zero floor.
    pub async fn award_points(
        &self,
        user_id: &str,
        delta: i64,
        reason: &str,
    ) -> Result<i64, FanstageError> {
        let mut state = self.inner.write().await;
        let viewer = state
            .viewers
            .get_mut(user_id)
            .ok_or_else(|| FanstageError::NotFound(format!("viewer {user_id}")))?;
        if delta < 0 && viewer.points.saturating_add(delta) < 0 {
            return Err(FanstageError::InsufficientBalance {
                required: delta.saturating_neg(),
                available: viewer.points,
            });
        }
        viewer.apply_delta(delta);
        tracing::debug!(user_id, delta, total = viewer.points, reason, "points applied");
        Ok(viewer.points)
    }

    /// Debits a wager stake, all-or-nothing: the balance check and the
    /// deduction happen under one write lock, so racing wagers cannot
    /// overdraw a balance.
    ///
    /// # Errors
    ///
    /// - [`FanstageError::InvalidRequest`] for a non-positive stake.
    /// - [`FanstageError::NotFound`] if the viewer is unknown.
    /// - [`FanstageError::InsufficientBalance`] if the stake exceeds
    ///   the current total; nothing is deducted.
    pub async fn debit_stake(&self, user_id: &str, stake: i64) -> Result<i64, FanstageError> {
        if stake <= 0 {
            return Err(FanstageError::InvalidRequest(
                "stake must be positive".to_string(),
            ));
        }
        let mut state = self.inner.write().await;
        let viewer = state
            .viewers
            .get_mut(user_id)
            .ok_or_else(|| FanstageError::NotFound(format!("viewer {user_id}")))?;
        if viewer.points < stake {
            return Err(FanstageError::InsufficientBalance {
                required: stake,
                available: viewer.points,
            });
        }
        viewer.apply_delta(stake.saturating_neg());
        Ok(viewer.points)
    }

    /// Credits points without a floor concern (payouts, refunds).
    /// Unknown viewers are created on the spot so a refund can never
    /// be lost.
    pub async fn credit(&self, user_id: &str, delta: i64) -> i64 {
        let mut state = self.inner.write().await;
        let viewer = state
            .viewers
            .entry(user_id.to_string())
            .or_insert_with(|| Viewer::new(user_id.to_string(), user_id.to_string()));
        viewer.apply_delta(delta);
        viewer.points
    }

    /// Derives the viewer's 1-based leaderboard rank: the count of
    /// viewers with strictly greater points, plus one. Recomputed on
    /// every read; cost is linear in the viewer population, an accepted
    /// limit at fan-site scale.
    ///
    /// # Errors
    ///
    /// Returns [`FanstageError::NotFound`] if the viewer is unknown.
    pub async fn compute_rank(&self, user_id: &str) -> Result<u32, FanstageError> {
        let state = self.inner.read().await;
        let viewer = state
            .viewers
            .get(user_id)
            .ok_or_else(|| FanstageError::NotFound(format!("viewer {user_id}")))?;
        let greater = state
            .viewers
            .values()
            .filter(|v| v.points > viewer.points)
            .count();
        #[allow(clippy::cast_possible_truncation)]
        let rank = greater as u32 + 1;
        Ok(rank)
    }

    /// Returns the viewer's public profile.
    ///
    /// # Errors
    ///
    /// Returns [`FanstageError::NotFound`] if the viewer is unknown.
    pub async fn get(&self, user_id: &str) -> Result<ViewerView, FanstageError> {
        let state = self.inner.read().await;
        state
            .viewers
            .get(user_id)
            .map(Viewer::view)
            .ok_or_else(|| FanstageError::NotFound(format!("viewer {user_id}")))
    }

    /// Top viewers by points, descending, capped at `limit`.
    pub async fn leaderboard(&self, limit: usize) -> Vec<ViewerView> {
        let state = self.inner.read().await;
        let mut views: Vec<ViewerView> = state.viewers.values().map(Viewer::view).collect();
        views.sort_by(|a, b| b.points.cmp(&a.points));
        views.truncate(limit);
        views
    }

    /// Creates (or returns the existing) referral code for a referrer.
    ///
    /// # Errors
    ///
    /// Returns [`FanstageError::NotFound`] if the referrer is unknown.
    pub async fn create_referral_code(&self, referrer_id: &str) -> Result<String, FanstageError> {
        let mut state = self.inner.write().await;
        if !state.viewers.contains_key(referrer_id) {
            return Err(FanstageError::NotFound(format!("viewer {referrer_id}")));
        }
        if let Some(existing) = state
            .referral_codes
            .values()
            .find(|c| c.referrer_id == referrer_id && c.active)
        {
            return Ok(existing.code.clone());
        }
        let code = generate_code();
        state.referral_codes.insert(
            code.clone(),
            ReferralCode {
                code: code.clone(),
                referrer_id: referrer_id.to_string(),
                uses: 0,
                active: true,
            },
        );
        Ok(code)
    }

    /// Consumes a referral code for a referred user.
    ///
    /// Credits referrer and referred viewer, records the one-time-use
    /// entry keyed by the referred user, and checks the milestone
    /// table, all inside one critical section.
    ///
    /// # Errors
    ///
    /// - [`FanstageError::NotFound`] for an unknown code.
    /// - [`FanstageError::ReferralInactive`] for a deactivated code.
    /// - [`FanstageError::ReferralAlreadyUsed`] if the referred user
    ///   was already claimed by any code.
    /// - [`FanstageError::InvalidRequest`] for self-referral.
    pub async fn apply_referral(
        &self,
        code: &str,
        referred_user_id: &str,
    ) -> Result<ReferralOutcome, FanstageError> {
        let mut state = self.inner.write().await;

        let entry = state
            .referral_codes
            .get(code)
            .ok_or_else(|| FanstageError::NotFound(format!("referral code {code}")))?;
        if !entry.active {
            return Err(FanstageError::ReferralInactive(code.to_string()));
        }
        let referrer_id = entry.referrer_id.clone();
        if referrer_id == referred_user_id {
            return Err(FanstageError::InvalidRequest(
                "cannot claim your own referral code".to_string(),
            ));
        }
        if state.referral_uses.contains_key(referred_user_id) {
            return Err(FanstageError::ReferralAlreadyUsed(
                referred_user_id.to_string(),
            ));
        }

        // All checks passed; mutate everything in one go.
        state
            .referral_uses
            .insert(referred_user_id.to_string(), code.to_string());

        let referred_total = {
            let referred = state
                .viewers
                .entry(referred_user_id.to_string())
                .or_insert_with(|| {
                    Viewer::new(referred_user_id.to_string(), referred_user_id.to_string())
                });
            referred.apply_delta(REFERRED_REWARD);
            referred.points
        };

        let uses = {
            let entry = state
                .referral_codes
                .get_mut(code)
                .ok_or_else(|| FanstageError::Internal("referral code vanished".to_string()))?;
            entry.uses = entry.uses.saturating_add(1);
            entry.uses
        };

        let milestone = REFERRAL_MILESTONES
            .iter()
            .find(|(threshold, _, _)| *threshold == uses)
            .map(|(threshold, bonus, badge)| MilestoneAward {
                uses: *threshold,
                bonus_points: *bonus,
                badge: (*badge).to_string(),
            });

        let referrer_total = {
            let referrer = state
                .viewers
                .entry(referrer_id.clone())
                .or_insert_with(|| Viewer::new(referrer_id.clone(), referrer_id.clone()));
            referrer.apply_delta(REFERRER_REWARD);
            if let Some(award) = &milestone {
                referrer.apply_delta(award.bonus_points);
                referrer.badges.insert(award.badge.clone());
            }
            referrer.points
        };

        tracing::info!(code, referred_user_id, uses, "referral applied");

        Ok(ReferralOutcome {
            code: code.to_string(),
            referrer_id,
            referrer_total,
            referred_total,
            uses,
            milestone,
        })
    }
}

/// Short shareable code derived from a UUID v4.
fn generate_code() -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string();
    raw.chars().take(8).collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use super::*;

    async fn ledger_with(users: &[(&str, i64)]) -> EngagementLedger {
        let ledger = EngagementLedger::new();
        for (user, points) in users {
            let _ = ledger.register_viewer(user, user).await;
            if *points != 0 {
                let _ = ledger.credit(user, *points).await;
            }
        }
        ledger
    }

    #[tokio::test]
    async fn award_and_floor() {
        let ledger = ledger_with(&[("user-a", 100)]).await;

        let Ok(total) = ledger.award_points("user-a", 50, "chat").await else {
            panic!("award failed");
        };
        assert_eq!(total, 150);

        let overdraw = ledger.award_points("user-a", -200, "penalty").await;
        assert!(matches!(
            overdraw,
            Err(FanstageError::InsufficientBalance { .. })
        ));
        let Ok(view) = ledger.get("user-a").await else {
            panic!("viewer missing");
        };
        assert_eq!(view.points, 150);
    }

    #[tokio::test]
    async fn wager_exceeding_balance_is_rejected_untouched() {
        let ledger = ledger_with(&[("user-a", 100)]).await;

        let result = ledger.debit_stake("user-a", 150).await;
        let Err(FanstageError::InsufficientBalance {
            required,
            available,
        }) = result
        else {
            panic!("expected InsufficientBalance");
        };
        assert_eq!(required, 150);
        assert_eq!(available, 100);

        let Ok(view) = ledger.get("user-a").await else {
            panic!("viewer missing");
        };
        assert_eq!(view.points, 100);
    }

    #[tokio::test]
    async fn concurrent_wagers_cannot_overdraw() {
        let ledger = Arc::new(ledger_with(&[("user-a", 100)]).await);

        let mut handles = Vec::new();
        for _ in 0..10 {
            let ledger = Arc::clone(&ledger);
            handles.push(tokio::spawn(async move {
                ledger.debit_stake("user-a", 60).await.is_ok()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            let Ok(won) = handle.await else {
                panic!("task panicked");
            };
            if won {
                successes += 1;
            }
        }
        // 100 points fits exactly one 60-point stake.
        assert_eq!(successes, 1);
        let Ok(view) = ledger.get("user-a").await else {
            panic!("viewer missing");
        };
        assert_eq!(view.points, 40);
    }

    #[tokio::test]
    async fn rank_is_count_greater_plus_one() {
        let ledger = ledger_with(&[("low", 10), ("mid", 50), ("high", 90)]).await;

        let Ok(rank) = ledger.compute_rank("mid").await else {
            panic!("rank failed");
        };
        assert_eq!(rank, 2);

        // Rank follows point mutations immediately.
        let _ = ledger.credit("mid", 100).await;
        let Ok(rank) = ledger.compute_rank("mid").await else {
            panic!("rank failed");
        };
        assert_eq!(rank, 1);
        let Ok(rank) = ledger.compute_rank("high").await else {
            panic!("rank failed");
        };
        assert_eq!(rank, 2);
    }

    #[tokio::test]
    async fn leaderboard_sorts_and_truncates() {
        let ledger = ledger_with(&[("a", 10), ("b", 30), ("c", 20)]).await;
        let board = ledger.leaderboard(2).await;
        let names: Vec<&str> = board.iter().map(|v| v.user_id.as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn referral_rewards_both_sides_once() {
        let ledger = ledger_with(&[("referrer", 0)]).await;
        let Ok(code) = ledger.create_referral_code("referrer").await else {
            panic!("code creation failed");
        };

        let Ok(outcome) = ledger.apply_referral(&code, "friend").await else {
            panic!("referral failed");
        };
        assert_eq!(outcome.referrer_total, REFERRER_REWARD);
        assert_eq!(outcome.referred_total, REFERRED_REWARD);
        assert_eq!(outcome.uses, 1);
        assert!(outcome.milestone.is_none());

        let again = ledger.apply_referral(&code, "friend").await;
        assert!(matches!(
            again,
            Err(FanstageError::ReferralAlreadyUsed(_))
        ));
    }

    #[tokio::test]
    async fn referred_user_is_claimed_by_one_code_ever() {
        let ledger = ledger_with(&[("ref-a", 0), ("ref-b", 0)]).await;
        let Ok(code_a) = ledger.create_referral_code("ref-a").await else {
            panic!("code creation failed");
        };
        let Ok(code_b) = ledger.create_referral_code("ref-b").await else {
            panic!("code creation failed");
        };

        assert!(ledger.apply_referral(&code_a, "friend").await.is_ok());
        let second = ledger.apply_referral(&code_b, "friend").await;
        assert!(matches!(
            second,
            Err(FanstageError::ReferralAlreadyUsed(_))
        ));
    }

    #[tokio::test]
    async fn concurrent_referral_claims_admit_exactly_one() {
        let ledger = Arc::new(ledger_with(&[("referrer", 0)]).await);
        let Ok(code) = ledger.create_referral_code("referrer").await else {
            panic!("code creation failed");
        };

        let mut handles = Vec::new();
        for _ in 0..12 {
            let ledger = Arc::clone(&ledger);
            let code = code.clone();
            handles.push(tokio::spawn(async move {
                ledger.apply_referral(&code, "friend").await.is_ok()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            let Ok(won) = handle.await else {
                panic!("task panicked");
            };
            if won {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);

        // Rewards were issued once, not twelve times.
        let Ok(referrer) = ledger.get("referrer").await else {
            panic!("viewer missing");
        };
        assert_eq!(referrer.points, REFERRER_REWARD);
    }

    #[tokio::test]
    async fn self_referral_is_rejected() {
        let ledger = ledger_with(&[("referrer", 0)]).await;
        let Ok(code) = ledger.create_referral_code("referrer").await else {
            panic!("code creation failed");
        };
        let result = ledger.apply_referral(&code, "referrer").await;
        assert!(matches!(result, Err(FanstageError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn milestone_grants_badge_and_bonus() {
        let ledger = ledger_with(&[("referrer", 0)]).await;
        let Ok(code) = ledger.create_referral_code("referrer").await else {
            panic!("code creation failed");
        };

        let mut milestone_seen = None;
        for i in 0..5 {
            let Ok(outcome) = ledger.apply_referral(&code, &format!("friend-{i}")).await else {
                panic!("referral failed");
            };
            if outcome.milestone.is_some() {
                milestone_seen = outcome.milestone;
            }
        }

        let Some(award) = milestone_seen else {
            panic!("expected a milestone at 5 uses");
        };
        assert_eq!(award.uses, 5);
        assert_eq!(award.badge, "recruiter");

        let Ok(referrer) = ledger.get("referrer").await else {
            panic!("viewer missing");
        };
        assert!(referrer.badges.contains(&"recruiter".to_string()));
        assert_eq!(referrer.points, 5 * REFERRER_REWARD + award.bonus_points);
    }
}
