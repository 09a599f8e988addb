//! DTOs for the engagement endpoints: profiles, points, referrals.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::viewer::ViewerView;

/// Viewer profile response with the derived leaderboard rank.
#[derive(Debug, Serialize)]
pub struct ViewerProfileResponse {
    /// Public viewer profile.
    #[serde(flatten)]
    pub viewer: ViewerView,
    /// 1-based leaderboard rank, derived on read.
    pub rank: u32,
}

/// Request body for `POST /viewers/{id}/points` (admin).
#[derive(Debug, Deserialize, ToSchema)]
pub struct AwardPointsRequest {
    /// Point delta; negative values debit but never below zero.
    pub delta: i64,
    /// Award site recorded in the broadcast event.
    #[serde(default = "default_reason")]
    pub reason: String,
}

fn default_reason() -> String {
    "manual".to_string()
}

/// Response for a point award.
#[derive(Debug, Serialize, ToSchema)]
pub struct AwardPointsResponse {
    /// Affected viewer.
    pub user_id: String,
    /// Applied delta.
    pub delta: i64,
    /// New running total.
    pub total: i64,
}

/// Response for `POST /referrals`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReferralCodeResponse {
    /// Shareable referral code.
    pub code: String,
    /// Owning viewer.
    pub referrer_id: String,
}

/// Request body for `POST /referrals/claim`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ClaimReferralRequest {
    /// The code being claimed.
    pub code: String,
}

/// Response for a successful referral claim.
#[derive(Debug, Serialize, ToSchema)]
pub struct ClaimReferralResponse {
    /// The claimed code.
    pub code: String,
    /// Code owner.
    pub referrer_id: String,
    /// Claiming viewer's new point total.
    pub referred_total: i64,
    /// Use count after this claim.
    pub uses: u32,
    /// Badge granted to the referrer if a milestone was crossed.
    pub milestone_badge: Option<String>,
}

/// Query parameters for `GET /leaderboard`.
#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    /// Number of entries to return (max 100). Defaults to 10.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}
