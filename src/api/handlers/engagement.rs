//! Engagement handlers: profiles, leaderboard, points, referrals.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    AwardPointsRequest, AwardPointsResponse, ClaimReferralRequest, ClaimReferralResponse,
    LeaderboardParams, ReferralCodeResponse, ViewerProfileResponse,
};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, FanstageError};
use crate::session::{AdminSession, AuthSession};

/// `GET /viewers/:id` — Viewer profile with derived rank.
///
/// # Errors
///
/// Returns [`FanstageError::NotFound`] for an unknown viewer.
#[utoipa::path(
    get,
    path = "/api/v1/viewers/{id}",
    tag = "Engagement",
    summary = "Viewer profile",
    description = "Returns the viewer's points, level, badges, and 1-based leaderboard rank. Rank is derived on read and always reflects the latest totals.",
    params(
        ("id" = String, Path, description = "Viewer user id"),
    ),
    responses(
        (status = 200, description = "Viewer profile", body = serde_json::Value),
        (status = 404, description = "Unknown viewer", body = ErrorResponse),
    )
)]
pub async fn get_viewer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, FanstageError> {
    let (viewer, rank) = state.engagement.profile(&id).await?;
    Ok(Json(ViewerProfileResponse { viewer, rank }))
}

/// `GET /leaderboard` — Top viewers by points.
#[utoipa::path(
    get,
    path = "/api/v1/leaderboard",
    tag = "Engagement",
    summary = "Leaderboard",
    description = "Returns the top viewers by point total, descending.",
    params(
        ("limit" = Option<usize>, Query, description = "Entries to return (max 100)"),
    ),
    responses(
        (status = 200, description = "Leaderboard entries", body = serde_json::Value),
    )
)]
pub async fn leaderboard(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardParams>,
) -> impl IntoResponse {
    let limit = params.limit.clamp(1, 100);
    Json(state.engagement.leaderboard(limit).await)
}

/// `POST /viewers/:id/points` — Apply a point delta (admin).
///
/// # Errors
///
/// Returns [`FanstageError::NotFound`] for an unknown viewer or
/// [`FanstageError::InsufficientBalance`] for a debit past zero.
pub async fn award_points(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Path(id): Path<String>,
    Json(req): Json<AwardPointsRequest>,
) -> Result<impl IntoResponse, FanstageError> {
    let total = state
        .engagement
        .award_points(&id, req.delta, &req.reason)
        .await?;
    Ok(Json(AwardPointsResponse {
        user_id: id,
        delta: req.delta,
        total,
    }))
}

/// `POST /referrals` — Create (or fetch) the caller's referral code.
///
/// # Errors
///
/// Returns [`FanstageError::NotFound`] if the caller has no viewer
/// profile.
#[utoipa::path(
    post,
    path = "/api/v1/referrals",
    tag = "Engagement",
    summary = "Create a referral code",
    description = "Returns the caller's shareable referral code, creating one on first call. Repeated calls return the same active code.",
    responses(
        (status = 201, description = "Referral code", body = ReferralCodeResponse),
        (status = 401, description = "No live session", body = ErrorResponse),
    )
)]
pub async fn create_referral(
    State(state): State<AppState>,
    AuthSession(info): AuthSession,
) -> Result<impl IntoResponse, FanstageError> {
    let code = state.engagement.create_referral_code(&info.user_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ReferralCodeResponse {
            code,
            referrer_id: info.user_id,
        }),
    ))
}

/// `POST /referrals/claim` — Claim a referral code for the caller.
///
/// # Errors
///
/// See [`crate::service::EngagementService::claim_referral`].
#[utoipa::path(
    post,
    path = "/api/v1/referrals/claim",
    tag = "Engagement",
    summary = "Claim a referral code",
    description = "Credits both the caller and the code owner. A user can be claimed by at most one code, ever; self-referral is rejected.",
    request_body = ClaimReferralRequest,
    responses(
        (status = 200, description = "Claim outcome", body = ClaimReferralResponse),
        (status = 404, description = "Unknown code", body = ErrorResponse),
        (status = 409, description = "Already referred or code inactive", body = ErrorResponse),
    )
)]
pub async fn claim_referral(
    State(state): State<AppState>,
    AuthSession(info): AuthSession,
    Json(req): Json<ClaimReferralRequest>,
) -> Result<impl IntoResponse, FanstageError> {
    let outcome = state
        .engagement
        .claim_referral(&req.code, &info.user_id)
        .await?;
    Ok(Json(ClaimReferralResponse {
        code: outcome.code,
        referrer_id: outcome.referrer_id,
        referred_total: outcome.referred_total,
        uses: outcome.uses,
        milestone_badge: outcome.milestone.map(|m| m.badge),
    }))
}

/// Engagement routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/viewers/{id}", get(get_viewer))
        .route("/viewers/{id}/points", post(award_points))
        .route("/leaderboard", get(leaderboard))
        .route("/referrals", post(create_referral))
        .route("/referrals/claim", post(claim_referral))
}
