//! Voting item handlers: create, list, get, vote, resolve, delete.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    CastVoteRequest, CreateItemRequest, ItemListParams, ItemListResponse, PaginationParams,
    ResolveItemRequest,
};
use crate::app_state::AppState;
use crate::domain::ItemId;
use crate::error::{ErrorResponse, FanstageError};
use crate::session::{AdminSession, AuthSession};

/// `POST /items` — Open a new poll, prediction, or wager (admin).
///
/// # Errors
///
/// Returns [`FanstageError::InvalidRequest`] for a malformed option set.
#[utoipa::path(
    post,
    path = "/api/v1/items",
    tag = "Items",
    summary = "Create a voting item",
    description = "Opens a new poll, prediction, or wager with the given options. Admin only.",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created", body = serde_json::Value),
        (status = 400, description = "Malformed option set", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
    )
)]
pub async fn create_item(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Json(req): Json<CreateItemRequest>,
) -> Result<impl IntoResponse, FanstageError> {
    let view = state
        .voting
        .create_item(req.kind, req.title, req.options)
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// `GET /items` — List items with kind/active filters and pagination.
#[utoipa::path(
    get,
    path = "/api/v1/items",
    tag = "Items",
    summary = "List voting items",
    description = "Returns a paginated list of items, newest first, optionally filtered by kind and restricted to active ones.",
    params(
        ("kind" = Option<String>, Query, description = "Filter: poll, prediction, or wager"),
        ("active" = Option<bool>, Query, description = "Only items still accepting votes"),
        ("page" = Option<u32>, Query, description = "Page number (1-indexed)"),
        ("per_page" = Option<u32>, Query, description = "Items per page (max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated item list", body = serde_json::Value),
    )
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(filter): Query<ItemListParams>,
    Query(pagination): Query<PaginationParams>,
) -> impl IntoResponse {
    let pagination = pagination.clamped();
    let views = state.voting.list_items(filter.kind, filter.active).await;

    #[allow(clippy::cast_possible_truncation)]
    let total = views.len() as u32;
    let data = views
        .into_iter()
        .skip(pagination.offset())
        .take(pagination.per_page as usize)
        .collect();

    Json(ItemListResponse {
        data,
        pagination: pagination.meta(total),
    })
}

/// `GET /items/:id` — Public aggregate view of one item.
///
/// # Errors
///
/// Returns [`FanstageError::NotFound`] for an unknown item.
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, FanstageError> {
    let view = state.voting.get_item(ItemId::from_uuid(id)).await?;
    Ok(Json(view))
}

/// `POST /items/:id/votes` — Cast a vote.
///
/// The response echoes the updated aggregate view; individual choices
/// are never exposed.
///
/// # Errors
///
/// See [`crate::service::VotingService::cast_vote`].
#[utoipa::path(
    post,
    path = "/api/v1/items/{id}/votes",
    tag = "Items",
    summary = "Cast a vote",
    description = "Registers the caller's vote on an active item. Wager votes carry a point stake that is debited up front. At most one vote per user per item.",
    request_body = CastVoteRequest,
    params(
        ("id" = uuid::Uuid, Path, description = "Item UUID"),
    ),
    responses(
        (status = 200, description = "Updated aggregate view", body = serde_json::Value),
        (status = 404, description = "Item not found", body = ErrorResponse),
        (status = 409, description = "Duplicate vote or item no longer active", body = ErrorResponse),
        (status = 422, description = "Stake exceeds balance", body = ErrorResponse),
    )
)]
pub async fn cast_vote(
    State(state): State<AppState>,
    AuthSession(info): AuthSession,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<CastVoteRequest>,
) -> Result<impl IntoResponse, FanstageError> {
    let view = state
        .voting
        .cast_vote(ItemId::from_uuid(id), &info.user_id, &req.choice, req.stake)
        .await?;
    Ok(Json(view))
}

/// `POST /items/:id/resolve` — Declare the result of an item (admin).
///
/// # Errors
///
/// See [`crate::service::VotingService::resolve_item`].
#[utoipa::path(
    post,
    path = "/api/v1/items/{id}/resolve",
    tag = "Items",
    summary = "Resolve an item",
    description = "Ends voting with a declared result, broadcasts the full breakdown, and pays out wager winners. Admin only.",
    request_body = ResolveItemRequest,
    params(
        ("id" = uuid::Uuid, Path, description = "Item UUID"),
    ),
    responses(
        (status = 200, description = "Resolution summary", body = serde_json::Value),
        (status = 404, description = "Item not found", body = ErrorResponse),
        (status = 409, description = "Item already ended", body = ErrorResponse),
    )
)]
pub async fn resolve_item(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<ResolveItemRequest>,
) -> Result<impl IntoResponse, FanstageError> {
    let summary = state
        .voting
        .resolve_item(ItemId::from_uuid(id), &req.result)
        .await?;
    Ok(Json(summary))
}

/// `DELETE /items/:id` — Remove an item without resolution (admin).
///
/// Stakes on a still-active wager are refunded.
///
/// # Errors
///
/// Returns [`FanstageError::NotFound`] for an unknown item.
pub async fn delete_item(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, FanstageError> {
    state.voting.delete_item(ItemId::from_uuid(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Voting item routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/items", post(create_item).get(list_items))
        .route("/items/{id}", get(get_item).delete(delete_item))
        .route("/items/{id}/votes", post(cast_vote))
        .route("/items/{id}/resolve", post(resolve_item))
}
