//! DTOs for the voting item endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::dto::PaginationMeta;
use crate::domain::vote_item::{ItemKind, ItemView};

/// Request body for `POST /items`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateItemRequest {
    /// Item flavor: `poll`, `prediction`, or `wager`.
    #[schema(value_type = String)]
    pub kind: ItemKind,
    /// Question or title shown to viewers.
    pub title: String,
    /// Option labels; at least two, unique, non-empty.
    pub options: Vec<String>,
}

/// Request body for `POST /items/{id}/votes`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CastVoteRequest {
    /// Option label being voted for.
    pub choice: String,
    /// Point stake; required for wagers, rejected elsewhere.
    #[serde(default)]
    pub stake: Option<i64>,
}

/// Request body for `POST /items/{id}/resolve`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveItemRequest {
    /// Label of the winning option.
    pub result: String,
}

/// Filter query parameters for `GET /items`.
#[derive(Debug, Deserialize)]
pub struct ItemListParams {
    /// Restrict the list to one item flavor.
    #[serde(default)]
    pub kind: Option<ItemKind>,
    /// When `true`, only items still accepting votes are returned.
    #[serde(default)]
    pub active: bool,
}

/// Paginated item list response.
#[derive(Debug, Serialize)]
pub struct ItemListResponse {
    /// Public aggregate views, newest first.
    pub data: Vec<ItemView>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
