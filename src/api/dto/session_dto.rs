//! DTOs for the auth/session endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::session::Role;

/// Login request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Display name; also used to derive the stable user id.
    pub username: String,
    /// Presenting the configured admin key elevates the session to the
    /// admin role.
    #[serde(default)]
    pub admin_key: Option<String>,
}

/// Successful login response. The token is also set as an `HttpOnly`
/// session cookie.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Signed session token for `Authorization: Bearer` use.
    pub token: String,
    /// Stable user identifier.
    pub user_id: String,
    /// Display name.
    pub username: String,
    /// Granted role.
    #[schema(value_type = String)]
    pub role: Role,
    /// Token expiry.
    pub expires_at: DateTime<Utc>,
}

/// Current-session response for `GET /auth/me`.
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    /// Stable user identifier.
    pub user_id: String,
    /// Display name.
    pub username: String,
    /// Session role.
    #[schema(value_type = String)]
    pub role: Role,
    /// Session identifier.
    pub session_id: String,
}
