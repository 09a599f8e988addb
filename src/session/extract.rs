//! Axum extractors gating handlers on a verified session.
//!
//! [`AuthSession`] accepts any live session; [`AdminSession`] also
//! requires the admin role. Both consult the live session store, so a
//! server-side logout takes effect on the very next request even if the
//! client still holds a cryptographically valid token.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::store::{SESSION_COOKIE, SessionInfo};
use crate::app_state::AppState;
use crate::error::FanstageError;
use crate::session::Role;

/// Extractor for any authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthSession(pub SessionInfo);

/// Extractor for admin-only endpoints.
#[derive(Debug, Clone)]
pub struct AdminSession(pub SessionInfo);

/// Pulls the session token from `Authorization: Bearer` or the session
/// cookie, in that order.
fn extract_token(parts: &Parts) -> Option<String> {
    if let Some(header) = parts.headers.get("Authorization")
        && let Ok(value) = header.to_str()
        && let Some(token) = value.strip_prefix("Bearer ")
    {
        return Some(token.to_string());
    }

    let cookies = parts.headers.get("Cookie")?.to_str().ok()?;
    for pair in cookies.split(';') {
        if let Some(token) = pair.trim().strip_prefix(SESSION_COOKIE)
            && let Some(token) = token.strip_prefix('=')
        {
            return Some(token.to_string());
        }
    }
    None
}

impl FromRequestParts<AppState> for AuthSession {
    type Rejection = FanstageError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts).ok_or(FanstageError::Unauthorized)?;
        let info = state
            .sessions
            .verify_session(&token)
            .await
            .ok_or(FanstageError::Unauthorized)?;
        Ok(Self(info))
    }
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = FanstageError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthSession(info) = AuthSession::from_request_parts(parts, state).await?;
        if info.role != Role::Admin {
            return Err(FanstageError::Forbidden);
        }
        Ok(Self(info))
    }
}
